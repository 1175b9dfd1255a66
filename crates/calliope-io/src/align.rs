//! Identifier alignment of a prediction table with a gold-standard table.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::coded::{CodedRecord, CodedTable};
use crate::domain::{MessageId, Provenance};

/// Prediction and gold vectors for one code over the mutually verified subset.
///
/// `ids[i]`, `predicted[i]` and `gold[i]` describe the same message; rows
/// are sorted by identifier.
#[derive(Debug, Clone)]
pub struct AlignedCode {
    ids: Vec<MessageId>,
    predicted: Vec<bool>,
    gold: Vec<bool>,
}

impl AlignedCode {
    /// Return the verified identifiers in sorted order.
    #[must_use]
    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }

    /// Return the predicted values.
    #[must_use]
    pub fn predicted(&self) -> &[bool] {
        &self.predicted
    }

    /// Return the gold values.
    #[must_use]
    pub fn gold(&self) -> &[bool] {
        &self.gold
    }

    /// Return the size of the mutually verified subset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the verified subset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Keep the first record for each identifier, preserving file order.
pub(crate) fn dedup_first(records: &[CodedRecord]) -> Vec<&CodedRecord> {
    let mut seen: HashSet<&MessageId> = HashSet::new();
    records.iter().filter(|r| seen.insert(&r.id)).collect()
}

/// Fail on any identifier that occurs twice in an id-sorted slice.
fn ensure_unique(sorted: &[&CodedRecord]) -> Result<(), IoError> {
    match sorted.windows(2).find(|w| w[0].id == w[1].id) {
        Some(w) => Err(IoError::DuplicateAfterDedup {
            id: w[0].id.as_str().to_string(),
        }),
        None => Ok(()),
    }
}

/// Align one code between a prediction table and a gold table.
///
/// 1. Missing values were read as `false`.
/// 2. Both tables are deduplicated by identifier, keeping the first row.
/// 3. Predictions are restricted to identifiers present in gold with
///    provenance `prediction`.
/// 4. Gold is restricted to identifiers that survived step 3.
/// 5. Both sides are sorted by identifier.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::MissingColumn`] | A code column was not read from its table |
/// | [`IoError::NoVerifiedRecords`] | The mutually verified subset is empty |
/// | [`IoError::DuplicateAfterDedup`] | An identifier repeats after deduplication |
#[instrument(skip_all, fields(code = prediction_code, n_predictions = predictions.len(), n_gold = gold.len()))]
pub fn align(
    predictions: &CodedTable,
    prediction_code: &str,
    gold: &CodedTable,
    gold_code: &str,
) -> Result<AlignedCode, IoError> {
    let pred_col = predictions.code_index(prediction_code)?;
    let gold_col = gold.code_index(gold_code)?;

    let gold_rows = dedup_first(gold.records());
    let pred_rows = dedup_first(predictions.records());
    debug!(
        n_gold_unique = gold_rows.len(),
        n_predictions_unique = pred_rows.len(),
        "deduplicated by identifier"
    );

    let gold_ids: HashSet<&MessageId> = gold_rows.iter().map(|r| &r.id).collect();
    let mut pred_kept: Vec<&CodedRecord> = pred_rows
        .into_iter()
        .filter(|r| r.provenance == Some(Provenance::Prediction) && gold_ids.contains(&r.id))
        .collect();

    let pred_ids: HashSet<&MessageId> = pred_kept.iter().map(|r| &r.id).collect();
    let mut gold_kept: Vec<&CodedRecord> = gold_rows
        .into_iter()
        .filter(|r| pred_ids.contains(&r.id))
        .collect();

    if pred_kept.is_empty() {
        return Err(IoError::NoVerifiedRecords {
            code: prediction_code.to_string(),
        });
    }

    pred_kept.sort_by(|a, b| a.id.cmp(&b.id));
    gold_kept.sort_by(|a, b| a.id.cmp(&b.id));
    ensure_unique(&pred_kept)?;
    ensure_unique(&gold_kept)?;
    if let Some((p, _)) = pred_kept
        .iter()
        .zip(&gold_kept)
        .find(|(p, g)| p.id != g.id)
    {
        return Err(IoError::DuplicateAfterDedup {
            id: p.id.as_str().to_string(),
        });
    }

    let aligned = AlignedCode {
        ids: pred_kept.iter().map(|r| r.id.clone()).collect(),
        predicted: pred_kept.iter().map(|r| r.codes[pred_col]).collect(),
        gold: gold_kept.iter().map(|r| r.codes[gold_col]).collect(),
    };

    info!(n_verified = aligned.len(), "alignment complete");
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::read_pair;

    #[test]
    fn duplicate_gold_keeps_first_and_drops_training() {
        let (p, g) = read_pair(
            "ID,code,source\n2,0,prediction\n3,1,prediction\n4,1,training\n",
            "ID,code\n1,1\n2,0\n2,0\n3,1\n",
        );
        let aligned = align(&p, "code", &g, "code").unwrap();
        let ids: Vec<&str> = aligned.ids().iter().map(MessageId::as_str).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(aligned.gold(), &[false, true]);
        assert_eq!(aligned.predicted(), &[false, true]);
    }

    #[test]
    fn sorts_both_sides_by_identifier() {
        let (p, g) = read_pair(
            "ID,code,source\nc,1,prediction\na,0,prediction\nb,1,prediction\n",
            "ID,code\nb,0\nc,1\na,1\n",
        );
        let aligned = align(&p, "code", &g, "code").unwrap();
        let ids: Vec<&str> = aligned.ids().iter().map(MessageId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(aligned.predicted(), &[false, true, true]);
        assert_eq!(aligned.gold(), &[true, false, true]);
    }

    #[test]
    fn dedup_happens_before_provenance_filter() {
        // First occurrence of 1 is a training row, so 1 is not scored.
        let (p, g) = read_pair(
            "ID,code,source\n1,1,training\n1,1,prediction\n2,1,prediction\n",
            "ID,code\n1,1\n2,1\n",
        );
        let aligned = align(&p, "code", &g, "code").unwrap();
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.ids()[0].as_str(), "2");
    }

    #[test]
    fn empty_provenance_is_not_scored() {
        let (p, g) = read_pair("ID,code,source\n1,1,\n", "ID,code\n1,1\n");
        let err = align(&p, "code", &g, "code").unwrap_err();
        assert!(matches!(err, IoError::NoVerifiedRecords { .. }));
    }

    #[test]
    fn disjoint_tables_have_no_verified_records() {
        let (p, g) = read_pair("ID,code,source\n1,1,prediction\n", "ID,code\n2,1\n");
        let err = align(&p, "code", &g, "code").unwrap_err();
        assert!(matches!(err, IoError::NoVerifiedRecords { ref code } if code == "code"));
    }

    #[test]
    fn unknown_code_is_missing_column() {
        let (p, g) = read_pair("ID,code,source\n1,1,prediction\n", "ID,code\n1,1\n");
        let err = align(&p, "other", &g, "code").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }

    #[test]
    fn dedup_first_keeps_file_order() {
        let (p, _) = read_pair(
            "ID,code,source\nb,1,prediction\na,0,prediction\nb,0,prediction\n",
            "ID,code\na,1\n",
        );
        let kept = dedup_first(p.records());
        let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(kept[0].codes[0]);
    }
}
