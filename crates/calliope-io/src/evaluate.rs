//! Per-code evaluation of predictions against human-verified labels.

use tracing::{info, instrument};

use crate::IoError;
use crate::align::align;
use crate::coded::CodedTable;
use crate::metrics::BinaryConfusion;

/// Metrics for one code over its mutually verified subset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CodeEvaluation {
    /// Code name.
    pub code: String,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Size of the mutually verified subset.
    pub verified_count: usize,
    /// Gold positives within the verified subset.
    pub gold_positive: usize,
    /// Verified messages where prediction equals gold.
    pub matches: usize,
    /// Confusion counts.
    pub confusion: BinaryConfusion,
}

/// Align and score one code present under the same name in both tables.
///
/// # Errors
///
/// Same as [`align`].
pub fn align_and_evaluate(
    predictions: &CodedTable,
    gold: &CodedTable,
    code: &str,
) -> Result<CodeEvaluation, IoError> {
    align_and_evaluate_named(predictions, code, gold, code)
}

/// Align and score a code whose column name differs between the tables.
///
/// # Errors
///
/// Same as [`align`].
#[instrument(skip(predictions, gold))]
pub fn align_and_evaluate_named(
    predictions: &CodedTable,
    prediction_code: &str,
    gold: &CodedTable,
    gold_code: &str,
) -> Result<CodeEvaluation, IoError> {
    let aligned = align(predictions, prediction_code, gold, gold_code)?;
    let confusion = BinaryConfusion::from_pairs(aligned.predicted(), aligned.gold());

    let evaluation = CodeEvaluation {
        code: gold_code.to_string(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        verified_count: aligned.len(),
        gold_positive: confusion.support(),
        matches: confusion.matches(),
        confusion,
    };

    info!(
        code = gold_code,
        precision = evaluation.precision,
        recall = evaluation.recall,
        f1 = evaluation.f1,
        verified = evaluation.verified_count,
        gold_positive = evaluation.gold_positive,
        matches = evaluation.matches,
        "code evaluated"
    );
    Ok(evaluation)
}

/// Evaluate each code in order, stopping at the first failure.
///
/// # Errors
///
/// Same as [`align`].
pub fn evaluate_codes(
    predictions: &CodedTable,
    gold: &CodedTable,
    codes: &[String],
) -> Result<Vec<CodeEvaluation>, IoError> {
    codes
        .iter()
        .map(|code| align_and_evaluate(predictions, gold, code))
        .collect()
}

/// Columns present in both headers, in `left` order, minus `exclude`.
#[must_use]
pub fn shared_columns(left: &[String], right: &[String], exclude: &[&str]) -> Vec<String> {
    left.iter()
        .filter(|h| right.contains(*h) && !exclude.contains(&h.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::read_pair;

    const GOLD: &str = "ID,code\n1,1\n2,0\n2,0\n3,1\n";
    const PRED: &str = "ID,code,source\n2,0,prediction\n3,1,prediction\n4,1,training\n";

    #[test]
    fn duplicate_gold_scenario() {
        let (p, g) = read_pair(PRED, GOLD);
        let eval = align_and_evaluate(&p, &g, "code").unwrap();
        assert!((eval.precision - 1.0).abs() < f64::EPSILON);
        assert!((eval.recall - 1.0).abs() < f64::EPSILON);
        assert!((eval.f1 - 1.0).abs() < f64::EPSILON);
        assert_eq!(eval.verified_count, 2);
        assert_eq!(eval.gold_positive, 1);
        assert_eq!(eval.matches, 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let (p, g) = read_pair(PRED, GOLD);
        let first = align_and_evaluate(&p, &g, "code").unwrap();
        let second = align_and_evaluate(&p, &g, "code").unwrap();
        assert_eq!(first.confusion, second.confusion);
        assert_eq!(first.verified_count, second.verified_count);
        assert!((first.f1 - second.f1).abs() < f64::EPSILON);
    }

    #[test]
    fn extra_predictions_absent_from_gold_do_not_change_metrics() {
        let (p, g) = read_pair(PRED, GOLD);
        let base = align_and_evaluate(&p, &g, "code").unwrap();

        let extended = format!("{PRED}9,1,prediction\n10,0,prediction\n11,1,prediction\n");
        let (p2, g2) = read_pair(&extended, GOLD);
        let more = align_and_evaluate(&p2, &g2, "code").unwrap();
        assert_eq!(base.confusion, more.confusion);
        assert!((base.precision - more.precision).abs() < f64::EPSILON);
        assert!((base.recall - more.recall).abs() < f64::EPSILON);
        assert!((base.f1 - more.f1).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_gold_values_count_as_negative() {
        let (p, g) = read_pair(
            "ID,code,source\n1,1,prediction\n2,,prediction\n",
            "ID,code\n1,\n2,\n",
        );
        let eval = align_and_evaluate(&p, &g, "code").unwrap();
        assert_eq!(eval.confusion.false_positive, 1);
        assert_eq!(eval.confusion.true_negative, 1);
        assert_eq!(eval.precision, 0.0);
        assert_eq!(eval.recall, 0.0);
        assert_eq!(eval.gold_positive, 0);
    }

    #[test]
    fn empty_subset_fails_loudly() {
        let (p, g) = read_pair("ID,code,source\n4,1,training\n", GOLD);
        let err = align_and_evaluate(&p, &g, "code").unwrap_err();
        assert!(matches!(err, IoError::NoVerifiedRecords { .. }));
    }

    #[test]
    fn shared_columns_in_left_order() {
        let left: Vec<String> = ["ID", "b", "a", "source"].map(String::from).to_vec();
        let right: Vec<String> = ["a", "ID", "b", "text"].map(String::from).to_vec();
        assert_eq!(shared_columns(&left, &right, &["ID", "source"]), vec!["b", "a"]);
    }
}
