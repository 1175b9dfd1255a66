//! Prediction tables: machine-coded messages plus folded-in training rows.

use std::collections::{HashMap, HashSet};

use calliope_features::TrainingBundle;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{MessageId, Provenance};
use crate::messages::MessageTable;

/// One output row: the original message fields plus one value per code.
#[derive(Debug, Clone)]
pub struct PredictionRow {
    /// Message identifier.
    pub id: MessageId,
    /// Original message fields.
    pub fields: Vec<String>,
    /// One value per code.
    pub codes: Vec<bool>,
    /// Whether the codes come from a classifier or from a human.
    pub provenance: Provenance,
}

/// Predicted rows followed by training rows, each training identifier at most once.
#[derive(Debug, Clone)]
pub struct PredictionTable {
    headers: Vec<String>,
    code_names: Vec<String>,
    rows: Vec<PredictionRow>,
}

impl PredictionTable {
    /// Combine predictions for unseen messages with the human labels of training messages.
    ///
    /// `predicted` holds the messages that were classified and `predictions`
    /// their code rows, in the same order. `training_messages` holds the
    /// messages whose identifiers appear in `training`; their codes are
    /// taken from the bundle.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::CodeNamesMismatch`] | `code_names` differs from the bundle's code names |
    /// | [`IoError::PredictionRowMismatch`] | `predictions` and `predicted` differ in length |
    #[instrument(skip_all, fields(n_predicted = predicted.len(), n_training = training_messages.len()))]
    pub fn assemble(
        code_names: &[String],
        predicted: &MessageTable,
        predictions: &[Vec<bool>],
        training_messages: &MessageTable,
        training: &TrainingBundle,
    ) -> Result<Self, IoError> {
        if code_names != training.code_names() {
            return Err(IoError::CodeNamesMismatch {
                predicted: code_names.to_vec(),
                training: training.code_names().to_vec(),
            });
        }
        if predictions.len() != predicted.len() {
            return Err(IoError::PredictionRowMismatch {
                rows: predicted.len(),
                predictions: predictions.len(),
            });
        }

        let mut rows: Vec<PredictionRow> = predicted
            .ids()
            .iter()
            .zip(predicted.rows())
            .zip(predictions)
            .map(|((id, fields), codes)| PredictionRow {
                id: id.clone(),
                fields: fields.clone(),
                codes: codes.clone(),
                provenance: Provenance::Prediction,
            })
            .collect();

        let label_rows: HashMap<&str, usize> = training
            .message_ids()
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut seen: HashSet<&MessageId> = HashSet::new();
        for (id, fields) in training_messages.ids().iter().zip(training_messages.rows()) {
            if !seen.insert(id) {
                debug!(id = %id, "training message repeated, keeping first");
                continue;
            }
            let Some(&label_row) = label_rows.get(id.as_str()) else {
                debug!(id = %id, "message not in training bundle");
                continue;
            };
            rows.push(PredictionRow {
                id: id.clone(),
                fields: fields.clone(),
                codes: training.labels()[label_row].clone(),
                provenance: Provenance::Training,
            });
        }

        let table = Self {
            headers: predicted.headers().to_vec(),
            code_names: code_names.to_vec(),
            rows,
        };
        for (name, count) in table.code_names.iter().zip(table.code_counts()) {
            info!(code = %name, count, "code total");
        }
        Ok(table)
    }

    /// Return the message headers (without code or provenance columns).
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the code names in column order.
    #[must_use]
    pub fn code_names(&self) -> &[String] {
        &self.code_names
    }

    /// Return all rows: predictions first, then training rows.
    #[must_use]
    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    /// Positive count per code over the whole table.
    #[must_use]
    pub fn code_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.code_names.len()];
        for row in &self.rows {
            for (count, &value) in counts.iter_mut().zip(&row.codes) {
                *count += usize::from(value);
            }
        }
        counts
    }

    /// Number of rows with the given provenance.
    #[must_use]
    pub fn count_with(&self, provenance: Provenance) -> usize {
        self.rows.iter().filter(|r| r.provenance == provenance).count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use calliope_features::{FeatureIndex, TrainingBundle};

    use super::*;
    use crate::messages::MessageReader;
    use crate::table::test_support::write_csv;

    fn bundle() -> TrainingBundle {
        TrainingBundle::new(
            vec!["t1".into(), "t2".into()],
            FeatureIndex::from_names(["net"]),
            vec!["Net".into(), "Spray".into()],
            vec![vec![1.0], vec![0.0]],
            vec![vec![true, false], vec![false, true]],
        )
        .unwrap()
    }

    fn messages() -> (MessageTable, MessageTable) {
        let f = write_csv("id,bag\nm1,net\nt1,net\nm2,spray\nt2,spray\nt1,net\n");
        let table = MessageReader::new(f.path()).read().unwrap();
        let known: HashSet<&str> = ["t1", "t2"].into_iter().collect();
        table.partition_known(&known)
    }

    #[test]
    fn predictions_then_training_rows_once() {
        let (unknown, known) = messages();
        let codes = vec!["Net".to_string(), "Spray".to_string()];
        let predictions = vec![vec![true, false], vec![false, false]];
        let table =
            PredictionTable::assemble(&codes, &unknown, &predictions, &known, &bundle()).unwrap();

        let ids: Vec<&str> = table.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "t1", "t2"]);
        assert_eq!(table.count_with(Provenance::Prediction), 2);
        assert_eq!(table.count_with(Provenance::Training), 2);
        assert_eq!(table.rows()[2].codes, vec![true, false]);
        assert_eq!(table.code_counts(), vec![2, 1]);
        assert_eq!(table.headers(), &["id".to_string(), "bag".to_string()]);
    }

    #[test]
    fn code_name_mismatch() {
        let (unknown, known) = messages();
        let codes = vec!["Spray".to_string(), "Net".to_string()];
        let predictions = vec![vec![true, false], vec![false, false]];
        let err = PredictionTable::assemble(&codes, &unknown, &predictions, &known, &bundle())
            .unwrap_err();
        assert!(matches!(err, IoError::CodeNamesMismatch { .. }));
    }

    #[test]
    fn prediction_row_mismatch() {
        let (unknown, known) = messages();
        let codes = vec!["Net".to_string(), "Spray".to_string()];
        let err = PredictionTable::assemble(&codes, &unknown, &[], &known, &bundle()).unwrap_err();
        assert!(matches!(
            err,
            IoError::PredictionRowMismatch {
                rows: 2,
                predictions: 0
            }
        ));
    }
}
