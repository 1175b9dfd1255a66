//! Per-code classifier slots: a trained model or an explicit absence.

use crate::error::ModelError;
use crate::logistic::LogisticModel;

/// The classifier for one code.
///
/// `Absent` records that the code had no positive training examples. It is
/// a normal state, not an error: it predicts `false` with probability zero
/// for every message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ClassifierSlot {
    /// A fitted binary classifier.
    Trained(LogisticModel),
    /// No classifier: the code was never observed in training.
    Absent,
}

impl ClassifierSlot {
    /// Whether this slot holds a fitted model.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Trained(_))
    }

    /// Borrow the fitted model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&LogisticModel> {
        match self {
            Self::Trained(model) => Some(model),
            Self::Absent => None,
        }
    }

    /// Binary decision for each row. `Absent` yields all `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] if a row has the wrong width.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<bool>, ModelError> {
        match self {
            Self::Trained(model) => rows.iter().map(|row| model.predict(row)).collect(),
            Self::Absent => Ok(vec![false; rows.len()]),
        }
    }

    /// Positive-class probability for each row. `Absent` yields all zeros.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] if a row has the wrong width.
    pub fn predict_probability(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::Trained(model) => rows
                .iter()
                .map(|row| model.predict_probability(row))
                .collect(),
            Self::Absent => Ok(vec![0.0; rows.len()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_slot_predicts_false_and_zero() {
        let rows = vec![vec![1.0, 2.0]; 5];
        let slot = ClassifierSlot::Absent;
        assert_eq!(slot.predict(&rows).unwrap(), vec![false; 5]);
        assert_eq!(slot.predict_probability(&rows).unwrap(), vec![0.0; 5]);
        assert!(!slot.is_trained());
        assert!(slot.model().is_none());
    }

    #[test]
    fn trained_slot_delegates_to_model() {
        let slot = ClassifierSlot::Trained(LogisticModel::from_parts(vec![2.0], -1.0));
        let rows = vec![vec![0.0], vec![1.0]];
        assert_eq!(slot.predict(&rows).unwrap(), vec![false, true]);
        let probs = slot.predict_probability(&rows).unwrap();
        assert!(probs[0] < 0.5 && probs[1] > 0.5);
    }

    #[test]
    fn trained_slot_checks_width() {
        let slot = ClassifierSlot::Trained(LogisticModel::from_parts(vec![2.0], -1.0));
        assert!(slot.predict(&[vec![1.0, 1.0]]).is_err());
    }
}
