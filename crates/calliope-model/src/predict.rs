//! Multi-label prediction over a list of classifier slots.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::error::ModelError;
use crate::slot::ClassifierSlot;
use crate::trainer::ClassifierSet;

/// Turn per-slot columns into per-message rows.
fn transpose<T: Copy>(columns: &[Vec<T>], n_rows: usize) -> Vec<Vec<T>> {
    (0..n_rows)
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect()
}

/// Predict every code for every row.
///
/// Row `i` of the result corresponds to `rows[i]`; column `k` to `slots[k]`.
/// Absent slots yield an all-`false` column without touching any model.
///
/// # Errors
///
/// Returns [`ModelError::PredictionFeatureMismatch`] when a row does not
/// match the width a trained slot expects.
#[instrument(skip_all, fields(n_rows = rows.len(), n_slots = slots.len()))]
pub fn predict(slots: &[ClassifierSlot], rows: &[Vec<f64>]) -> Result<Vec<Vec<bool>>, ModelError> {
    let columns = slots
        .par_iter()
        .map(|slot| slot.predict(rows))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("prediction columns assembled");
    Ok(transpose(&columns, rows.len()))
}

/// Positive-class probability of every code for every row.
///
/// Absent slots yield an all-zero column.
///
/// # Errors
///
/// Returns [`ModelError::PredictionFeatureMismatch`] when a row does not
/// match the width a trained slot expects.
#[instrument(skip_all, fields(n_rows = rows.len(), n_slots = slots.len()))]
pub fn predict_probability(
    slots: &[ClassifierSlot],
    rows: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, ModelError> {
    let columns = slots
        .par_iter()
        .map(|slot| slot.predict_probability(rows))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("probability columns assembled");
    Ok(transpose(&columns, rows.len()))
}

impl ClassifierSet {
    fn check_width(&self, rows: &[Vec<f64>]) -> Result<(), ModelError> {
        match rows.iter().find(|row| row.len() != self.n_features) {
            Some(row) => Err(ModelError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            }),
            None => Ok(()),
        }
    }

    /// Predict every code for every row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when any row is not
    /// `n_features` wide, even if every slot is absent.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<bool>>, ModelError> {
        self.check_width(rows)?;
        predict(&self.slots, rows)
    }

    /// Positive-class probability of every code for every row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when any row is not
    /// `n_features` wide.
    pub fn predict_probability(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        self.check_width(rows)?;
        predict_probability(&self.slots, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logistic::LogisticModel;

    fn slots() -> Vec<ClassifierSlot> {
        vec![
            ClassifierSlot::Trained(LogisticModel::from_parts(vec![4.0, 0.0], -2.0)),
            ClassifierSlot::Absent,
            ClassifierSlot::Trained(LogisticModel::from_parts(vec![0.0, -3.0], 1.0)),
        ]
    }

    fn rows() -> Vec<Vec<f64>> {
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![0.0, 0.0]]
    }

    #[test]
    fn shape_is_messages_by_codes() {
        let out = predict(&slots(), &rows()).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.len() == 3));
        assert_eq!(out[0], vec![true, false, true]);
        assert_eq!(out[1], vec![false, false, false]);
        assert_eq!(out[2], vec![true, false, false]);
        assert_eq!(out[3], vec![false, false, true]);
    }

    #[test]
    fn absent_column_is_zero_probability() {
        let out = predict_probability(&slots(), &rows()).unwrap();
        assert!(out.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn thresholded_probability_matches_predict() {
        let mut grid = Vec::new();
        for i in 0..=20 {
            for j in 0..=20 {
                grid.push(vec![f64::from(i) / 10.0, f64::from(j) / 10.0]);
            }
        }
        // Exactly on the boundary: 4 * 0.5 - 2 = 0.
        grid.push(vec![0.5, 0.0]);
        let hard = predict(&slots(), &grid).unwrap();
        let soft = predict_probability(&slots(), &grid).unwrap();
        for (h, s) in hard.iter().zip(&soft) {
            let thresholded: Vec<bool> = s.iter().map(|&p| p > 0.5).collect();
            assert_eq!(h, &thresholded);
        }
    }

    #[test]
    fn empty_rows_give_empty_matrix() {
        let out = predict(&slots(), &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn set_rejects_wrong_width_even_when_all_absent() {
        let set = ClassifierSet::new(
            vec![ClassifierSlot::Absent],
            vec!["x".to_string()],
            3,
        )
        .unwrap();
        let err = set.predict(&[vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::PredictionFeatureMismatch {
                expected: 3,
                got: 1
            }
        ));
    }

    #[test]
    fn trained_slot_reports_mismatch() {
        let err = predict(&slots(), &[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, ModelError::PredictionFeatureMismatch { .. }));
    }
}
