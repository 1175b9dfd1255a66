//! Active-learning selection: uncertainty ranking and random verification samples.

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::ModelError;
use crate::predict::predict_probability;
use crate::slot::ClassifierSlot;

/// How per-code distances from 0.5 collapse into one figure per message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UncertaintyReduction {
    /// Smallest distance over codes: a message uncertain on any code ranks high.
    #[default]
    Min,
    /// Mean distance over codes.
    Mean,
}

impl FromStr for UncertaintyReduction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "mean" => Ok(Self::Mean),
            _ => Err(ModelError::UnknownReduction {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UncertaintyReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min => write!(f, "min"),
            Self::Mean => write!(f, "mean"),
        }
    }
}

impl UncertaintyReduction {
    fn reduce(self, probabilities: &[f64]) -> f64 {
        if probabilities.is_empty() {
            return 0.5;
        }
        let distances = probabilities.iter().map(|p| (p - 0.5).abs());
        match self {
            Self::Min => distances.fold(f64::INFINITY, f64::min),
            Self::Mean => distances.sum::<f64>() / probabilities.len() as f64,
        }
    }
}

/// Configuration for uncertainty-based selection.
///
/// | Setting     | Default |
/// |-------------|---------|
/// | `reduction` | `Min`   |
#[derive(Debug, Clone, Default)]
pub struct SelectionConfig {
    reduction: UncertaintyReduction,
}

impl SelectionConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how per-code distances are reduced.
    #[must_use]
    pub fn with_reduction(mut self, reduction: UncertaintyReduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// Return the reduction in use.
    #[must_use]
    pub fn reduction(&self) -> UncertaintyReduction {
        self.reduction
    }

    /// Score each row by its distance from the decision boundary; lower is more uncertain.
    ///
    /// Absent slots contribute probability zero, so a distance of 0.5.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when a row has the wrong width.
    #[instrument(skip_all, fields(n_rows = rows.len(), reduction = %self.reduction))]
    pub fn score(
        &self,
        slots: &[ClassifierSlot],
        rows: &[Vec<f64>],
    ) -> Result<Vec<f64>, ModelError> {
        let probabilities = predict_probability(slots, rows)?;
        Ok(probabilities
            .iter()
            .map(|row| self.reduction.reduce(row))
            .collect())
    }

    /// Indices of the `n` most uncertain rows, most uncertain first.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionConfig::score`].
    pub fn select(
        &self,
        slots: &[ClassifierSlot],
        rows: &[Vec<f64>],
        n: usize,
    ) -> Result<Vec<usize>, ModelError> {
        let scores = self.score(slots, rows)?;
        Ok(top_n(&scores, n))
    }
}

/// Minimum-distance uncertainty score per row.
///
/// # Errors
///
/// Returns [`ModelError::PredictionFeatureMismatch`] when a row has the wrong width.
pub fn score_by_uncertainty(
    rows: &[Vec<f64>],
    slots: &[ClassifierSlot],
) -> Result<Vec<f64>, ModelError> {
    SelectionConfig::new().score(slots, rows)
}

/// Indices ordered by ascending score, truncated to `n`.
///
/// Ties keep their original order. `n` larger than the input returns every index.
#[must_use]
pub fn top_n(scores: &[f64], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order.truncate(n);
    debug!(n_scores = scores.len(), n_selected = order.len(), "top rows selected");
    order
}

/// A reproducible random sample of `n` distinct row indices out of `n_rows`.
///
/// `n` larger than `n_rows` returns a permutation of all rows.
#[must_use]
pub fn random_sample(n_rows: usize, n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n_rows).collect();
    order.shuffle(&mut rng);
    order.truncate(n);
    order
}
