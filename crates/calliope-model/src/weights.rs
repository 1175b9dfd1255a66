//! Class and sample weighting for a single code.

use crate::config::WeightMode;

/// Per-class example weights for one binary classifier.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassWeights {
    /// Weight applied to every positive example.
    pub positive: f64,
    /// Weight applied to every negative example.
    pub negative: f64,
}

impl ClassWeights {
    /// Equalize total positive and negative mass over the rows actually fit.
    ///
    /// Each class gets `n / (2 * n_class)`. Both classes must be present.
    #[must_use]
    pub fn balanced(labels: &[bool]) -> Self {
        let n = labels.len() as f64;
        let n_pos = labels.iter().filter(|&&y| y).count() as f64;
        let n_neg = n - n_pos;
        Self {
            positive: n / (2.0 * n_pos),
            negative: n / (2.0 * n_neg),
        }
    }

    /// Observed counts plus smoothing, discounting keyword mass on the positive side.
    ///
    /// `n_pos` and `n_neg` are counts over real messages, before augmentation.
    #[must_use]
    pub fn smoothed(
        n_pos: usize,
        n_neg: usize,
        n_keywords: usize,
        keyword_weight: f64,
        smoothing: f64,
    ) -> Self {
        let n_pos = n_pos as f64;
        let n_neg = n_neg as f64;
        Self {
            positive: (n_pos + smoothing) / (n_pos + n_keywords as f64 * keyword_weight),
            negative: (n_neg + smoothing) / n_neg,
        }
    }

    /// Weight for an example of the given class.
    #[must_use]
    pub fn weight_for(&self, label: bool) -> f64 {
        if label { self.positive } else { self.negative }
    }
}

/// Everything needed to weight the augmented rows of one code.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WeightPlan {
    pub(crate) mode: WeightMode,
    pub(crate) n_pos: usize,
    pub(crate) n_neg: usize,
    pub(crate) n_keywords: usize,
    pub(crate) keyword_weight: f64,
    pub(crate) smoothing: f64,
}

impl WeightPlan {
    /// Resolve class weights for the fitted label vector.
    pub(crate) fn class_weights(&self, fitted_labels: &[bool]) -> ClassWeights {
        match self.mode {
            WeightMode::Balanced => ClassWeights::balanced(fitted_labels),
            WeightMode::Smoothed => ClassWeights::smoothed(
                self.n_pos,
                self.n_neg,
                self.n_keywords,
                self.keyword_weight,
                self.smoothing,
            ),
        }
    }

    /// Explicit sample weights, or `None` when every row weighs 1.
    ///
    /// Real rows come first and keep weight 1; keyword rows get `keyword_weight`.
    pub(crate) fn sample_weights(&self) -> Option<Vec<f64>> {
        if self.keyword_weight == 1.0 {
            return None;
        }
        let n_real = self.n_pos + self.n_neg;
        let mut weights = vec![1.0; n_real + self.n_keywords];
        weights[n_real..].fill(self.keyword_weight);
        Some(weights)
    }

    /// Combined per-row weight: sample weight times class weight.
    pub(crate) fn effective_weights(&self, fitted_labels: &[bool]) -> (ClassWeights, Vec<f64>) {
        let class_weights = self.class_weights(fitted_labels);
        let sample = self.sample_weights();
        let weights = fitted_labels
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let s = sample.as_ref().map_or(1.0, |w| w[i]);
                s * class_weights.weight_for(y)
            })
            .collect();
        (class_weights, weights)
    }
}
