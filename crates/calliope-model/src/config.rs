//! Configuration builder for per-code classifier training.

use std::fmt;
use std::str::FromStr;

use calliope_features::TrainingBundle;

use crate::error::ModelError;
use crate::keywords::KeywordSpec;
use crate::result::TrainingResult;

/// Regularization applied to the classifier coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Penalty {
    /// Lasso: sum of absolute coefficients. Drives weak features to zero.
    L1,
    /// Ridge: half the sum of squared coefficients.
    L2,
}

impl FromStr for Penalty {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(Self::L1),
            "l2" => Ok(Self::L2),
            _ => Err(ModelError::UnknownPenalty {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1 => f.write_str("l1"),
            Self::L2 => f.write_str("l2"),
        }
    }
}

/// How the total weight of positive and negative examples is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WeightMode {
    /// Equal total mass for both classes: `n / (2 * n_class)` per example.
    Balanced,
    /// Observed class counts plus smoothing, discounted for keyword rows.
    Smoothed,
}

impl FromStr for WeightMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Self::Balanced),
            "smoothed" => Ok(Self::Smoothed),
            _ => Err(ModelError::UnknownWeightMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balanced => f.write_str("balanced"),
            Self::Smoothed => f.write_str("smoothed"),
        }
    }
}

/// Configuration for training one binary classifier per code.
///
/// Construct via [`TrainerConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default     |
/// |--------------------|-------------|
/// | `keyword_strength` | 1.0         |
/// | `keyword_weight`   | 1.0         |
/// | `weight_mode`      | `Balanced`  |
/// | `smoothing`        | 0.0         |
/// | `max_iter`         | 1000        |
/// | `tol`              | 1e-4        |
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub(crate) penalty: Penalty,
    pub(crate) inverse_regularization: f64,
    pub(crate) keyword_strength: f64,
    pub(crate) keyword_weight: f64,
    pub(crate) weight_mode: WeightMode,
    pub(crate) smoothing: f64,
    pub(crate) max_iter: usize,
    pub(crate) tol: f64,
}

impl TrainerConfig {
    /// Create a new config with the given penalty and inverse regularization strength `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInverseRegularization`] if `c` is not positive and finite.
    pub fn new(penalty: Penalty, inverse_regularization: f64) -> Result<Self, ModelError> {
        if !(inverse_regularization.is_finite() && inverse_regularization > 0.0) {
            return Err(ModelError::InvalidInverseRegularization {
                c: inverse_regularization,
            });
        }
        Ok(Self {
            penalty,
            inverse_regularization,
            keyword_strength: 1.0,
            keyword_weight: 1.0,
            weight_mode: WeightMode::Balanced,
            smoothing: 0.0,
            max_iter: 1000,
            tol: 1e-4,
        })
    }

    // --- Setters ---

    /// Set the value given to the single active feature of each keyword row.
    #[must_use]
    pub fn with_keyword_strength(mut self, keyword_strength: f64) -> Self {
        self.keyword_strength = keyword_strength;
        self
    }

    /// Set the sample weight of each keyword row relative to a real message.
    #[must_use]
    pub fn with_keyword_weight(mut self, keyword_weight: f64) -> Self {
        self.keyword_weight = keyword_weight;
        self
    }

    /// Set the class weighting mode.
    #[must_use]
    pub fn with_weight_mode(mut self, weight_mode: WeightMode) -> Self {
        self.weight_mode = weight_mode;
        self
    }

    /// Set the smoothing constant used by [`WeightMode::Smoothed`].
    #[must_use]
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the maximum number of coordinate descent epochs per classifier.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance on the largest coefficient change in an epoch.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    // --- Getters ---

    /// Return the penalty.
    #[must_use]
    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    /// Return the inverse regularization strength `C`.
    #[must_use]
    pub fn inverse_regularization(&self) -> f64 {
        self.inverse_regularization
    }

    /// Return the keyword strength.
    #[must_use]
    pub fn keyword_strength(&self) -> f64 {
        self.keyword_strength
    }

    /// Return the keyword weight.
    #[must_use]
    pub fn keyword_weight(&self) -> f64 {
        self.keyword_weight
    }

    /// Return the class weighting mode.
    #[must_use]
    pub fn weight_mode(&self) -> WeightMode {
        self.weight_mode
    }

    /// Return the smoothing constant.
    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Return the maximum number of epochs.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the convergence tolerance.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Check the numeric settings that the setters accept unchecked.
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if !(self.keyword_weight.is_finite() && self.keyword_weight > 0.0) {
            return Err(ModelError::InvalidKeywordWeight {
                weight: self.keyword_weight,
            });
        }
        if !self.keyword_strength.is_finite() {
            return Err(ModelError::InvalidKeywordStrength {
                strength: self.keyword_strength,
            });
        }
        if !(self.smoothing.is_finite() && self.smoothing >= 0.0) {
            return Err(ModelError::InvalidSmoothing {
                smoothing: self.smoothing,
            });
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidMaxIter {
                max_iter: self.max_iter,
            });
        }
        Ok(())
    }

    /// Train one classifier per code column.
    ///
    /// `features[sample_idx][feature_idx]`: row-major layout.
    /// `labels[sample_idx][code_idx]`: one boolean per code.
    /// `code_names`: names for each code column.
    ///
    /// # Errors
    ///
    /// | Variant                                   | When                                              |
    /// |-------------------------------------------|---------------------------------------------------|
    /// | [`ModelError::InvalidKeywordWeight`]      | `keyword_weight` is not positive and finite       |
    /// | [`ModelError::InvalidSmoothing`]          | `smoothing` is negative or not finite             |
    /// | [`ModelError::EmptyDataset`]              | `features` is empty                               |
    /// | [`ModelError::ZeroFeatures`]              | rows have zero feature columns                    |
    /// | [`ModelError::FeatureCountMismatch`]      | rows have inconsistent lengths                    |
    /// | [`ModelError::NonFiniteValue`]            | any value is NaN or infinite                      |
    /// | [`ModelError::LabelCountMismatch`]        | a label row is not `code_names.len()` wide        |
    /// | [`ModelError::KeywordOutOfRange`]         | a keyword index is not a feature column           |
    /// | [`ModelError::SingleClassLabel`]          | a code is positive for every sample               |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[Vec<bool>],
        code_names: &[String],
        keywords: Option<&KeywordSpec>,
    ) -> Result<TrainingResult, ModelError> {
        crate::trainer::train(self, features, labels, code_names, keywords)
    }

    /// Train on a [`TrainingBundle`], using its code names.
    ///
    /// # Errors
    ///
    /// Same as [`TrainerConfig::fit`].
    pub fn fit_bundle(
        &self,
        bundle: &TrainingBundle,
        keywords: Option<&KeywordSpec>,
    ) -> Result<TrainingResult, ModelError> {
        self.fit(bundle.features(), bundle.labels(), bundle.code_names(), keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_weight_mode() {
        assert_eq!("balanced".parse::<WeightMode>().unwrap(), WeightMode::Balanced);
        assert_eq!("smoothed".parse::<WeightMode>().unwrap(), WeightMode::Smoothed);
        let err = "uniform".parse::<WeightMode>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownWeightMode { ref value } if value == "uniform"));
    }

    #[test]
    fn parse_penalty() {
        assert_eq!("l1".parse::<Penalty>().unwrap(), Penalty::L1);
        assert_eq!("L2".parse::<Penalty>().unwrap(), Penalty::L2);
        assert!("elasticnet".parse::<Penalty>().is_err());
    }

    #[test]
    fn rejects_non_positive_c() {
        assert!(TrainerConfig::new(Penalty::L2, 0.0).is_err());
        assert!(TrainerConfig::new(Penalty::L2, -1.0).is_err());
        assert!(TrainerConfig::new(Penalty::L2, f64::NAN).is_err());
        assert!(TrainerConfig::new(Penalty::L1, 0.5).is_ok());
    }

    #[test]
    fn validate_catches_bad_setters() {
        let base = TrainerConfig::new(Penalty::L2, 1.0).unwrap();
        assert!(base.clone().validate().is_ok());
        assert!(matches!(
            base.clone().with_keyword_weight(0.0).validate(),
            Err(ModelError::InvalidKeywordWeight { .. })
        ));
        assert!(matches!(
            base.clone().with_smoothing(-1.0).validate(),
            Err(ModelError::InvalidSmoothing { .. })
        ));
        assert!(matches!(
            base.with_max_iter(0).validate(),
            Err(ModelError::InvalidMaxIter { max_iter: 0 })
        ));
    }

    #[test]
    fn defaults() {
        let config = TrainerConfig::new(Penalty::L1, 1.0).unwrap();
        assert_eq!(config.weight_mode(), WeightMode::Balanced);
        assert!((config.keyword_weight() - 1.0).abs() < f64::EPSILON);
        assert!((config.keyword_strength() - 1.0).abs() < f64::EPSILON);
        assert!(config.smoothing().abs() < f64::EPSILON);
    }
}
