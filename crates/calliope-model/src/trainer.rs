//! Weighted, keyword-augmented training of one classifier per code.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument, warn};

use crate::config::TrainerConfig;
use crate::error::ModelError;
use crate::keywords::KeywordSpec;
use crate::logistic::{self, SolverSettings};
use crate::result::{LabelSummary, TrainingMetadata, TrainingResult};
use crate::slot::ClassifierSlot;
use crate::weights::WeightPlan;

/// One classifier slot per code, in label-column order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassifierSet {
    pub(crate) slots: Vec<ClassifierSlot>,
    pub(crate) code_names: Vec<String>,
    pub(crate) n_features: usize,
}

impl ClassifierSet {
    /// Assemble a set from existing slots.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SlotCountMismatch`] unless there is exactly one slot per code name.
    pub fn new(
        slots: Vec<ClassifierSlot>,
        code_names: Vec<String>,
        n_features: usize,
    ) -> Result<Self, ModelError> {
        if slots.len() != code_names.len() {
            return Err(ModelError::SlotCountMismatch {
                slots: slots.len(),
                codes: code_names.len(),
            });
        }
        Ok(Self {
            slots,
            code_names,
            n_features,
        })
    }

    /// Return the slots in code order.
    #[must_use]
    pub fn slots(&self) -> &[ClassifierSlot] {
        &self.slots
    }

    /// Return the code names in slot order.
    #[must_use]
    pub fn code_names(&self) -> &[String] {
        &self.code_names
    }

    /// Return the number of features the classifiers expect.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of codes (slots).
    #[must_use]
    pub fn n_codes(&self) -> usize {
        self.slots.len()
    }

    /// Return the indices of codes without a trained classifier.
    #[must_use]
    pub fn absent_codes(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_trained())
            .map(|(k, _)| k)
            .collect()
    }

    /// Check that these classifiers were trained on the given codes and feature count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::CodeNamesMismatch`] | code names differ in content or order |
    /// | [`ModelError::FeatureWidthMismatch`] | feature counts differ |
    pub fn ensure_compatible(
        &self,
        code_names: &[String],
        n_features: usize,
    ) -> Result<(), ModelError> {
        if self.code_names != code_names {
            return Err(ModelError::CodeNamesMismatch {
                expected: code_names.to_vec(),
                trained: self.code_names.clone(),
            });
        }
        if self.n_features != n_features {
            return Err(ModelError::FeatureWidthMismatch {
                expected: n_features,
                trained: self.n_features,
            });
        }
        Ok(())
    }
}

/// Validate dimensions and values before any label is fit.
fn validate_inputs(
    config: &TrainerConfig,
    features: &[Vec<f64>],
    labels: &[Vec<bool>],
    code_names: &[String],
    keywords: Option<&KeywordSpec>,
) -> Result<usize, ModelError> {
    config.validate()?;

    if features.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ModelError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(ModelError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }

    if labels.len() != features.len() {
        return Err(ModelError::LabelRowCountMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }
    for (sample_index, row) in labels.iter().enumerate() {
        if row.len() != code_names.len() {
            return Err(ModelError::LabelCountMismatch {
                expected: code_names.len(),
                got: row.len(),
                sample_index,
            });
        }
    }

    if let Some(spec) = keywords {
        spec.validate(code_names.len(), n_features)?;
    }

    // A code seen on every message has no negative side to learn from.
    for label in 0..code_names.len() {
        if labels.iter().all(|row| row[label]) {
            return Err(ModelError::SingleClassLabel {
                label,
                n_samples: labels.len(),
            });
        }
    }

    Ok(n_features)
}

/// Train the classifier for a single label column.
fn train_label(
    config: &TrainerConfig,
    features: &[Vec<f64>],
    labels: &[Vec<bool>],
    code_name: &str,
    label: usize,
    n_features: usize,
    keywords: Option<&KeywordSpec>,
) -> (ClassifierSlot, LabelSummary) {
    let column: Vec<bool> = labels.iter().map(|row| row[label]).collect();
    let n_pos = column.iter().filter(|&&y| y).count();
    let n_neg = column.len() - n_pos;

    if n_pos == 0 {
        warn!(label, code = code_name, "no positive examples, leaving slot absent");
        return (
            ClassifierSlot::Absent,
            LabelSummary::absent(label, code_name, n_neg),
        );
    }

    let keyword_rows = keywords.map_or_else(Vec::new, |spec| {
        spec.pseudo_examples(label, n_features, config.keyword_strength)
    });
    let n_keywords = keyword_rows.len();

    // Real rows first, keyword pseudo-examples appended after them.
    let rows: Vec<&[f64]> = features
        .iter()
        .chain(keyword_rows.iter())
        .map(Vec::as_slice)
        .collect();
    let mut fitted_labels = column;
    fitted_labels.extend(std::iter::repeat_n(true, n_keywords));

    let plan = WeightPlan {
        mode: config.weight_mode,
        n_pos,
        n_neg,
        n_keywords,
        keyword_weight: config.keyword_weight,
        smoothing: config.smoothing,
    };
    let (class_weights, weights) = plan.effective_weights(&fitted_labels);

    let fit = logistic::fit(
        &rows,
        &fitted_labels,
        &weights,
        SolverSettings {
            penalty: config.penalty,
            inverse_regularization: config.inverse_regularization,
            max_iter: config.max_iter,
            tol: config.tol,
        },
    );

    if !fit.converged {
        warn!(
            label,
            code = code_name,
            epochs = fit.epochs,
            "classifier did not converge within max_iter"
        );
    }
    debug!(
        label,
        code = code_name,
        n_pos,
        n_neg,
        n_keywords,
        positive_weight = class_weights.positive,
        negative_weight = class_weights.negative,
        epochs = fit.epochs,
        "classifier fitted"
    );

    let summary = LabelSummary {
        label,
        code_name: code_name.to_string(),
        n_positive: n_pos,
        n_negative: n_neg,
        n_keywords,
        class_weights: Some(class_weights),
        epochs: fit.epochs,
        converged: fit.converged,
    };
    (ClassifierSlot::Trained(fit.model), summary)
}

/// Train one classifier per code column.
#[instrument(skip_all, fields(n_samples = features.len(), n_codes = code_names.len()))]
pub(crate) fn train(
    config: &TrainerConfig,
    features: &[Vec<f64>],
    labels: &[Vec<bool>],
    code_names: &[String],
    keywords: Option<&KeywordSpec>,
) -> Result<TrainingResult, ModelError> {
    let n_features = validate_inputs(config, features, labels, code_names, keywords)?;
    let n_samples = features.len();

    info!(
        n_samples,
        n_features,
        n_codes = code_names.len(),
        penalty = %config.penalty,
        c = config.inverse_regularization,
        weight_mode = %config.weight_mode,
        n_keywords = keywords.map_or(0, KeywordSpec::len),
        "training code classifiers"
    );

    // Labels are independent; collect preserves label order.
    let per_label: Vec<(ClassifierSlot, LabelSummary)> = (0..code_names.len())
        .into_par_iter()
        .map(|label| {
            train_label(
                config,
                features,
                labels,
                &code_names[label],
                label,
                n_features,
                keywords,
            )
        })
        .collect();

    let (slots, summaries): (Vec<_>, Vec<_>) = per_label.into_iter().unzip();

    let n_trained = slots.iter().filter(|s| s.is_trained()).count();
    let metadata = TrainingMetadata {
        n_samples,
        n_features,
        n_codes: code_names.len(),
        n_trained,
        n_absent: code_names.len() - n_trained,
    };

    info!(
        n_trained,
        n_absent = metadata.n_absent,
        "code classifier training complete"
    );

    let classifiers = ClassifierSet {
        slots,
        code_names: code_names.to_vec(),
        n_features,
    };
    Ok(TrainingResult::new(classifiers, summaries, metadata))
}
