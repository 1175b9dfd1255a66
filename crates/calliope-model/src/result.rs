//! Training result types for the per-code classifier set.

use crate::trainer::ClassifierSet;
use crate::weights::ClassWeights;

/// Metadata about the training run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainingMetadata {
    /// Number of real training messages.
    pub n_samples: usize,
    /// Number of feature columns.
    pub n_features: usize,
    /// Number of codes (label columns).
    pub n_codes: usize,
    /// Codes that received a fitted classifier.
    pub n_trained: usize,
    /// Codes left without a classifier.
    pub n_absent: usize,
}

/// What happened while training one code.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LabelSummary {
    /// Label column index.
    pub label: usize,
    /// Code name of the label column.
    pub code_name: String,
    /// Real messages carrying the code.
    pub n_positive: usize,
    /// Real messages not carrying the code.
    pub n_negative: usize,
    /// Keyword pseudo-examples appended for this code.
    pub n_keywords: usize,
    /// Class weights used, `None` when the slot is absent.
    pub class_weights: Option<ClassWeights>,
    /// Solver epochs run.
    pub epochs: usize,
    /// Whether the solver met its tolerance.
    pub converged: bool,
}

impl LabelSummary {
    pub(crate) fn absent(label: usize, code_name: &str, n_negative: usize) -> Self {
        Self {
            label,
            code_name: code_name.to_string(),
            n_positive: 0,
            n_negative,
            n_keywords: 0,
            class_weights: None,
            epochs: 0,
            converged: true,
        }
    }
}

/// Result of training a classifier set.
#[derive(Debug)]
pub struct TrainingResult {
    classifiers: ClassifierSet,
    summaries: Vec<LabelSummary>,
    metadata: TrainingMetadata,
}

impl TrainingResult {
    pub(crate) fn new(
        classifiers: ClassifierSet,
        summaries: Vec<LabelSummary>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            classifiers,
            summaries,
            metadata,
        }
    }

    /// Borrow the fitted classifier set.
    #[must_use]
    pub fn classifiers(&self) -> &ClassifierSet {
        &self.classifiers
    }

    /// Consume the result and return the classifier set.
    #[must_use]
    pub fn into_classifiers(self) -> ClassifierSet {
        self.classifiers
    }

    /// Per-code training summaries, in code order.
    #[must_use]
    pub fn summaries(&self) -> &[LabelSummary] {
        &self.summaries
    }

    /// Borrow the training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
