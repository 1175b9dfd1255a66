use std::path::PathBuf;

/// Errors from classifier training, prediction, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when the inverse regularization strength is not a positive finite number.
    #[error("inverse regularization strength C must be positive and finite, got {c}")]
    InvalidInverseRegularization {
        /// The invalid C value provided.
        c: f64,
    },

    /// Returned when the keyword weight is not a positive finite number.
    #[error("keyword_weight must be positive and finite, got {weight}")]
    InvalidKeywordWeight {
        /// The invalid weight provided.
        weight: f64,
    },

    /// Returned when the keyword strength is not finite.
    #[error("keyword_strength must be finite, got {strength}")]
    InvalidKeywordStrength {
        /// The invalid strength provided.
        strength: f64,
    },

    /// Returned when smoothing is negative or not finite.
    #[error("smoothing must be non-negative and finite, got {smoothing}")]
    InvalidSmoothing {
        /// The invalid smoothing value provided.
        smoothing: f64,
    },

    /// Returned when max_iter is zero.
    #[error("max_iter must be at least 1, got {max_iter}")]
    InvalidMaxIter {
        /// The invalid max_iter value provided.
        max_iter: usize,
    },

    /// Returned when the weight mode string is not recognised.
    #[error("unknown weight mode \"{value}\" (expected balanced or smoothed)")]
    UnknownWeightMode {
        /// The unrecognised value.
        value: String,
    },

    /// Returned when the penalty string is not recognised.
    #[error("unknown penalty \"{value}\" (expected l1 or l2)")]
    UnknownPenalty {
        /// The unrecognised value.
        value: String,
    },

    /// Returned when the uncertainty reduction string is not recognised.
    #[error("unknown uncertainty reduction \"{value}\" (expected min or mean)")]
    UnknownReduction {
        /// The unrecognised value.
        value: String,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when the label matrix has a different row count than the feature matrix.
    #[error("label matrix has {labels} rows, feature matrix has {features}")]
    LabelRowCountMismatch {
        /// Rows in the feature matrix.
        features: usize,
        /// Rows in the label matrix.
        labels: usize,
    },

    /// Returned when a label row does not have one entry per code name.
    #[error("label row {sample_index} has {got} entries, expected {expected}")]
    LabelCountMismatch {
        /// Number of declared code names.
        expected: usize,
        /// Entries in the offending row.
        got: usize,
        /// The zero-based index of the offending row.
        sample_index: usize,
    },

    /// Returned when a keyword entry names a label that does not exist.
    #[error("keywords given for label {label}, but only {n_labels} labels exist")]
    KeywordLabelOutOfRange {
        /// The label index in the keyword table.
        label: usize,
        /// Number of label columns.
        n_labels: usize,
    },

    /// Returned when a keyword feature index is not a valid feature column.
    #[error("keyword feature {feature} for label {label} is out of range (n_features = {n_features})")]
    KeywordOutOfRange {
        /// The label the keyword belongs to.
        label: usize,
        /// The offending feature index.
        feature: usize,
        /// Number of feature columns.
        n_features: usize,
    },

    /// Returned when a label column has no negative examples, so no boundary can be fit.
    #[error("label {label} is positive for all {n_samples} samples; a classifier needs both classes")]
    SingleClassLabel {
        /// The zero-based label column.
        label: usize,
        /// Number of training samples.
        n_samples: usize,
    },

    /// Returned when a classifier set is assembled with one slot per code violated.
    #[error("{slots} classifier slots given for {codes} codes")]
    SlotCountMismatch {
        /// Number of slots provided.
        slots: usize,
        /// Number of code names provided.
        codes: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when classifiers and a training bundle name different codes.
    #[error("classifiers were trained on codes {trained:?}, bundle has {expected:?}")]
    CodeNamesMismatch {
        /// Code names of the bundle.
        expected: Vec<String>,
        /// Code names stored with the classifiers.
        trained: Vec<String>,
    },

    /// Returned when classifiers and a training bundle disagree on the feature count.
    #[error("classifiers expect {trained} features, bundle has {expected}")]
    FeatureWidthMismatch {
        /// Feature count of the bundle.
        expected: usize,
        /// Feature count stored with the classifiers.
        trained: usize,
    },

    /// Returned when a model file's header disagrees with the classifiers it holds.
    #[error("inconsistent model file {path}: {detail}")]
    InconsistentModel {
        /// Path to the model file.
        path: PathBuf,
        /// What disagreed.
        detail: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize classifiers")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize classifiers from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write classifiers to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read classifiers from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
