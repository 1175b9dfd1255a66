use std::path::PathBuf;

/// Errors from feature indexing and bundle persistence.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// Returned when the feature matrix and label matrix disagree on row count.
    #[error("feature matrix has {features} rows but label matrix has {labels}")]
    RowCountMismatch {
        /// Number of rows in the feature matrix.
        features: usize,
        /// Number of rows in the label matrix.
        labels: usize,
    },

    /// Returned when a label row does not have one entry per declared code.
    #[error("label row {row_index} has {got} entries, expected {expected} (one per code name)")]
    LabelCountMismatch {
        /// Number of declared code names.
        expected: usize,
        /// Number of entries in the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when a feature row does not match the index width.
    #[error("feature row {row_index} has {got} columns, expected {expected}")]
    FeatureCountMismatch {
        /// Width of the feature index.
        expected: usize,
        /// Number of columns in the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when the message identifier list does not match the row count.
    #[error("bundle has {rows} rows but {ids} message identifiers")]
    IdentifierCountMismatch {
        /// Number of rows in the feature matrix.
        rows: usize,
        /// Number of message identifiers.
        ids: usize,
    },

    /// Returned when bundle serialization fails.
    #[error("failed to serialize training bundle")]
    SerializeBundle {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when bundle deserialization fails.
    #[error("failed to deserialize training bundle from {path}")]
    DeserializeBundle {
        /// Path to the bundle file.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the bundle file fails.
    #[error("failed to write training bundle to {path}")]
    WriteBundle {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the bundle file fails.
    #[error("failed to read training bundle from {path}")]
    ReadBundle {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a bundle written by an incompatible format version.
    #[error("incompatible bundle version in {path}: expected {expected}, found {found}")]
    IncompatibleBundleVersion {
        /// The format version this build expects.
        expected: u32,
        /// The format version found in the file.
        found: u32,
        /// Path to the bundle file.
        path: PathBuf,
    },
}
