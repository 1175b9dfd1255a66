//! I/O error types for calliope-io.

use std::path::PathBuf;

/// Errors from CSV parsing, keyword loading, alignment, and result writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero usable data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a configured column is not in the header.
    #[error("column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The missing column name.
        column: String,
    },

    /// Returned when a code cell is neither empty, numeric, nor a boolean.
    #[error("invalid code value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    InvalidCodeValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Code column name.
        column: String,
        /// The raw cell contents.
        raw: String,
    },

    /// Returned when a provenance cell is neither `prediction`, `training`, nor empty.
    #[error("unknown provenance \"{raw}\" in {path}: row {row_index}")]
    UnknownProvenance {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw cell contents.
        raw: String,
    },

    /// Returned when the training table yields an invalid bundle.
    #[error("invalid training bundle from {path}")]
    InvalidBundle {
        /// Path to the training CSV.
        path: PathBuf,
        /// Underlying bundle validation error.
        source: calliope_features::FeatureError,
    },

    /// Returned when the keyword file cannot be parsed as JSON.
    #[error("cannot parse keyword file {path}")]
    ParseKeywords {
        /// Path to the keyword file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a keyword entry names a code that is not being trained.
    #[error("keyword file {path}: unknown code \"{code}\"")]
    UnknownKeywordCode {
        /// Path to the keyword file.
        path: PathBuf,
        /// The code name or index as written.
        code: String,
    },

    /// Returned when a keyword entry names a feature outside the feature index.
    #[error("keyword file {path}: unknown feature \"{feature}\" for code \"{code}\"")]
    UnknownKeywordFeature {
        /// Path to the keyword file.
        path: PathBuf,
        /// The code the keyword belongs to.
        code: String,
        /// The feature name or index as written.
        feature: String,
    },

    /// Returned when predictions and code names disagree between artifacts.
    #[error("code names differ: classifiers have {predicted:?}, training data has {training:?}")]
    CodeNamesMismatch {
        /// Code names of the classifier set.
        predicted: Vec<String>,
        /// Code names of the training bundle.
        training: Vec<String>,
    },

    /// Returned when the prediction matrix does not match the messages it belongs to.
    #[error("{predictions} prediction rows for {rows} messages")]
    PredictionRowMismatch {
        /// Number of messages.
        rows: usize,
        /// Number of prediction rows.
        predictions: usize,
    },

    /// Returned when the mutually verified subset for a code is empty.
    #[error("no mutually verified records for code \"{code}\"")]
    NoVerifiedRecords {
        /// Code being evaluated.
        code: String,
    },

    /// Returned when an identifier occurs twice after deduplication.
    #[error("identifier \"{id}\" is duplicated after deduplication")]
    DuplicateAfterDedup {
        /// The repeated identifier.
        id: String,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV output record cannot be written.
    #[error("cannot write CSV {path}")]
    CsvWrite {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}
