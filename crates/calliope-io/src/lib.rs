//! CSV boundary, keyword loading, alignment, and evaluation for calliope.

mod align;
mod assemble;
mod coded;
mod domain;
mod error;
mod evaluate;
mod keywords;
mod messages;
mod metrics;
mod table;
mod training;
mod widen;
mod writer;

pub use align::{AlignedCode, align};
pub use assemble::{PredictionRow, PredictionTable};
pub use coded::{CodedRecord, CodedTable, CodedTableReader};
pub use domain::{ExperimentName, MessageId, Provenance};
pub use error::IoError;
pub use evaluate::{
    CodeEvaluation, align_and_evaluate, align_and_evaluate_named, evaluate_codes, shared_columns,
};
pub use keywords::KeywordTable;
pub use messages::{MessageReader, MessageTable};
pub use metrics::BinaryConfusion;
pub use table::read_headers;
pub use training::TrainingReader;
pub use widen::{WidenSummary, widen_codes};
pub use writer::ResultWriter;
