//! Multi-label code classification: train, predict, select.
//!
//! Trains one regularised logistic classifier per code with optional keyword
//! pseudo-examples and class reweighting, applies the resulting slots to new
//! messages, ranks messages by uncertainty for annotation, and persists the
//! classifier set.

mod config;
mod error;
mod keywords;
mod logistic;
mod predict;
mod result;
mod select;
mod serialize;
mod slot;
mod trainer;
mod weights;

pub use config::{Penalty, TrainerConfig, WeightMode};
pub use error::ModelError;
pub use keywords::KeywordSpec;
pub use logistic::LogisticModel;
pub use predict::{predict, predict_probability};
pub use result::{LabelSummary, TrainingMetadata, TrainingResult};
pub use select::{
    SelectionConfig, UncertaintyReduction, random_sample, score_by_uncertainty, top_n,
};
pub use slot::ClassifierSlot;
pub use trainer::ClassifierSet;
pub use weights::ClassWeights;
