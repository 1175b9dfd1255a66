//! Feature vocabulary and training data bundles.
//!
//! Maps bags of features (produced by an upstream extractor) onto
//! fixed-width numeric rows, and pairs those rows with a multi-label
//! boolean matrix for training.

mod bag;
mod bundle;
mod error;
mod index;

pub use bag::FeatureBag;
pub use bundle::TrainingBundle;
pub use error::FeatureError;
pub use index::FeatureIndex;
