//! Feature/label training bundles and their on-disk format.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::FeatureError;
use crate::index::FeatureIndex;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// A feature matrix paired with a multi-label code matrix.
///
/// `features[i]` and `labels[i]` describe message `message_ids[i]`;
/// `labels[i][k]` says whether code `code_names[k]` applies.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingBundle {
    message_ids: Vec<String>,
    feature_index: FeatureIndex,
    code_names: Vec<String>,
    features: Vec<Vec<f64>>,
    labels: Vec<Vec<bool>>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct BundleEnvelope {
    format_version: u32,
    n_messages: usize,
    n_features: usize,
    n_codes: usize,
    bundle: TrainingBundle,
}

impl TrainingBundle {
    /// Pair a feature matrix with a label matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FeatureError::RowCountMismatch`] | `features` and `labels` differ in length |
    /// | [`FeatureError::IdentifierCountMismatch`] | `message_ids` differs from the row count |
    /// | [`FeatureError::FeatureCountMismatch`] | a feature row is not `feature_index.len()` wide |
    /// | [`FeatureError::LabelCountMismatch`] | a label row is not `code_names.len()` wide |
    pub fn new(
        message_ids: Vec<String>,
        feature_index: FeatureIndex,
        code_names: Vec<String>,
        features: Vec<Vec<f64>>,
        labels: Vec<Vec<bool>>,
    ) -> Result<Self, FeatureError> {
        if features.len() != labels.len() {
            return Err(FeatureError::RowCountMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if message_ids.len() != features.len() {
            return Err(FeatureError::IdentifierCountMismatch {
                rows: features.len(),
                ids: message_ids.len(),
            });
        }
        for (row_index, row) in features.iter().enumerate() {
            if row.len() != feature_index.len() {
                return Err(FeatureError::FeatureCountMismatch {
                    expected: feature_index.len(),
                    got: row.len(),
                    row_index,
                });
            }
        }
        for (row_index, row) in labels.iter().enumerate() {
            if row.len() != code_names.len() {
                return Err(FeatureError::LabelCountMismatch {
                    expected: code_names.len(),
                    got: row.len(),
                    row_index,
                });
            }
        }
        Ok(Self {
            message_ids,
            feature_index,
            code_names,
            features,
            labels,
        })
    }

    /// Return the message identifiers in row order.
    #[must_use]
    pub fn message_ids(&self) -> &[String] {
        &self.message_ids
    }

    /// Return the feature vocabulary.
    #[must_use]
    pub fn feature_index(&self) -> &FeatureIndex {
        &self.feature_index
    }

    /// Return the code names in label-column order.
    #[must_use]
    pub fn code_names(&self) -> &[String] {
        &self.code_names
    }

    /// Return the `N × F` feature matrix.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the `N × K` label matrix.
    #[must_use]
    pub fn labels(&self) -> &[Vec<bool>] {
        &self.labels
    }

    /// Number of messages (rows).
    #[must_use]
    pub fn n_messages(&self) -> usize {
        self.features.len()
    }

    /// Number of codes (label columns).
    #[must_use]
    pub fn n_codes(&self) -> usize {
        self.code_names.len()
    }

    /// Number of positive messages per code.
    #[must_use]
    pub fn code_frequencies(&self) -> Vec<usize> {
        let mut freq = vec![0usize; self.code_names.len()];
        for row in &self.labels {
            for (k, &positive) in row.iter().enumerate() {
                if positive {
                    freq[k] += 1;
                }
            }
        }
        freq
    }

    /// Number of messages containing each feature.
    #[must_use]
    pub fn feature_frequencies(&self) -> Vec<usize> {
        self.feature_index.document_frequencies(&self.features)
    }

    /// Save the bundle to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FeatureError::SerializeBundle`] | bincode encoding failed |
    /// | [`FeatureError::WriteBundle`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FeatureError> {
        let path = path.as_ref();
        let envelope = BundleEnvelope {
            format_version: FORMAT_VERSION,
            n_messages: self.n_messages(),
            n_features: self.feature_index.len(),
            n_codes: self.n_codes(),
            bundle: self.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| FeatureError::SerializeBundle { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| FeatureError::WriteBundle {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_messages = self.n_messages(),
            n_codes = self.n_codes(),
            "training bundle saved"
        );
        Ok(())
    }

    /// Load a bundle from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FeatureError::ReadBundle`] | file read failed |
    /// | [`FeatureError::DeserializeBundle`] | bincode decoding failed |
    /// | [`FeatureError::IncompatibleBundleVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| FeatureError::ReadBundle {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: BundleEnvelope =
            bincode::deserialize(&bytes).map_err(|e| FeatureError::DeserializeBundle {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(FeatureError::IncompatibleBundleVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_messages = envelope.n_messages,
            n_features = envelope.n_features,
            n_codes = envelope.n_codes,
            "training bundle loaded"
        );
        Ok(envelope.bundle)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn small_bundle() -> TrainingBundle {
        TrainingBundle::new(
            vec!["m1".into(), "m2".into(), "m3".into()],
            FeatureIndex::from_names(["net", "water"]),
            vec!["Mosquito net".into(), "Water".into()],
            vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0]],
            vec![vec![true, false], vec![false, true], vec![true, false]],
        )
        .unwrap()
    }

    #[test]
    fn code_and_feature_frequencies() {
        let bundle = small_bundle();
        assert_eq!(bundle.code_frequencies(), vec![2, 1]);
        assert_eq!(bundle.feature_frequencies(), vec![2, 2]);
    }

    #[test]
    fn label_width_must_match_code_names() {
        let err = TrainingBundle::new(
            vec!["m1".into()],
            FeatureIndex::from_names(["a"]),
            vec!["A".into(), "B".into()],
            vec![vec![1.0]],
            vec![vec![true]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FeatureError::LabelCountMismatch {
                expected: 2,
                got: 1,
                row_index: 0
            }
        ));
    }

    #[test]
    fn row_counts_must_match() {
        let err = TrainingBundle::new(
            vec!["m1".into()],
            FeatureIndex::from_names(["a"]),
            vec!["A".into()],
            vec![vec![1.0]],
            vec![vec![true], vec![false]],
        )
        .unwrap_err();
        assert!(matches!(err, FeatureError::RowCountMismatch { .. }));
    }

    #[test]
    fn feature_width_must_match_index() {
        let err = TrainingBundle::new(
            vec!["m1".into()],
            FeatureIndex::from_names(["a", "b"]),
            vec!["A".into()],
            vec![vec![1.0]],
            vec![vec![true]],
        )
        .unwrap_err();
        assert!(matches!(err, FeatureError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.bin");
        let bundle = small_bundle();
        bundle.save(&path).unwrap();
        let loaded = TrainingBundle::load(&path).unwrap();
        assert_eq!(loaded, bundle);
        assert_eq!(loaded.feature_index().index_of("water"), Some(1));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"nope").unwrap();
        let err = TrainingBundle::load(&path).unwrap_err();
        assert!(matches!(err, FeatureError::DeserializeBundle { .. }));
    }
}
