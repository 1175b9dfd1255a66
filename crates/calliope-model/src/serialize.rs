//! Classifier artifact persistence via bincode.
//!
//! The file header repeats the code names, feature width and absent codes.
//! A load rejects a file whose header disagrees with its classifiers.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ModelError;
use crate::trainer::ClassifierSet;

/// Current binary format version.
const FORMAT_VERSION: u32 = 2;

/// Versioned envelope: a header describing the set, then the set itself.
#[derive(serde::Serialize, serde::Deserialize)]
struct ClassifierEnvelope {
    format_version: u32,
    code_names: Vec<String>,
    n_features: usize,
    absent_codes: Vec<usize>,
    classifiers: ClassifierSet,
}

impl ClassifierEnvelope {
    fn wrap(set: &ClassifierSet) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            code_names: set.code_names().to_vec(),
            n_features: set.n_features(),
            absent_codes: set.absent_codes(),
            classifiers: set.clone(),
        }
    }

    /// Describe the first disagreement between the header and the stored set.
    fn mismatch(&self) -> Option<String> {
        let set = &self.classifiers;
        if set.slots().len() != set.code_names().len() {
            return Some(format!(
                "{} slots stored for {} codes",
                set.slots().len(),
                set.code_names().len()
            ));
        }
        if self.code_names != set.code_names() {
            return Some(format!(
                "header codes {:?} differ from stored codes {:?}",
                self.code_names,
                set.code_names()
            ));
        }
        if self.n_features != set.n_features() {
            return Some(format!(
                "header declares {} features, classifiers declare {}",
                self.n_features,
                set.n_features()
            ));
        }
        for (name, slot) in set.code_names().iter().zip(set.slots()) {
            if let Some(model) = slot.model() {
                if model.n_features() != self.n_features {
                    return Some(format!(
                        "code \"{name}\" has {} coefficients, expected {}",
                        model.n_features(),
                        self.n_features
                    ));
                }
            }
        }
        let absent = set.absent_codes();
        if self.absent_codes != absent {
            return Some(format!(
                "header lists absent codes {:?}, stored slots give {absent:?}",
                self.absent_codes
            ));
        }
        None
    }
}

impl ClassifierSet {
    /// Save the classifier set to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::SerializeModel`] | bincode encoding failed |
    /// | [`ModelError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let envelope = ClassifierEnvelope::wrap(self);

        let bytes =
            bincode::serialize(&envelope).map_err(|e| ModelError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| ModelError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_codes = envelope.code_names.len(),
            n_features = envelope.n_features,
            n_absent = envelope.absent_codes.len(),
            "classifiers saved"
        );

        Ok(())
    }

    /// Load a classifier set from a binary file and check it against its header.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::ReadModel`] | file read failed |
    /// | [`ModelError::DeserializeModel`] | bincode decoding failed |
    /// | [`ModelError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`ModelError::InconsistentModel`] | header and stored classifiers disagree |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ModelError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ClassifierEnvelope =
            bincode::deserialize(&bytes).map_err(|e| ModelError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ModelError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        if let Some(detail) = envelope.mismatch() {
            return Err(ModelError::InconsistentModel {
                path: path.to_path_buf(),
                detail,
            });
        }

        debug!(
            n_codes = envelope.code_names.len(),
            n_features = envelope.n_features,
            absent = ?envelope.absent_codes,
            "classifiers loaded"
        );

        Ok(envelope.classifiers)
    }
}
