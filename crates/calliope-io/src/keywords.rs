//! Keyword files: JSON mapping codes to definitional features.

use std::collections::BTreeMap;
use std::path::Path;

use calliope_features::FeatureIndex;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::IoError;

/// A code or feature given either by zero-based index or by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reference {
    Index(usize),
    Name(String),
}

impl Reference {
    fn describe(&self) -> String {
        match self {
            Self::Index(i) => i.to_string(),
            Self::Name(name) => name.clone(),
        }
    }
}

/// Keyword features per code, resolved to column indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    by_code: BTreeMap<usize, Vec<usize>>,
}

impl KeywordTable {
    /// Load and resolve a keyword file.
    ///
    /// The file is a JSON object whose keys are code names (or zero-based
    /// code indices written as strings) and whose values are lists of
    /// feature names or zero-based feature indices:
    ///
    /// ```json
    /// { "Mosquito net": ["net", "nets", 17], "2": ["spray"] }
    /// ```
    ///
    /// A key that is both a code name and a valid index resolves as a name.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
    /// | [`IoError::ParseKeywords`] | File is not a JSON object of lists |
    /// | [`IoError::UnknownKeywordCode`] | Key is neither a code name nor a code index |
    /// | [`IoError::UnknownKeywordFeature`] | Feature is not in the index or out of range |
    #[instrument(skip(code_names, features), fields(path = %path.display()))]
    pub fn load(
        path: &Path,
        code_names: &[String],
        features: &FeatureIndex,
    ) -> Result<Self, IoError> {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw: BTreeMap<String, Vec<Reference>> =
            serde_json::from_str(&text).map_err(|e| IoError::ParseKeywords {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut by_code: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (code, refs) in raw {
            let code_index = code_names
                .iter()
                .position(|c| *c == code)
                .or_else(|| code.trim().parse::<usize>().ok().filter(|&i| i < code_names.len()))
                .ok_or_else(|| IoError::UnknownKeywordCode {
                    path: path.to_path_buf(),
                    code: code.clone(),
                })?;

            let entry = by_code.entry(code_index).or_default();
            for reference in &refs {
                let feature = match reference {
                    Reference::Index(i) if *i < features.len() => Some(*i),
                    Reference::Index(_) => None,
                    Reference::Name(name) => features.index_of(name),
                };
                let feature = feature.ok_or_else(|| IoError::UnknownKeywordFeature {
                    path: path.to_path_buf(),
                    code: code.clone(),
                    feature: reference.describe(),
                })?;
                if !entry.contains(&feature) {
                    entry.push(feature);
                }
            }
            debug!(code = %code, code_index, n_keywords = entry.len(), "keywords resolved");
        }
        by_code.retain(|_, v| !v.is_empty());

        info!(
            n_codes = by_code.len(),
            n_keywords = by_code.values().map(Vec::len).sum::<usize>(),
            "keyword file loaded"
        );
        Ok(Self { by_code })
    }

    /// Keyword feature indices for `code`, empty when it has none.
    #[must_use]
    pub fn keywords_for(&self, code: usize) -> &[usize] {
        self.by_code.get(&code).map_or(&[][..], Vec::as_slice)
    }

    /// Dense per-code lists of length `n_codes`.
    #[must_use]
    pub fn to_lists(&self, n_codes: usize) -> Vec<Vec<usize>> {
        (0..n_codes).map(|k| self.keywords_for(k).to_vec()).collect()
    }

    /// Return the number of codes with at least one keyword.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether no code has keywords.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
