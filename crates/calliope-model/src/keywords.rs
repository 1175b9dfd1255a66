//! Keyword pseudo-examples: features that on their own imply a code.

use std::collections::BTreeMap;

use crate::error::ModelError;

/// Mapping from label index to the feature indices that are keywords for it.
///
/// Used only at training time: each keyword becomes one synthetic positive
/// row with that single feature set to the keyword strength.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSpec {
    by_label: BTreeMap<usize, Vec<usize>>,
}

impl KeywordSpec {
    /// Create an empty keyword set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from one list per label, `lists[k]` holding label `k`'s keywords.
    #[must_use]
    pub fn from_lists(lists: Vec<Vec<usize>>) -> Self {
        let by_label = lists
            .into_iter()
            .enumerate()
            .filter(|(_, features)| !features.is_empty())
            .collect();
        Self { by_label }
    }

    /// Add keyword features for a label, appending to any already present.
    pub fn insert(&mut self, label: usize, features: impl IntoIterator<Item = usize>) {
        self.by_label.entry(label).or_default().extend(features);
    }

    /// Keyword feature indices for a label (empty when none were given).
    #[must_use]
    pub fn keywords_for(&self, label: usize) -> &[usize] {
        self.by_label.get(&label).map_or(&[][..], Vec::as_slice)
    }

    /// Total number of keyword entries across all labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_label.values().map(Vec::len).sum()
    }

    /// Whether no keywords were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every label and feature index against the training dimensions.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::KeywordLabelOutOfRange`] | a label index is `>= n_labels` |
    /// | [`ModelError::KeywordOutOfRange`] | a feature index is `>= n_features` |
    pub fn validate(&self, n_labels: usize, n_features: usize) -> Result<(), ModelError> {
        for (&label, features) in &self.by_label {
            if label >= n_labels {
                return Err(ModelError::KeywordLabelOutOfRange { label, n_labels });
            }
            if let Some(&feature) = features.iter().find(|&&f| f >= n_features) {
                return Err(ModelError::KeywordOutOfRange {
                    label,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }

    /// Synthesize one positive row per keyword of `label`.
    pub(crate) fn pseudo_examples(
        &self,
        label: usize,
        n_features: usize,
        strength: f64,
    ) -> Vec<Vec<f64>> {
        self.keywords_for(label)
            .iter()
            .map(|&feature| {
                let mut row = vec![0.0; n_features];
                row[feature] = strength;
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_lists_skips_empty_labels() {
        let spec = KeywordSpec::from_lists(vec![vec![0, 2], vec![], vec![1]]);
        assert_eq!(spec.keywords_for(0), &[0, 2]);
        assert!(spec.keywords_for(1).is_empty());
        assert_eq!(spec.keywords_for(2), &[1]);
        assert_eq!(spec.len(), 3);
    }

    #[test]
    fn validate_rejects_feature_out_of_range() {
        let mut spec = KeywordSpec::new();
        spec.insert(1, [0, 7]);
        let err = spec.validate(2, 5).unwrap_err();
        assert!(matches!(
            err,
            ModelError::KeywordOutOfRange {
                label: 1,
                feature: 7,
                n_features: 5
            }
        ));
    }

    #[test]
    fn validate_rejects_label_out_of_range() {
        let mut spec = KeywordSpec::new();
        spec.insert(3, [0]);
        let err = spec.validate(2, 5).unwrap_err();
        assert!(matches!(
            err,
            ModelError::KeywordLabelOutOfRange {
                label: 3,
                n_labels: 2
            }
        ));
    }

    #[test]
    fn pseudo_examples_are_one_hot_rows() {
        let spec = KeywordSpec::from_lists(vec![vec![2, 0]]);
        let rows = spec.pseudo_examples(0, 3, 4.0);
        assert_eq!(rows, vec![vec![0.0, 0.0, 4.0], vec![4.0, 0.0, 0.0]]);
        assert!(spec.pseudo_examples(1, 3, 4.0).is_empty());
    }
}
