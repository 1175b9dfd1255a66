//! Bidirectional mapping between feature names and column indices.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument};

use crate::bag::FeatureBag;

/// Vocabulary of features with a fixed column order.
///
/// Column `j` of every vectorised row holds the value of feature
/// `name_of(j)`. Indices are assigned in lexicographic order of the
/// feature names, so the same global set always yields the same layout.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureIndex {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl From<Vec<String>> for FeatureIndex {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<FeatureIndex> for Vec<String> {
    fn from(index: FeatureIndex) -> Self {
        index.names
    }
}

impl FeatureIndex {
    /// Build an index from an explicit list of names, keeping their order.
    ///
    /// Later duplicates are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashMap::new();
        for name in names {
            let name = name.into();
            if !lookup.contains_key(&name) {
                lookup.insert(name.clone(), ordered.len());
                ordered.push(name);
            }
        }
        Self {
            names: ordered,
            lookup,
        }
    }

    /// Collect the global set of features across all bags.
    #[instrument(skip_all, fields(n_bags = bags.len()))]
    pub fn from_bags(bags: &[FeatureBag]) -> Self {
        let global: BTreeSet<&str> = bags
            .iter()
            .flat_map(|bag| bag.iter().map(|(name, _)| name))
            .collect();
        debug!(n_features = global.len(), "feature vocabulary built");
        Self::from_names(global)
    }

    /// Return the column index of a feature.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Return the feature name at a column index.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Return all feature names in column order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of feature columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Convert one bag into a dense row. Features not in the index are dropped.
    #[must_use]
    pub fn vectorise_one(&self, bag: &FeatureBag) -> Vec<f64> {
        let mut row = vec![0.0; self.names.len()];
        for (name, value) in bag.iter() {
            if let Some(j) = self.index_of(name) {
                row[j] += value;
            }
        }
        row
    }

    /// Convert bags into an `N × F` matrix, row `i` from `bags[i]`.
    #[must_use]
    pub fn vectorise(&self, bags: &[FeatureBag]) -> Vec<Vec<f64>> {
        bags.iter().map(|bag| self.vectorise_one(bag)).collect()
    }

    /// Count, per column, the rows with a non-zero value.
    #[must_use]
    pub fn document_frequencies(&self, matrix: &[Vec<f64>]) -> Vec<usize> {
        let mut freq = vec![0usize; self.names.len()];
        for row in matrix {
            for (j, &value) in row.iter().enumerate().take(freq.len()) {
                if value != 0.0 {
                    freq[j] += 1;
                }
            }
        }
        freq
    }
}
