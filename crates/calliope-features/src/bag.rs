//! Bags of features: feature name to accumulated value.

use std::collections::BTreeMap;

/// A bag of features for one message.
///
/// Values accumulate when the same feature is added more than once, so a
/// bag built from tokens holds term counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureBag(BTreeMap<String, f64>);

impl FeatureBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag by counting each token once per occurrence.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bag = Self::new();
        for token in tokens {
            bag.add(token, 1.0);
        }
        bag
    }

    /// Add `value` to the feature's running total.
    pub fn add(&mut self, feature: impl Into<String>, value: f64) {
        *self.0.entry(feature.into()).or_insert(0.0) += value;
    }

    /// Return the accumulated value for a feature, if present.
    #[must_use]
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    /// Iterate over `(feature, value)` pairs in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of distinct features in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_tokens_accumulate() {
        let bag = FeatureBag::from_tokens(["net", "water", "net"]);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("net"), Some(2.0));
        assert_eq!(bag.get("water"), Some(1.0));
        assert_eq!(bag.get("spray"), None);
    }

    #[test]
    fn empty_bag() {
        let bag = FeatureBag::from_tokens(Vec::<String>::new());
        assert!(bag.is_empty());
    }
}
