//! Domain types for calliope-io.

use std::fmt;

use crate::IoError;

/// A message identifier.
///
/// Wraps the trimmed, non-empty contents of the identifier column. Ordering
/// is plain string order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new message ID from a non-empty string.
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "message ID must not be empty");
        Self(id)
    }

    /// Return the message ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a row of a prediction table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Machine-labelled by a classifier.
    Prediction,
    /// Human-labelled training row folded into the table.
    Training,
}

impl Provenance {
    /// Return the tag as written in CSV files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::Training => "training",
        }
    }

    /// Parse a provenance cell. Empty cells carry no provenance.
    pub(crate) fn parse(raw: &str) -> Result<Option<Self>, ()> {
        match raw.trim() {
            "" => Ok(None),
            "prediction" => Ok(Some(Self::Prediction)),
            "training" => Ok(Some(Self::Training)),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interpret a code cell: empty means absent, numbers are true when non-zero.
pub(crate) fn parse_code_cell(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(false);
    }
    if raw.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Some(false),
        Ok(v) => Some(v != 0.0),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_orders_as_strings() {
        let mut ids = vec![
            MessageId::new("10".into()),
            MessageId::new("2".into()),
            MessageId::new("1".into()),
        ];
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(MessageId::as_str).collect();
        assert_eq!(sorted, vec!["1", "10", "2"]);
    }

    #[test]
    fn provenance_parses_known_tags() {
        assert_eq!(Provenance::parse("prediction"), Ok(Some(Provenance::Prediction)));
        assert_eq!(Provenance::parse(" training "), Ok(Some(Provenance::Training)));
        assert_eq!(Provenance::parse(""), Ok(None));
        assert!(Provenance::parse("manual").is_err());
    }

    #[test]
    fn code_cells() {
        assert_eq!(parse_code_cell(""), Some(false));
        assert_eq!(parse_code_cell("1"), Some(true));
        assert_eq!(parse_code_cell("1.0"), Some(true));
        assert_eq!(parse_code_cell("0"), Some(false));
        assert_eq!(parse_code_cell("NaN"), Some(false));
        assert_eq!(parse_code_cell("TRUE"), Some(true));
        assert_eq!(parse_code_cell("yes please"), None);
    }

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("wash-s04_01".to_string());
        assert_eq!(name.unwrap().as_str(), "wash-s04_01");
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("wash s04!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
        assert!(ExperimentName::new(String::new()).is_err());
    }
}
