//! Message tables: identifier, feature bag, and passthrough columns.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calliope_features::FeatureBag;
use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::domain::MessageId;
use crate::table::RawTable;

/// Split a bag cell into features.
///
/// `None` splits on whitespace; otherwise on the given separator. Empty
/// pieces are dropped and repeated features accumulate counts.
pub(crate) fn split_bag(cell: &str, delimiter: Option<&str>) -> FeatureBag {
    match delimiter {
        None => FeatureBag::from_tokens(cell.split_whitespace()),
        Some(sep) => FeatureBag::from_tokens(
            cell.split(sep)
                .map(str::trim)
                .filter(|token| !token.is_empty()),
        ),
    }
}

/// Whether a cell, after trimming, is one of the accepted values.
fn cell_accepted(cell: &str, values: &[String]) -> bool {
    let cell = cell.trim();
    values.iter().any(|v| v == cell)
}

/// Messages in file order with their bags and original row contents.
///
/// `ids[i]`, `bags[i]` and `rows[i]` describe the same message.
#[derive(Debug, Clone)]
pub struct MessageTable {
    path: PathBuf,
    headers: Vec<String>,
    ids: Vec<MessageId>,
    bags: Vec<FeatureBag>,
    rows: Vec<Vec<String>>,
}

impl MessageTable {
    /// Return the CSV header.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the message IDs.
    #[must_use]
    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }

    /// Return the feature bags.
    #[must_use]
    pub fn bags(&self) -> &[FeatureBag] {
        &self.bags
    }

    /// Return the original rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Return the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Split into messages whose ID is not in `known`, and those that are.
    #[must_use]
    pub fn partition_known(self, known: &HashSet<&str>) -> (Self, Self) {
        let mut unknown = self.empty_like();
        let mut seen = self.empty_like();
        for ((id, bag), row) in self.ids.into_iter().zip(self.bags).zip(self.rows) {
            let target = if known.contains(id.as_str()) {
                &mut seen
            } else {
                &mut unknown
            };
            target.ids.push(id);
            target.bags.push(bag);
            target.rows.push(row);
        }
        debug!(
            n_unknown = unknown.len(),
            n_known = seen.len(),
            "partitioned messages by known identifiers"
        );
        (unknown, seen)
    }

    /// Keep only messages whose `column` cell, trimmed, is one of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] when the table has no such column.
    pub fn retain_where(self, column: &str, values: &[String]) -> Result<Self, IoError> {
        let col = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })?;
        let mut kept = self.empty_like();
        let mut n_filtered = 0usize;
        for ((id, bag), row) in self.ids.into_iter().zip(self.bags).zip(self.rows) {
            if cell_accepted(&row[col], values) {
                kept.ids.push(id);
                kept.bags.push(bag);
                kept.rows.push(row);
            } else {
                n_filtered += 1;
            }
        }
        debug!(column, n_kept = kept.len(), n_filtered, "messages filtered");
        Ok(kept)
    }

    /// Keep only the messages at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            path: self.path.clone(),
            headers: self.headers.clone(),
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            bags: indices.iter().map(|&i| self.bags[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    fn empty_like(&self) -> Self {
        Self {
            path: self.path.clone(),
            headers: self.headers.clone(),
            ids: Vec::new(),
            bags: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Reads a message CSV.
///
/// | Setting        | Default      |
/// |----------------|--------------|
/// | `id_column`    | `"id"`       |
/// | `bag_column`   | `"bag"`      |
/// | `delimiter`    | whitespace   |
///
/// Rows with an empty identifier are skipped with a warning.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingColumn`] | A configured column is absent |
/// | [`IoError::EmptyDataset`] | No row has an identifier |
#[derive(Debug, Clone)]
pub struct MessageReader {
    path: PathBuf,
    id_column: String,
    bag_column: String,
    delimiter: Option<String>,
}

impl MessageReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id_column: "id".to_string(),
            bag_column: "bag".to_string(),
            delimiter: None,
        }
    }

    /// Set the identifier column name.
    #[must_use]
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Set the bag column name.
    #[must_use]
    pub fn with_bag_column(mut self, name: impl Into<String>) -> Self {
        self.bag_column = name.into();
        self
    }

    /// Split bags on `delimiter` instead of whitespace.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Option<String>) -> Self {
        self.delimiter = delimiter.filter(|d| !d.is_empty());
        self
    }

    /// Read and validate the CSV file, returning a [`MessageTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<MessageTable, IoError> {
        let table = RawTable::read(&self.path)?;
        let id_col = table.column(&self.id_column)?;
        let bag_col = table.column(&self.bag_column)?;

        let mut ids = Vec::new();
        let mut bags = Vec::new();
        let mut rows = Vec::new();
        for (row_index, row) in table.rows.into_iter().enumerate() {
            let id = row[id_col].trim();
            if id.is_empty() {
                warn!(row_index, "skipping message with empty identifier");
                continue;
            }
            ids.push(MessageId::new(id.to_string()));
            bags.push(split_bag(&row[bag_col], self.delimiter.as_deref()));
            rows.push(row);
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_messages = ids.len(), "messages loaded");

        Ok(MessageTable {
            path: self.path.clone(),
            headers: table.headers,
            ids,
            bags,
            rows,
        })
    }
}
