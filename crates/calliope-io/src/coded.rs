//! Coded tables: identifier, optional provenance, and 0/1/empty code columns.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::IoError;
use crate::domain::{MessageId, Provenance, parse_code_cell};
use crate::table::RawTable;

/// One row of a coded table, with named fields resolved at load time.
#[derive(Debug, Clone)]
pub struct CodedRecord {
    /// Message identifier.
    pub id: MessageId,
    /// Provenance tag, `None` when the table has no provenance column or the cell is empty.
    pub provenance: Option<Provenance>,
    /// One value per code column, in [`CodedTable::code_names`] order. Missing values are `false`.
    pub codes: Vec<bool>,
    /// Original cell contents.
    pub fields: Vec<String>,
}

/// A prediction or gold-standard table.
#[derive(Debug, Clone)]
pub struct CodedTable {
    path: PathBuf,
    headers: Vec<String>,
    code_names: Vec<String>,
    records: Vec<CodedRecord>,
}

impl CodedTable {
    /// Return the file this table was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the CSV header.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the code columns that were parsed.
    #[must_use]
    pub fn code_names(&self) -> &[String] {
        &self.code_names
    }

    /// Return the records in file order.
    #[must_use]
    pub fn records(&self) -> &[CodedRecord] {
        &self.records
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `code` among the parsed code columns.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] when `code` was not parsed.
    pub fn code_index(&self, code: &str) -> Result<usize, IoError> {
        self.code_names
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: code.to_string(),
            })
    }

    /// Indices of records with the given provenance, in file order.
    #[must_use]
    pub fn indices_with_provenance(&self, provenance: Provenance) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.provenance == Some(provenance))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Reads a coded CSV table.
///
/// | Setting             | Default |
/// |---------------------|---------|
/// | `id_column`         | `"id"`  |
/// | `provenance_column` | none    |
/// | `code_columns`      | none    |
///
/// Rows with an empty identifier are skipped with a warning. Duplicate
/// identifiers are kept; deduplication belongs to alignment.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingColumn`] | A configured column is absent |
/// | [`IoError::InvalidCodeValue`] | A code cell is not empty, numeric, or boolean |
/// | [`IoError::UnknownProvenance`] | A provenance cell is not a recognised tag |
#[derive(Debug, Clone)]
pub struct CodedTableReader {
    path: PathBuf,
    id_column: String,
    provenance_column: Option<String>,
    code_columns: Vec<String>,
}

impl CodedTableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id_column: "id".to_string(),
            provenance_column: None,
            code_columns: Vec::new(),
        }
    }

    /// Set the identifier column name.
    #[must_use]
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Read provenance tags from this column.
    #[must_use]
    pub fn with_provenance_column(mut self, name: impl Into<String>) -> Self {
        self.provenance_column = Some(name.into());
        self
    }

    /// Parse these columns as codes.
    #[must_use]
    pub fn with_code_columns(mut self, columns: Vec<String>) -> Self {
        self.code_columns = columns;
        self
    }

    /// Read and validate the CSV file, returning a [`CodedTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<CodedTable, IoError> {
        let table = RawTable::read(&self.path)?;
        let id_col = table.column(&self.id_column)?;
        let provenance_col = match &self.provenance_column {
            Some(name) => Some(table.column(name)?),
            None => None,
        };
        let code_cols = self
            .code_columns
            .iter()
            .map(|name| table.column(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (row_index, row) in table.rows.into_iter().enumerate() {
            let id = row[id_col].trim();
            if id.is_empty() {
                warn!(row_index, "skipping coded row with empty identifier");
                continue;
            }
            let provenance = match provenance_col {
                Some(col) => Provenance::parse(&row[col]).map_err(|()| {
                    IoError::UnknownProvenance {
                        path: self.path.clone(),
                        row_index,
                        raw: row[col].clone(),
                    }
                })?,
                None => None,
            };
            let codes = code_cols
                .iter()
                .zip(&self.code_columns)
                .map(|(&col, name)| {
                    parse_code_cell(&row[col]).ok_or_else(|| IoError::InvalidCodeValue {
                        path: self.path.clone(),
                        row_index,
                        column: name.clone(),
                        raw: row[col].clone(),
                    })
                })
                .collect::<Result<Vec<bool>, _>>()?;
            records.push(CodedRecord {
                id: MessageId::new(id.to_string()),
                provenance,
                codes,
                fields: row,
            });
        }

        info!(
            n_records = records.len(),
            n_codes = self.code_columns.len(),
            "coded table loaded"
        );

        Ok(CodedTable {
            path: self.path.clone(),
            headers: table.headers,
            code_names: self.code_columns.clone(),
            records,
        })
    }
}
