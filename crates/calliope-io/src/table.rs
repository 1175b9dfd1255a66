//! Header-addressed CSV tables shared by the typed readers.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::IoError;

/// A fully materialised CSV file: header plus string rows of equal width.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub(crate) path: PathBuf,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read a CSV file, checking that every row matches the header width.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
    /// | [`IoError::CsvParse`] | Malformed CSV record |
    /// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
    #[instrument(skip_all, fields(path = %path.display()))]
    pub(crate) fn read(path: &Path) -> Result<Self, IoError> {
        let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;

        // flexible(true) so that InconsistentRowLength fires instead of CsvParse.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| csv_parse(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        debug!(n_columns = headers.len(), "read CSV header");

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_parse(path, e))?;
            if record.len() != headers.len() {
                return Err(IoError::InconsistentRowLength {
                    path: path.to_path_buf(),
                    row_index,
                    expected: headers.len(),
                    got: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Index of a named column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] when the header has no such column.
    pub(crate) fn column(&self, name: &str) -> Result<usize, IoError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Every header not listed in `exclude`, in file order.
    pub(crate) fn other_columns(&self, exclude: &[&str]) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| !exclude.contains(&h.as_str()))
            .cloned()
            .collect()
    }
}

fn csv_parse(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

/// Read only the header row of a CSV file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] or [`IoError::CsvParse`].
pub fn read_headers(path: &Path) -> Result<Vec<String>, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = rdr.headers().map_err(|e| csv_parse(path, e))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}
