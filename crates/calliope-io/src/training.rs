//! Long-format training tables: one row per message, one 0/1 column per code.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calliope_features::{FeatureIndex, TrainingBundle};
use tracing::{info, instrument, warn};

use crate::IoError;
use crate::domain::parse_code_cell;
use crate::messages::split_bag;
use crate::table::RawTable;

/// Reads a long training CSV into a [`TrainingBundle`].
///
/// | Setting          | Default                                     |
/// |------------------|---------------------------------------------|
/// | `id_column`      | `"id"`                                      |
/// | `bag_column`     | `"bag"`                                     |
/// | `delimiter`      | whitespace                                  |
/// | `code_columns`   | every column not otherwise named or ignored |
/// | `ignore_columns` | none                                        |
///
/// Rows with an empty identifier are skipped; a repeated identifier keeps
/// its first row. Both cases are logged at `warn`.
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
/// | [`IoError::EmptyDataset`] | No usable rows |
/// | [`IoError::InvalidBundle`] | The assembled bundle fails validation |
#[derive(Debug, Clone)]
pub struct TrainingReader {
    path: PathBuf,
    id_column: String,
    bag_column: String,
    delimiter: Option<String>,
    code_columns: Vec<String>,
    ignore_columns: Vec<String>,
}

impl TrainingReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            id_column: "id".to_string(),
            bag_column: "bag".to_string(),
            delimiter: None,
            code_columns: Vec::new(),
            ignore_columns: Vec::new(),
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

    /// Use exactly these code columns, in this order.
    #[must_use]
    pub fn with_code_columns(mut self, columns: Vec<String>) -> Self {
        self.code_columns = columns;
        self
    }

    /// Exclude these columns when code columns are inferred.
    #[must_use]
    pub fn with_ignore_columns(mut self, columns: Vec<String>) -> Self {
        self.ignore_columns = columns;
        self
    }

    /// Read the CSV file and assemble a [`TrainingBundle`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<TrainingBundle, IoError> {
        let table = RawTable::read(&self.path)?;
        let id_col = table.column(&self.id_column)?;
        let bag_col = table.column(&self.bag_column)?;

        let code_names = if self.code_columns.is_empty() {
            let mut exclude = vec![self.id_column.as_str(), self.bag_column.as_str()];
            exclude.extend(self.ignore_columns.iter().map(String::as_str));
            table.other_columns(&exclude)
        } else {
            self.code_columns.clone()
        };
        let code_cols = code_names
            .iter()
            .map(|name| table.column(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut message_ids = Vec::new();
        let mut bags = Vec::new();
        let mut labels = Vec::new();
        for (row_index, row) in table.rows.iter().enumerate() {
            let id = row[id_col].trim();
            if id.is_empty() {
                warn!(row_index, "skipping training row with empty identifier");
                continue;
            }
            if !seen.insert(id.to_string()) {
                warn!(row_index, id, "duplicate training identifier, keeping first row");
                continue;
            }
            let codes = code_cols
                .iter()
                .zip(&code_names)
                .map(|(&col, name)| {
                    parse_code_cell(&row[col]).ok_or_else(|| IoError::InvalidCodeValue {
                        path: self.path.clone(),
                        row_index,
                        column: name.clone(),
                        raw: row[col].clone(),
                    })
                })
                .collect::<Result<Vec<bool>, _>>()?;

            message_ids.push(id.to_string());
            bags.push(split_bag(&row[bag_col], self.delimiter.as_deref()));
            labels.push(codes);
        }

        if message_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let feature_index = FeatureIndex::from_bags(&bags);
        let features = feature_index.vectorise(&bags);

        info!(
            n_messages = message_ids.len(),
            n_features = feature_index.len(),
            n_codes = code_names.len(),
            "training table loaded"
        );

        TrainingBundle::new(message_ids, feature_index, code_names, features, labels).map_err(
            |e| IoError::InvalidBundle {
                path: self.path.clone(),
                source: e,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::write_csv;

    #[test]
    fn infers_code_columns() {
        let f = write_csv("id,text,bag,Net,Spray\n1,hi,net net,1,\n2,yo,spray,,1\n3,ok,rain,0,0\n");
        let bundle = TrainingReader::new(f.path())
            .with_ignore_columns(vec!["text".into()])
            .read()
            .unwrap();
        assert_eq!(bundle.code_names(), &["Net".to_string(), "Spray".to_string()]);
        assert_eq!(bundle.n_messages(), 3);
        assert_eq!(bundle.labels()[0], vec![true, false]);
        assert_eq!(bundle.labels()[1], vec![false, true]);
        assert_eq!(bundle.labels()[2], vec![false, false]);
        assert_eq!(bundle.feature_index().len(), 3);
        let net = bundle.feature_index().index_of("net").unwrap();
        assert_eq!(bundle.features()[0][net], 2.0);
        assert_eq!(bundle.code_frequencies(), vec![1, 1]);
    }

    #[test]
    fn explicit_code_columns_and_order() {
        let f = write_csv("id,bag,A,B\n1,x,1,0\n2,y,0,1\n");
        let bundle = TrainingReader::new(f.path())
            .with_code_columns(vec!["B".into(), "A".into()])
            .read()
            .unwrap();
        assert_eq!(bundle.code_names(), &["B".to_string(), "A".to_string()]);
        assert_eq!(bundle.labels()[0], vec![false, true]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let f = write_csv("id,bag,A\n1,x,1\n1,y,0\n2,z,0\n");
        let bundle = TrainingReader::new(f.path()).read().unwrap();
        assert_eq!(bundle.message_ids(), &["1".to_string(), "2".to_string()]);
        assert_eq!(bundle.labels()[0], vec![true]);
    }

    #[test]
    fn invalid_code_value() {
        let f = write_csv("id,bag,A\n1,x,maybe\n");
        let err = TrainingReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidCodeValue { row_index: 0, ref raw, .. } if raw == "maybe"
        ));
    }

    #[test]
    fn unknown_code_column() {
        let f = write_csv("id,bag,A\n1,x,1\n");
        let err = TrainingReader::new(f.path())
            .with_code_columns(vec!["Z".into()])
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_csv("id,bag,A\n");
        let err = TrainingReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }
}
