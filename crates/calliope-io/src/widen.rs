//! Conversion of manual coding sheets to long format.
//!
//! A manual sheet records codes as cell values in free columns (`code_1`,
//! `code_2`, ...). The long format has one column per code holding `1` or
//! an empty cell, which is what [`TrainingReader`](crate::TrainingReader)
//! expects.

use std::path::Path;

use tracing::{info, instrument};

use crate::IoError;
use crate::table::RawTable;
use crate::writer::{csv_writer, flush, write_record};

/// Per-code counts from a conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WidenSummary {
    /// Rows written.
    pub n_rows: usize,
    /// Rows on which each code was found, in code order.
    pub code_counts: Vec<usize>,
}

/// Rewrite `input` as a long table at `output`.
///
/// The output holds the `keep` columns followed by one column per code. A
/// code is marked on a row when any cell of that row, compared after
/// trimming, equals the code name.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | Input doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingColumn`] | A `keep` column is absent |
/// | [`IoError::WriteFile`] / [`IoError::CsvWrite`] | Output cannot be written |
#[instrument(skip(keep, codes), fields(input = %input.display(), output = %output.display()))]
pub fn widen_codes(
    input: &Path,
    output: &Path,
    keep: &[String],
    codes: &[String],
) -> Result<WidenSummary, IoError> {
    let table = RawTable::read(input)?;
    let keep_cols = keep
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let wanted: Vec<&str> = codes.iter().map(|c| c.trim()).collect();

    let mut wtr = csv_writer(output)?;
    let header: Vec<&str> = keep
        .iter()
        .chain(codes)
        .map(String::as_str)
        .collect();
    write_record(&mut wtr, output, &header)?;

    let mut code_counts = vec![0usize; codes.len()];
    for row in &table.rows {
        let mut record: Vec<&str> = keep_cols.iter().map(|&c| row[c].as_str()).collect();
        for (k, code) in wanted.iter().enumerate() {
            let present = row.iter().any(|cell| cell.trim() == *code);
            code_counts[k] += usize::from(present);
            record.push(if present { "1" } else { "" });
        }
        write_record(&mut wtr, output, &record)?;
    }
    flush(wtr, output)?;

    info!(n_rows = table.rows.len(), "coding sheet converted");
    Ok(WidenSummary {
        n_rows: table.rows.len(),
        code_counts,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::table::test_support::write_csv;

    #[test]
    fn marks_codes_found_in_any_cell() {
        let input = write_csv(
            "ID,text,code_1,code_2\n1,hi,Net,\n2,yo,Spray ,Net\n3,ok,,\n",
        );
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("long.csv");
        let summary = widen_codes(
            input.path(),
            &output,
            &["ID".into(), "text".into()],
            &["Net".into(), "Spray".into(), "Other".into()],
        )
        .unwrap();
        assert_eq!(summary.n_rows, 3);
        assert_eq!(summary.code_counts, vec![2, 1, 0]);
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            "ID,text,Net,Spray,Other\n1,hi,1,,\n2,yo,1,1,\n3,ok,,,\n"
        );
    }

    #[test]
    fn missing_keep_column() {
        let input = write_csv("ID,code_1\n1,Net\n");
        let dir = TempDir::new().unwrap();
        let err = widen_codes(
            input.path(),
            &dir.path().join("out.csv"),
            &["phone".into()],
            &["Net".into()],
        )
        .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }
}
