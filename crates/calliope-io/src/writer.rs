//! JSON result artifacts and CSV table writers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::assemble::PredictionTable;
use crate::coded::CodedTable;
use crate::domain::ExperimentName;
use crate::evaluate::CodeEvaluation;
use crate::messages::MessageTable;

/// Writes run artifacts into one directory, named after the experiment.
///
/// | Artifact                       | Written by                                  |
/// |--------------------------------|---------------------------------------------|
/// | `{experiment}_bundle.bin`      | caller, at [`ResultWriter::bundle_path`]    |
/// | `{experiment}_classifiers.bin` | caller, at [`ResultWriter::model_path`]     |
/// | `{experiment}_train.json`      | [`ResultWriter::write_train`]               |
/// | `{experiment}_predictions.csv` | [`ResultWriter::write_prediction_table`]    |
/// | `{experiment}_predict.json`    | [`ResultWriter::write_prediction_table`]    |
/// | `{experiment}_selection.csv`   | [`ResultWriter::write_selection`]           |
/// | `{experiment}_sample.csv`      | [`ResultWriter::write_sample`]              |
/// | `{experiment}_evaluate.json`   | [`ResultWriter::write_evaluation`]          |
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    /// Path where the training bundle should be saved.
    #[must_use]
    pub fn bundle_path(&self) -> PathBuf {
        self.artifact_path("bundle.bin")
    }

    /// Path where the classifier set should be saved.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_path("classifiers.bin")
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).expect("serialization cannot fail");
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write a training summary to `{experiment}_train.json`.
    ///
    /// Each code entry is `(name, n_positive, n_keywords, trained)`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_train(
        &self,
        n_messages: usize,
        n_features: usize,
        codes: &[(String, usize, usize, bool)],
    ) -> Result<(), IoError> {
        let path = self.artifact_path("train.json");
        let entries: Vec<TrainCodeEntry> = codes
            .iter()
            .map(|(name, n_positive, n_keywords, trained)| TrainCodeEntry {
                code: name.as_str(),
                n_positive: *n_positive,
                n_keywords: *n_keywords,
                trained: *trained,
            })
            .collect();
        let artifact = TrainArtifact {
            experiment: self.experiment.as_str(),
            n_messages,
            n_features,
            n_codes: codes.len(),
            n_absent: codes.iter().filter(|c| !c.3).count(),
            codes: entries,
        };
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "training summary written");
        Ok(())
    }

    /// Write the prediction table to `{experiment}_predictions.csv` and its
    /// per-code totals to `{experiment}_predict.json`.
    ///
    /// Codes are written as `1` or an empty cell; `provenance_column` names
    /// the trailing provenance column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] or [`IoError::CsvWrite`] if a file cannot be written.
    #[instrument(skip_all, fields(n_rows = table.rows().len()))]
    pub fn write_prediction_table(
        &self,
        table: &PredictionTable,
        provenance_column: &str,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predictions.csv");
        let mut wtr = csv_writer(&path)?;

        let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
        header.extend(table.code_names().iter().map(String::as_str));
        header.push(provenance_column);
        write_record(&mut wtr, &path, &header)?;

        for row in table.rows() {
            let mut record: Vec<&str> = row.fields.iter().map(String::as_str).collect();
            record.extend(row.codes.iter().map(|&c| if c { "1" } else { "" }));
            record.push(row.provenance.as_str());
            write_record(&mut wtr, &path, &record)?;
        }
        flush(wtr, &path)?;
        info!(path = %path.display(), "prediction table written");

        let counts = table.code_counts();
        let json_path = self.artifact_path("predict.json");
        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_predicted: table.count_with(crate::Provenance::Prediction),
            n_training: table.count_with(crate::Provenance::Training),
            code_counts: table
                .code_names()
                .iter()
                .zip(&counts)
                .map(|(code, &count)| CodeCount {
                    code: code.as_str(),
                    count,
                })
                .collect(),
        };
        self.write_json(&json_path, &artifact)?;
        info!(path = %json_path.display(), "prediction summary written");
        Ok(path)
    }

    /// Write selected messages with their uncertainty scores to `{experiment}_selection.csv`.
    ///
    /// `scores[i]` belongs to `messages` row `i`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] or [`IoError::CsvWrite`] if the file cannot be written.
    #[instrument(skip_all, fields(n_rows = messages.len()))]
    pub fn write_selection(
        &self,
        messages: &MessageTable,
        scores: &[f64],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("selection.csv");
        let mut wtr = csv_writer(&path)?;

        let mut header: Vec<&str> = messages.headers().iter().map(String::as_str).collect();
        header.push("uncertainty");
        write_record(&mut wtr, &path, &header)?;

        for (row, score) in messages.rows().iter().zip(scores) {
            let score = score.to_string();
            let mut record: Vec<&str> = row.iter().map(String::as_str).collect();
            record.push(&score);
            write_record(&mut wtr, &path, &record)?;
        }
        flush(wtr, &path)?;
        info!(path = %path.display(), "selection written");
        Ok(path)
    }

    /// Write the rows of `table` at `indices`, unchanged, to `{experiment}_sample.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] or [`IoError::CsvWrite`] if the file cannot be written.
    #[instrument(skip_all, fields(n_rows = indices.len()))]
    pub fn write_sample(&self, table: &CodedTable, indices: &[usize]) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("sample.csv");
        let mut wtr = csv_writer(&path)?;
        write_record(&mut wtr, &path, table.headers())?;
        for &i in indices {
            write_record(&mut wtr, &path, &table.records()[i].fields)?;
        }
        flush(wtr, &path)?;
        info!(path = %path.display(), "sample written");
        Ok(path)
    }

    /// Write evaluation results to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        predictions: &Path,
        gold: &Path,
        evaluations: &[CodeEvaluation],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("evaluate.json");
        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            predictions: predictions.display().to_string(),
            gold: gold.display().to_string(),
            n_codes: evaluations.len(),
            codes: evaluations,
        };
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }
}

pub(crate) fn csv_writer(path: &Path) -> Result<csv::Writer<fs::File>, IoError> {
    let file = fs::File::create(path).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(file))
}

pub(crate) fn write_record<I, T>(
    wtr: &mut csv::Writer<fs::File>,
    path: &Path,
    record: I,
) -> Result<(), IoError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    wtr.write_record(record).map_err(|e| IoError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn flush(mut wtr: csv::Writer<fs::File>, path: &Path) -> Result<(), IoError> {
    wtr.flush().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TrainArtifact<'a> {
    experiment: &'a str,
    n_messages: usize,
    n_features: usize,
    n_codes: usize,
    n_absent: usize,
    codes: Vec<TrainCodeEntry<'a>>,
}

#[derive(Serialize)]
struct TrainCodeEntry<'a> {
    code: &'a str,
    n_positive: usize,
    n_keywords: usize,
    trained: bool,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_predicted: usize,
    n_training: usize,
    code_counts: Vec<CodeCount<'a>>,
}

#[derive(Serialize)]
struct CodeCount<'a> {
    code: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    predictions: String,
    gold: String,
    n_codes: usize,
    codes: &'a [CodeEvaluation],
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use calliope_features::{FeatureIndex, TrainingBundle};
    use tempfile::TempDir;

    use super::*;
    use crate::coded::CodedTableReader;
    use crate::evaluate::align_and_evaluate;
    use crate::messages::MessageReader;
    use crate::table::test_support::{read_pair, write_csv};

    fn writer(dir: &TempDir) -> ResultWriter {
        ResultWriter::new(dir.path(), ExperimentName::new("wash".into()).unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let w = ResultWriter::new(&nested, ExperimentName::new("x".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(w.model_path(), nested.join("x_classifiers.bin"));
        assert_eq!(w.bundle_path(), nested.join("x_bundle.bin"));
    }

    #[test]
    fn train_summary_json() {
        let dir = TempDir::new().unwrap();
        writer(&dir)
            .write_train(
                10,
                4,
                &[("Net".into(), 3, 2, true), ("Never".into(), 0, 0, false)],
            )
            .unwrap();
        let content: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("wash_train.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(content["n_absent"], 1);
        assert_eq!(content["codes"][0]["code"], "Net");
        assert_eq!(content["codes"][1]["trained"], false);
    }

    #[test]
    fn prediction_table_csv_and_json() {
        let dir = TempDir::new().unwrap();
        let f = write_csv("id,text,bag\nm1,\"hello, world\",net\nt1,bye,spray\n");
        let messages = MessageReader::new(f.path()).read().unwrap();
        let known: HashSet<&str> = ["t1"].into_iter().collect();
        let (unknown, seen) = messages.partition_known(&known);
        let bundle = TrainingBundle::new(
            vec!["t1".into()],
            FeatureIndex::from_names(["spray"]),
            vec!["Net".into()],
            vec![vec![1.0]],
            vec![vec![true]],
        )
        .unwrap();
        let table = PredictionTable::assemble(
            &["Net".to_string()],
            &unknown,
            &[vec![false]],
            &seen,
            &bundle,
        )
        .unwrap();

        let path = writer(&dir).write_prediction_table(&table, "source").unwrap();

        let reread = CodedTableReader::new(&path)
            .with_provenance_column("source")
            .with_code_columns(vec!["Net".into()])
            .read()
            .unwrap();
        assert_eq!(reread.headers(), &["id", "text", "bag", "Net", "source"]);
        assert_eq!(reread.records()[0].fields[1], "hello, world");
        assert_eq!(reread.records()[0].fields[3], "");
        assert_eq!(reread.records()[1].provenance, Some(crate::Provenance::Training));
        assert!(reread.records()[1].codes[0]);

        let summary: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("wash_predict.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["n_predicted"], 1);
        assert_eq!(summary["n_training"], 1);
        assert_eq!(summary["code_counts"][0]["count"], 1);
    }

    #[test]
    fn selection_appends_scores() {
        let dir = TempDir::new().unwrap();
        let f = write_csv("id,bag\nm1,a\nm2,b\n");
        let messages = MessageReader::new(f.path()).read().unwrap();
        let picked = messages.select(&[1]);
        let path = writer(&dir).write_selection(&picked, &[0.125]).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "id,bag,uncertainty\nm2,b,0.125\n");
    }

    #[test]
    fn sample_copies_rows_verbatim() {
        let dir = TempDir::new().unwrap();
        let f = write_csv("id,text,source\n1,a,prediction\n2,b,training\n3,c,prediction\n");
        let table = CodedTableReader::new(f.path()).read().unwrap();
        let path = writer(&dir).write_sample(&table, &[2, 0]).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "id,text,source\n3,c,prediction\n1,a,prediction\n");
    }

    #[test]
    fn evaluation_json() {
        let dir = TempDir::new().unwrap();
        let (p, g) = read_pair(
            "ID,code,source\n2,0,prediction\n3,1,prediction\n",
            "ID,code\n2,0\n3,1\n",
        );
        let eval = align_and_evaluate(&p, &g, "code").unwrap();
        writer(&dir)
            .write_evaluation(Path::new("p.csv"), Path::new("g.csv"), &[eval])
            .unwrap();
        let content: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("wash_evaluate.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(content["experiment"], "wash");
        assert_eq!(content["codes"][0]["code"], "code");
        assert_eq!(content["codes"][0]["verified_count"], 2);
        assert_eq!(content["codes"][0]["confusion"]["true_positive"], 1);
        assert!((content["codes"][0]["f1"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
    }
}
