use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use calliope_features::TrainingBundle;
use calliope_io::{
    CodeEvaluation, CodedTableReader, ExperimentName, KeywordTable, MessageReader, MessageTable,
    PredictionTable, Provenance, ResultWriter, TrainingReader, evaluate_codes, read_headers,
    shared_columns, widen_codes,
};
use calliope_model::{
    ClassifierSet, KeywordSpec, Penalty, SelectionConfig, TrainerConfig, UncertaintyReduction,
    WeightMode, random_sample, top_n,
};

#[derive(Parser)]
#[command(name = "calliope")]
#[command(about = "Multi-label message coding with keyword-augmented classifiers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Where a run writes its artifacts.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

/// Columns of a message table.
#[derive(Args, Debug, Clone)]
struct MessageArgs {
    /// Identifier column name
    #[arg(long, default_value = "id")]
    id_column: String,

    /// Feature bag column name
    #[arg(long, default_value = "bag")]
    bag_column: String,

    /// Separator between features in the bag column (whitespace if unset)
    #[arg(long)]
    delimiter: Option<String>,
}

/// Restricts which unlabelled messages are considered.
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Column used to restrict which unlabelled messages are considered
    #[arg(long, requires = "filter")]
    filter_column: Option<String>,

    /// Accepted values of the filter column
    #[arg(long, value_delimiter = ',', requires = "filter_column")]
    filter: Vec<String>,
}

/// A trained bundle and its classifiers.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Path to the training bundle written by `train`
    #[arg(long)]
    bundle: PathBuf,

    /// Path to the classifiers written by `train`
    #[arg(long)]
    model: PathBuf,
}

/// Solver and weighting parameters.
#[derive(Args, Debug, Clone)]
struct TrainingArgs {
    /// Coefficient penalty: "l1" or "l2"
    #[arg(long, default_value = "l2")]
    penalty: String,

    /// Inverse regularization strength
    #[arg(long, default_value_t = 1.0)]
    c: f64,

    /// Feature value of keyword pseudo-examples
    #[arg(long, default_value_t = 1.0)]
    keyword_strength: f64,

    /// Sample weight of keyword pseudo-examples
    #[arg(long, default_value_t = 1.0)]
    keyword_weight: f64,

    /// Class weighting: "balanced" or "smoothed"
    #[arg(long, default_value = "balanced")]
    weight_mode: String,

    /// Additive smoothing for smoothed class weights
    #[arg(long, default_value_t = 0.0)]
    smoothing: f64,

    /// Maximum solver epochs per code
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,

    /// Convergence tolerance on the largest coefficient change
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Train one classifier per code from a human-coded message table
    Train {
        /// Path to the long-format training CSV
        #[arg(long)]
        training: PathBuf,

        #[command(flatten)]
        columns: MessageArgs,

        /// Code columns (defaults to every column not otherwise used)
        #[arg(long, value_delimiter = ',')]
        codes: Vec<String>,

        /// Columns to exclude from the default code columns
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// JSON file mapping codes to keyword features
        #[arg(long)]
        keywords: Option<PathBuf>,

        #[command(flatten)]
        training_args: TrainingArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Predict codes for messages not in the training table
    Predict {
        #[command(flatten)]
        model: ModelArgs,

        /// Path to the messages CSV
        #[arg(long)]
        messages: PathBuf,

        #[command(flatten)]
        columns: MessageArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Name of the provenance column in the output table
        #[arg(long, default_value = "provenance")]
        provenance_column: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Pick the unlabelled messages the classifiers are least sure about
    Select {
        #[command(flatten)]
        model: ModelArgs,

        /// Path to the messages CSV
        #[arg(long)]
        messages: PathBuf,

        #[command(flatten)]
        columns: MessageArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of messages to select
        #[arg(long)]
        n: usize,

        /// Per-message reduction over codes: "min" or "mean"
        #[arg(long, default_value = "min")]
        reduction: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Draw a seeded random sample of machine-predicted rows for verification
    Sample {
        /// Path to a prediction table written by `predict`
        #[arg(long)]
        predictions: PathBuf,

        /// Identifier column name
        #[arg(long, default_value = "id")]
        id_column: String,

        /// Provenance column name
        #[arg(long, default_value = "provenance")]
        provenance_column: String,

        /// Number of rows to sample
        #[arg(long)]
        n: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Score predictions against a gold-standard coding
    Evaluate {
        /// Path to a prediction table written by `predict`
        #[arg(long)]
        predictions: PathBuf,

        /// Path to the gold-standard CSV
        #[arg(long)]
        gold: PathBuf,

        /// Identifier column name in the prediction table
        #[arg(long, default_value = "id")]
        id_column: String,

        /// Identifier column name in the gold table (defaults to --id-column)
        #[arg(long)]
        gold_id_column: Option<String>,

        /// Provenance column name in the prediction table
        #[arg(long, default_value = "provenance")]
        provenance_column: String,

        /// Codes to evaluate (defaults to every code column the tables share)
        #[arg(long, value_delimiter = ',')]
        codes: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Convert a manual coding sheet into a long-format training table
    Widen {
        /// Path to the coding sheet CSV
        #[arg(long)]
        input: PathBuf,

        /// Path of the long-format CSV to write
        #[arg(long)]
        output: PathBuf,

        /// Columns copied through unchanged
        #[arg(long, value_delimiter = ',', required = true)]
        keep: Vec<String>,

        /// Code names to look for in the sheet's cells
        #[arg(long, value_delimiter = ',', required = true)]
        codes: Vec<String>,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_messages: usize,
    n_features: usize,
    n_codes: usize,
    n_trained: usize,
    absent_codes: Vec<String>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_predicted: usize,
    n_training: usize,
    code_counts: Vec<CodeCountOutput>,
}

#[derive(Serialize)]
struct CodeCountOutput {
    code: String,
    count: usize,
}

#[derive(Serialize)]
struct SelectOutput {
    experiment: String,
    n_candidates: usize,
    n_selected: usize,
    reduction: String,
}

#[derive(Serialize)]
struct SampleOutput {
    experiment: String,
    n_candidates: usize,
    n_sampled: usize,
    seed: u64,
}

#[derive(Serialize)]
struct EvaluateOutput<'a> {
    experiment: String,
    codes: &'a [CodeEvaluation],
}

#[derive(Serialize)]
struct WidenOutput {
    output: PathBuf,
    n_rows: usize,
    code_counts: Vec<CodeCountOutput>,
}

fn trainer_config(args: &TrainingArgs) -> Result<TrainerConfig> {
    let penalty: Penalty = args.penalty.parse()?;
    let weight_mode: WeightMode = args.weight_mode.parse()?;
    Ok(TrainerConfig::new(penalty, args.c)?
        .with_keyword_strength(args.keyword_strength)
        .with_keyword_weight(args.keyword_weight)
        .with_weight_mode(weight_mode)
        .with_smoothing(args.smoothing)
        .with_max_iter(args.max_iter)
        .with_tol(args.tol))
}

fn message_reader(path: &Path, columns: &MessageArgs) -> MessageReader {
    MessageReader::new(path)
        .with_id_column(&columns.id_column)
        .with_bag_column(&columns.bag_column)
        .with_delimiter(columns.delimiter.clone())
}

fn load_model(args: &ModelArgs) -> Result<(TrainingBundle, ClassifierSet)> {
    let bundle = TrainingBundle::load(&args.bundle).context("failed to load training bundle")?;
    let classifiers = ClassifierSet::load(&args.model).context("failed to load classifiers")?;
    classifiers
        .ensure_compatible(bundle.code_names(), bundle.feature_index().len())
        .context("classifiers do not match the training bundle")?;
    info!(
        n_codes = classifiers.n_codes(),
        n_features = classifiers.n_features(),
        absent = classifiers.absent_codes().len(),
        "model loaded"
    );
    Ok((bundle, classifiers))
}

/// Split messages into those not yet coded and those in the training table.
///
/// The filter applies to the unlabelled side only; every training message
/// in the file is kept.
fn partition_messages(
    messages: MessageTable,
    bundle: &TrainingBundle,
    filter: &FilterArgs,
) -> Result<(MessageTable, MessageTable)> {
    let known: HashSet<&str> = bundle.message_ids().iter().map(String::as_str).collect();
    let (mut unlabelled, training) = messages.partition_known(&known);
    if let Some(column) = &filter.filter_column {
        unlabelled = unlabelled
            .retain_where(column, &filter.filter)
            .context("failed to filter messages")?;
        if unlabelled.is_empty() {
            warn!(column = %column, values = ?filter.filter, "filter left no unlabelled messages");
        }
    }
    info!(
        n_unlabelled = unlabelled.len(),
        n_training = training.len(),
        "messages partitioned"
    );
    Ok((unlabelled, training))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            training,
            columns,
            codes,
            ignore,
            keywords,
            training_args,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;
            let config = trainer_config(&training_args)?;

            // 1. Read the training table
            let mut reader = TrainingReader::new(&training)
                .with_id_column(&columns.id_column)
                .with_bag_column(&columns.bag_column)
                .with_delimiter(columns.delimiter.clone())
                .with_ignore_columns(ignore);
            if !codes.is_empty() {
                reader = reader.with_code_columns(codes);
            }
            let bundle = reader.read().context("failed to read training CSV")?;

            // 2. Resolve keywords against the bundle
            let keyword_spec = keywords
                .map(|path| {
                    KeywordTable::load(&path, bundle.code_names(), bundle.feature_index())
                        .map(|table| KeywordSpec::from_lists(table.to_lists(bundle.n_codes())))
                })
                .transpose()
                .context("failed to load keyword file")?;

            // 3. Train
            let result = config
                .fit_bundle(&bundle, keyword_spec.as_ref())
                .context("training failed")?;

            // 4. Persist bundle and classifiers
            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            bundle
                .save(writer.bundle_path())
                .context("failed to save training bundle")?;
            result
                .classifiers()
                .save(writer.model_path())
                .context("failed to save classifiers")?;
            info!(path = %writer.model_path().display(), "classifiers saved");

            let summaries: Vec<(String, usize, usize, bool)> = result
                .summaries()
                .iter()
                .zip(result.classifiers().slots())
                .map(|(s, slot)| (s.code_name.clone(), s.n_positive, s.n_keywords, slot.is_trained()))
                .collect();
            writer.write_train(bundle.n_messages(), bundle.feature_index().len(), &summaries)?;

            let metadata = result.metadata();
            let output = TrainOutput {
                experiment: output.experiment,
                n_messages: metadata.n_samples,
                n_features: metadata.n_features,
                n_codes: metadata.n_codes,
                n_trained: metadata.n_trained,
                absent_codes: result
                    .classifiers()
                    .absent_codes()
                    .into_iter()
                    .map(|i| bundle.code_names()[i].clone())
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            messages,
            columns,
            filter,
            provenance_column,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;

            // 1. Load model
            let (bundle, classifiers) = load_model(&model)?;

            // 2. Read messages, setting aside those already coded
            let table = message_reader(&messages, &columns)
                .read()
                .context("failed to read messages CSV")?;
            let (unlabelled, training_messages) = partition_messages(table, &bundle, &filter)?;

            // 3. Predict
            let rows = bundle.feature_index().vectorise(unlabelled.bags());
            let predictions = classifiers.predict(&rows).context("prediction failed")?;

            // 4. Assemble predicted and human-coded rows
            let assembled = PredictionTable::assemble(
                classifiers.code_names(),
                &unlabelled,
                &predictions,
                &training_messages,
                &bundle,
            )
            .context("failed to assemble prediction table")?;

            // 5. Write outputs
            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_prediction_table(&assembled, &provenance_column)?;

            let output = PredictOutput {
                experiment: output.experiment,
                n_predicted: assembled.count_with(Provenance::Prediction),
                n_training: assembled.count_with(Provenance::Training),
                code_counts: assembled
                    .code_names()
                    .iter()
                    .zip(assembled.code_counts())
                    .map(|(code, count)| CodeCountOutput {
                        code: code.clone(),
                        count,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Select {
            model,
            messages,
            columns,
            filter,
            n,
            reduction,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;
            let reduction: UncertaintyReduction = reduction.parse()?;

            // 1. Load model and candidates
            let (bundle, classifiers) = load_model(&model)?;
            let table = message_reader(&messages, &columns)
                .read()
                .context("failed to read messages CSV")?;
            let (unlabelled, _) = partition_messages(table, &bundle, &filter)?;
            if n > unlabelled.len() {
                warn!(n, available = unlabelled.len(), "fewer candidates than requested");
            }

            // 2. Score and rank
            let rows = bundle.feature_index().vectorise(unlabelled.bags());
            let selector = SelectionConfig::new().with_reduction(reduction);
            let scores = selector
                .score(classifiers.slots(), &rows)
                .context("uncertainty scoring failed")?;
            let chosen = top_n(&scores, n);
            let chosen_scores: Vec<f64> = chosen.iter().map(|&i| scores[i]).collect();

            // 3. Write the selection
            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_selection(&unlabelled.select(&chosen), &chosen_scores)?;

            let output = SelectOutput {
                experiment: output.experiment,
                n_candidates: unlabelled.len(),
                n_selected: chosen.len(),
                reduction: reduction.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Sample {
            predictions,
            id_column,
            provenance_column,
            n,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;

            let table = CodedTableReader::new(&predictions)
                .with_id_column(&id_column)
                .with_provenance_column(&provenance_column)
                .read()
                .context("failed to read prediction table")?;
            let pool = table.indices_with_provenance(Provenance::Prediction);
            if n > pool.len() {
                warn!(n, available = pool.len(), "fewer predicted rows than requested");
            }

            let chosen: Vec<usize> = random_sample(pool.len(), n, cli.seed)
                .into_iter()
                .map(|i| pool[i])
                .collect();

            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_sample(&table, &chosen)?;

            let output = SampleOutput {
                experiment: output.experiment,
                n_candidates: pool.len(),
                n_sampled: chosen.len(),
                seed: cli.seed,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            predictions,
            gold,
            id_column,
            gold_id_column,
            provenance_column,
            codes,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;
            let gold_id_column = gold_id_column.unwrap_or_else(|| id_column.clone());

            // 1. Decide which codes to score
            let codes = if codes.is_empty() {
                let shared = shared_columns(
                    &read_headers(&predictions).context("failed to read prediction headers")?,
                    &read_headers(&gold).context("failed to read gold headers")?,
                    &[
                        id_column.as_str(),
                        gold_id_column.as_str(),
                        provenance_column.as_str(),
                    ],
                );
                if shared.is_empty() {
                    anyhow::bail!("prediction and gold tables share no code columns");
                }
                shared
            } else {
                codes
            };
            info!(n_codes = codes.len(), "codes to evaluate");

            // 2. Read both tables
            let predicted = CodedTableReader::new(&predictions)
                .with_id_column(&id_column)
                .with_provenance_column(&provenance_column)
                .with_code_columns(codes.clone())
                .read()
                .context("failed to read prediction table")?;
            let gold_table = CodedTableReader::new(&gold)
                .with_id_column(&gold_id_column)
                .with_code_columns(codes.clone())
                .read()
                .context("failed to read gold CSV")?;

            // 3. Align and score
            let evaluations =
                evaluate_codes(&predicted, &gold_table, &codes).context("evaluation failed")?;

            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_evaluation(&predictions, &gold, &evaluations)?;

            let output = EvaluateOutput {
                experiment: output.experiment,
                codes: &evaluations,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Widen {
            input,
            output,
            keep,
            codes,
        } => {
            let summary = widen_codes(&input, &output, &keep, &codes)
                .context("failed to convert coding sheet")?;

            let output = WidenOutput {
                output,
                n_rows: summary.n_rows,
                code_counts: codes
                    .into_iter()
                    .zip(summary.code_counts)
                    .map(|(code, count)| CodeCountOutput { code, count })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
