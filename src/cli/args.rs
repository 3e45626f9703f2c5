//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::bayes::{DEFAULT_MAX_NOMINAL_VALUES, DEFAULT_PREDICTION_COLUMN};
use crate::pipeline::correlation::DEFAULT_MAX_POSSIBLE_VALUES;

/// tabstat - Naive Bayes classification and correlation analysis for tabular data
#[derive(Parser, Debug)]
#[command(name = "tabstat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of rows to use for schema inference (CSV only).
    /// Higher values improve type detection for ambiguous columns but may be slower.
    #[arg(long, global = true, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Learn a Naive Bayes model from a dataset
    Learn(LearnArgs),

    /// Predict the class of every row with a learned model
    Predict(PredictArgs),

    /// Compute pairwise correlations (Pearson for numeric, Cramér's V for nominal pairs)
    Correlate(CorrelateArgs),

    /// Drop columns that are highly correlated with a kept column
    Filter(FilterArgs),
}

#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Class column name
    #[arg(short, long)]
    pub class_column: String,

    /// Model output path. Defaults to the input directory with a '_model.json' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of unique values per nominal column and class column.
    /// Nominal columns with more values are skipped; a class column with more values is an error.
    #[arg(long, default_value_t = DEFAULT_MAX_NOMINAL_VALUES)]
    pub max_nominal_values: usize,

    /// Skip missing values while learning and predicting.
    /// Rows with a missing class value are ignored instead of failing.
    #[arg(long, default_value = "false")]
    pub skip_missing: bool,

    /// Write the per-class statistics of the learned model as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Learned model file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_predicted' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Laplace corrector added to nominal counts (0 disables the correction)
    #[arg(long, default_value = "0.0", value_parser = validate_laplace_corrector)]
    pub laplace_corrector: f64,

    /// Append one probability column per class value
    #[arg(long, default_value = "false")]
    pub probabilities: bool,

    /// Report raw combined scores instead of normalized probabilities
    #[arg(long, default_value = "false")]
    pub no_normalize: bool,

    /// Name of the appended prediction column
    #[arg(long, default_value = DEFAULT_PREDICTION_COLUMN)]
    pub prediction_column: String,
}

#[derive(Args, Debug)]
pub struct CorrelateArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Columns to analyze (comma-separated). Defaults to all numeric and nominal columns.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Nominal columns with more distinct values (missing included) are not correlated
    #[arg(long, default_value_t = DEFAULT_MAX_POSSIBLE_VALUES)]
    pub max_possible_values: usize,

    /// Matrix output path. Defaults to the input directory with a '_correlation.json' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Correlation threshold for reporting pairs and the reduced column set
    #[arg(long, default_value = "0.9", value_parser = validate_threshold)]
    pub threshold: f64,

    /// Write a JSON report of the analysis to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Saved correlation matrix. Computed from the input when omitted.
    #[arg(long)]
    pub matrix: Option<PathBuf>,

    /// Nominal value cap used when the matrix is computed from the input
    #[arg(long, default_value_t = DEFAULT_MAX_POSSIBLE_VALUES)]
    pub max_possible_values: usize,

    /// Correlation threshold above which one column of a pair is dropped
    #[arg(long, default_value = "0.9", value_parser = validate_threshold)]
    pub threshold: f64,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_reduced' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

/// Path next to `input` with `suffix` appended to its stem.
/// `extension` defaults to the input's own extension.
pub fn derived_path(input: &Path, suffix: &str, extension: Option<&str>) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = extension
        .or_else(|| input.extension().and_then(|e| e.to_str()))
        .unwrap_or("parquet");
    parent.join(format!("{}{}.{}", stem, suffix, extension))
}

impl LearnArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_model", Some("json")))
    }
}

impl PredictArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_predicted", None))
    }
}

impl CorrelateArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_correlation", Some("json")))
    }
}

impl FilterArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_reduced", None))
    }
}

/// Validator for correlation thresholds
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("threshold must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for the Laplace corrector
fn validate_laplace_corrector(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !value.is_finite() || value < 0.0 {
        Err(format!(
            "laplace_corrector must be a non-negative number, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
