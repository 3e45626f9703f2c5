//! JSON report export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::bayes::{NaiveBayesModel, StatisticsRow};
use crate::pipeline::correlation::CorrelatedPair;

use super::CorrelationSummary;

/// Metadata about the analysis run
#[derive(Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    pub tabstat_version: String,
    pub input_file: String,
}

impl ReportMetadata {
    pub fn new(input_file: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            tabstat_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ClassPrior {
    pub class_value: String,
    pub prior: f64,
}

#[derive(Serialize)]
pub struct SkippedAttribute {
    pub attribute: String,
    pub cause: String,
}

/// Learned model statistics with metadata
#[derive(Serialize)]
pub struct ModelReport {
    pub metadata: ReportMetadata,
    pub class_column: String,
    pub total_rows: usize,
    pub class_priors: Vec<ClassPrior>,
    pub skipped_attributes: Vec<SkippedAttribute>,
    pub statistics: Vec<StatisticsRow>,
}

/// Correlation analysis results with metadata
#[derive(Serialize)]
pub struct CorrelationReport<'a> {
    pub metadata: ReportMetadata,
    pub threshold: f64,
    pub analyzed_columns: usize,
    pub correlated_pairs: &'a [CorrelatedPair],
    pub constant_columns: &'a [String],
    pub too_many_values: &'a [String],
    pub kept_columns: &'a [String],
    pub dropped_columns: &'a [String],
}

fn write_json<T: Serialize>(value: &T, output_path: &Path, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write {} to {}", what, output_path.display()))?;

    Ok(())
}

/// Build the report of a learned model
pub fn model_report(model: &NaiveBayesModel, input_file: &str) -> ModelReport {
    let class_priors = model
        .sorted_class_values()
        .unwrap_or_default()
        .into_iter()
        .map(|class_value| {
            let prior = model.class_prior_probability(&class_value).unwrap_or(0.0);
            ClassPrior { class_value, prior }
        })
        .collect();

    ModelReport {
        metadata: ReportMetadata::new(input_file),
        class_column: model.class_column().to_string(),
        total_rows: model.total_rows(),
        class_priors,
        skipped_attributes: model
            .skipped_attributes()
            .iter()
            .map(|m| SkippedAttribute {
                attribute: m.name().to_string(),
                cause: m.invalid_cause().unwrap_or_default().to_string(),
            })
            .collect(),
        statistics: model.statistics_rows(),
    }
}

/// Export the statistics of a learned model to a JSON file
pub fn export_model_report(
    model: &NaiveBayesModel,
    input_file: &str,
    output_path: &Path,
) -> Result<()> {
    write_json(&model_report(model, input_file), output_path, "model report")
}

/// Export a correlation summary to a JSON file
pub fn export_correlation_report(
    summary: &CorrelationSummary,
    input_file: &str,
    output_path: &Path,
) -> Result<()> {
    let report = CorrelationReport {
        metadata: ReportMetadata::new(input_file),
        threshold: summary.threshold,
        analyzed_columns: summary.analyzed_columns,
        correlated_pairs: &summary.correlated_pairs,
        constant_columns: &summary.constant_columns,
        too_many_values: &summary.too_many_values,
        kept_columns: &summary.kept_columns,
        dropped_columns: &summary.dropped_columns,
    };
    write_json(&report, output_path, "correlation report")
}
