//! Scoring whole tables against a learned model

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::error::PredictError;
use crate::pipeline::monitor::{row_fraction, ExecutionMonitor};
use crate::pipeline::table::{Cell, Row, RowSource};

use super::model::NaiveBayesModel;

/// Rows scored between two cancellation checks
const CHUNK_SIZE: usize = 1024;

pub const DEFAULT_PREDICTION_COLUMN: &str = "Prediction";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSettings {
    pub laplace_corrector: f64,
    /// Divide the per-class scores by their sum
    pub normalize: bool,
    pub include_probabilities: bool,
    pub prediction_column: String,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            laplace_corrector: 0.0,
            normalize: true,
            include_probabilities: false,
            prediction_column: DEFAULT_PREDICTION_COLUMN.to_string(),
        }
    }
}

/// Result for a single row
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_value: String,
    /// Per-class scores in `PredictionResult::class_values` order
    pub probabilities: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub class_values: Vec<String>,
    pub predictions: Vec<Prediction>,
}

/// Name of the output column holding the score of one class value
pub fn probability_column_name(class_column: &str, class_value: &str) -> String {
    format!("P({}={})", class_column, class_value)
}

/// Score every row of `source`.
///
/// Only columns the model can score are passed on; unknown or incompatible
/// columns are reported once and otherwise ignored. Rows are independent, so
/// each chunk of rows is scored in parallel.
pub fn predict_table(
    model: &NaiveBayesModel,
    source: &dyn RowSource,
    settings: &PredictorSettings,
    monitor: &dyn ExecutionMonitor,
) -> Result<PredictionResult, PredictError> {
    let spec = source.spec();
    let class_values = model.sorted_class_values()?;
    if class_values.is_empty() {
        return Err(PredictError::EmptyClassValues);
    }

    let unknown = model.unknown_columns(spec);
    let missing = model.missing_columns(spec);
    if !unknown.is_empty() {
        warn!(columns = ?unknown, "columns not used for prediction");
    }
    if !missing.is_empty() {
        warn!(columns = ?missing, "model attributes missing from input");
    }

    let used: Vec<usize> = (0..spec.len())
        .filter(|&i| {
            let column = spec.column(i);
            column.name != model.class_column() && !unknown.contains(&column.name)
        })
        .collect();
    let names: Vec<String> = used.iter().map(|&i| spec.column(i).name.clone()).collect();

    let score = |row: &Row| -> Result<Prediction, PredictError> {
        let cells: Vec<Cell> = used.iter().map(|&i| row.cell(i).clone()).collect();
        let class_value = model.most_likely_class(
            &names,
            &cells,
            &class_values,
            settings.laplace_corrector,
        )?;
        let probabilities = if settings.include_probabilities {
            Some(model.class_probabilities(
                &names,
                &cells,
                &class_values,
                settings.normalize,
                settings.laplace_corrector,
            )?)
        } else {
            None
        };
        Ok(Prediction {
            class_value,
            probabilities,
        })
    };

    let rows: Vec<&Row> = source.rows().collect();
    let mut predictions = Vec::with_capacity(rows.len());
    for (chunk_index, chunk) in rows.chunks(CHUNK_SIZE).enumerate() {
        monitor.check_canceled()?;
        monitor.set_progress(
            row_fraction(chunk_index * CHUNK_SIZE, rows.len()),
            "Scoring rows",
        );
        let scored = chunk
            .par_iter()
            .map(|row| score(*row))
            .collect::<Result<Vec<_>, _>>()?;
        predictions.extend(scored);
    }
    monitor.set_progress(1.0, "Rows scored");

    info!(rows = predictions.len(), attributes = names.len(), "rows scored");
    Ok(PredictionResult {
        class_values,
        predictions,
    })
}
