//! Pairwise correlation of numeric and nominal columns and correlation-based
//! column reduction

pub mod calculator;
pub mod matrix;

pub use calculator::{
    cramers_v, CorrelationDiagnostics, CorrelationResult, CorrelationSettings, PairwiseStatistics,
    PmccCalculator, DEFAULT_MAX_POSSIBLE_VALUES,
};
pub use matrix::{CorrelatedPair, CorrelationMatrix, HalfMatrix, ROUND_ERROR_OK};

use crate::pipeline::error::CorrelationError;
use crate::pipeline::monitor::ExecutionMonitor;
use crate::pipeline::table::RowSource;

/// Correlate the selected columns of `source` in two passes
pub fn compute_correlations(
    source: &dyn RowSource,
    settings: &CorrelationSettings,
    monitor: &dyn ExecutionMonitor,
) -> Result<CorrelationResult, CorrelationError> {
    PmccCalculator::new(source.spec(), settings)?.calculate(source, monitor)
}
