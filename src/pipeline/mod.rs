//! Pipeline module - tables, learners and correlation analysis

pub mod bayes;
pub mod correlation;
pub mod error;
pub mod loader;
pub mod monitor;
pub mod settings;
pub mod table;

pub use bayes::{
    predict_table, LearnerSettings, NaiveBayesModel, PredictionResult, PredictorSettings,
};
pub use correlation::{
    compute_correlations, CorrelatedPair, CorrelationMatrix, CorrelationResult,
    CorrelationSettings,
};
pub use error::*;
pub use loader::*;
pub use monitor::{CancelFlag, ExecutionMonitor, NoopMonitor, SubProgress};
pub use settings::ConfigNode;
pub use table::{Cell, ColumnKind, ColumnSpec, InMemoryTable, Row, RowSource, TableSpec};
