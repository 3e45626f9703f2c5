//! Naive Bayes learning and scoring

pub mod attribute;
pub mod class;
pub mod model;
pub mod nominal;
pub mod numerical;
pub mod predictor;

pub use attribute::{AttributeKind, AttributeModel, ModelState};
pub use class::ClassModel;
pub use model::{LearnerSettings, NaiveBayesModel, StatisticsRow, DEFAULT_MAX_NOMINAL_VALUES};
pub use nominal::{NominalClassValue, NominalModel};
pub use numerical::{Gaussian, NumericalModel, SufficientStats};
pub use predictor::{
    predict_table, probability_column_name, Prediction, PredictionResult, PredictorSettings,
    DEFAULT_PREDICTION_COLUMN,
};
