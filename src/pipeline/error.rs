//! Error types for learning, scoring, correlation and model persistence.
//!
//! Recoverable conditions (`AttributeError::TooManyValues`, `InvalidModel`) are
//! returned to the orchestrators, which decide between demoting an attribute
//! and aborting. Everything in `LearnError`, `PredictError` and
//! `CorrelationError` aborts the whole operation.

use thiserror::Error;

/// Cause recorded on attributes removed for exceeding their value limit.
pub const TOO_MANY_VALUES_CAUSE: &str = "Too many values";

/// Returned by a monitor when the user canceled the running pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Execution canceled")]
pub struct Canceled;

/// Failure while adding one observation to an attribute model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    /// Accepting the value would exceed the attribute's distinct-value limit
    #[error("Attribute value '{value}' doesn't fit into model for '{attribute}' (limit: {limit} values)")]
    TooManyValues {
        attribute: String,
        value: String,
        limit: usize,
    },

    #[error("Value in column '{attribute}' is not compatible with the {expected} attribute model")]
    IncompatibleValue { attribute: String, expected: String },

    #[error("Model for attribute '{attribute}' is already validated and cannot learn further values")]
    AlreadyValidated { attribute: String },
}

/// Why an attribute model failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidModel {
    #[error("Model for attribute '{attribute}' contains no records")]
    NoRecords { attribute: String },

    #[error("Model for attribute '{attribute}' contains no class values")]
    NoClassValues { attribute: String },

    #[error("Model for attribute '{attribute}' and class '{class_value}' contains only missing values")]
    OnlyMissingValues {
        attribute: String,
        class_value: String,
    },
}

impl InvalidModel {
    /// Short cause string stored on the invalid model
    pub fn cause(&self) -> String {
        match self {
            InvalidModel::NoRecords { .. } => "No records".to_string(),
            InvalidModel::NoClassValues { .. } => "No class values".to_string(),
            InvalidModel::OnlyMissingValues { class_value, .. } => {
                format!("Only missing values for class '{}'", class_value)
            }
        }
    }
}

/// Fatal failures of Naive Bayes learning.
#[derive(Debug, Error)]
pub enum LearnError {
    #[error("Input data contains no rows")]
    NoRows,

    #[error("Class column '{0}' not found in table specification")]
    ClassColumnNotFound(String),

    #[error("Class column '{0}' is neither numeric nor nominal")]
    ClassColumnUnsupported(String),

    #[error("Missing class value found in row {row}; enable skipping of missing values to ignore such rows")]
    MissingClassValue { row: usize },

    #[error("Class attribute '{column}' has too many unique values (limit: {limit}); increase the maximum number of nominal values")]
    TooManyClassValues { column: String, limit: usize },

    #[error("Class attribute '{column}' is invalid: {cause}")]
    InvalidClassModel { column: String, cause: String },

    #[error("Row {row}: {source}")]
    IncompatibleValue {
        row: usize,
        #[source]
        source: AttributeError,
    },

    #[error(transparent)]
    Canceled(#[from] Canceled),
}

/// Failures while scoring rows against a learned model.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No model found for class column '{0}'")]
    NoClassModel(String),

    #[error("Class value '{0}' not found in model")]
    UnknownClassValue(String),

    #[error("Model contains no records")]
    NoRecords,

    #[error("Class value list must not be empty")]
    EmptyClassValues,

    #[error("Attribute names ({names}) and row ({cells}) must be the same size")]
    LengthMismatch { names: usize, cells: usize },

    #[error(transparent)]
    IncompatibleValue(#[from] AttributeError),

    #[error(transparent)]
    Canceled(#[from] Canceled),
}

/// Fatal failures of the correlation engine.
#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("Input data contains no rows")]
    NoRows,

    #[error("Column '{0}' not found in table specification")]
    ColumnNotFound(String),

    #[error("Column count mismatch: {names} names for a {size}x{size} matrix")]
    SizeMismatch { names: usize, size: usize },

    #[error("Correlation between '{first}' and '{second}' out of range: {value}")]
    ValueOutOfRange {
        first: String,
        second: String,
        value: f64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Canceled(#[from] Canceled),
}

/// Failures reading or writing persisted models.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config key '{0}' not found")]
    MissingKey(String),

    #[error("Config key '{key}' is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Malformed model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_values_display() {
        let err = AttributeError::TooManyValues {
            attribute: "color".to_string(),
            value: "teal".to_string(),
            limit: 3,
        };
        assert_eq!(
            err.to_string(),
            "Attribute value 'teal' doesn't fit into model for 'color' (limit: 3 values)"
        );
    }

    #[test]
    fn test_invalid_model_causes() {
        let no_records = InvalidModel::NoRecords {
            attribute: "x".to_string(),
        };
        assert_eq!(no_records.cause(), "No records");

        let only_missing = InvalidModel::OnlyMissingValues {
            attribute: "x".to_string(),
            class_value: "A".to_string(),
        };
        assert_eq!(only_missing.cause(), "Only missing values for class 'A'");
        assert!(only_missing.to_string().contains("only missing values"));
    }

    #[test]
    fn test_learn_error_names_column() {
        let err = LearnError::TooManyClassValues {
            column: "label".to_string(),
            limit: 2,
        };
        assert!(err.to_string().contains("'label'"));
        assert!(err.to_string().contains("limit: 2"));
    }

    #[test]
    fn test_canceled_converts() {
        let err: LearnError = Canceled.into();
        assert!(matches!(err, LearnError::Canceled(_)));
        assert_eq!(err.to_string(), "Execution canceled");
    }
}
