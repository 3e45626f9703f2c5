//! Per-attribute model shared by the nominal, numerical and class variants
//!
//! An `AttributeModel` carries what every variant needs (name, missing value
//! policy and counter, validation state) and dispatches the rest to its
//! `AttributeKind`.

use crate::pipeline::error::{AttributeError, ConfigError, InvalidModel};
use crate::pipeline::settings::ConfigNode;
use crate::pipeline::table::{Cell, ColumnKind};

use super::class::{self, ClassModel};
use super::nominal::{self, NominalModel};
use super::numerical::{self, NumericalModel};

const ATTRIBUTE_NAME: &str = "attributeName";
const IGNORE_MISSING_VALUES: &str = "skipMissingVals";
const NO_OF_MISSING_VALUES: &str = "numberOfMissingValues";
const MODEL_TYPE: &str = "type";
const INVALID_CAUSE: &str = "invalidCause";
const MODEL_DATA_SECTION: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Nominal(NominalModel),
    Numerical(NumericalModel),
    Class(ClassModel),
}

/// Lifecycle of an attribute model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Accumulating,
    Valid,
    Invalid { cause: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeModel {
    name: String,
    skip_missing: bool,
    missing_count: usize,
    state: ModelState,
    kind: AttributeKind,
}

impl AttributeModel {
    fn new(name: impl Into<String>, skip_missing: bool, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            skip_missing,
            missing_count: 0,
            state: ModelState::Accumulating,
            kind,
        }
    }

    pub fn nominal(name: impl Into<String>, skip_missing: bool, max_values: usize) -> Self {
        Self::new(name, skip_missing, AttributeKind::Nominal(NominalModel::new(max_values)))
    }

    pub fn numerical(name: impl Into<String>, skip_missing: bool) -> Self {
        Self::new(name, skip_missing, AttributeKind::Numerical(NumericalModel::new()))
    }

    pub fn class(name: impl Into<String>, skip_missing: bool, max_values: usize) -> Self {
        Self::new(name, skip_missing, AttributeKind::Class(ClassModel::new(max_values)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skip_missing(&self) -> bool {
        self.skip_missing
    }

    /// Missing cells seen while learning, whether skipped or not
    pub fn missing_count(&self) -> usize {
        self.missing_count
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn is_class_model(&self) -> bool {
        matches!(self.kind, AttributeKind::Class(_))
    }

    pub fn model_type(&self) -> &'static str {
        match self.kind {
            AttributeKind::Nominal(_) => nominal::MODEL_TYPE,
            AttributeKind::Numerical(_) => numerical::MODEL_TYPE,
            AttributeKind::Class(_) => class::MODEL_TYPE,
        }
    }

    /// Why the model is invalid, or `None` while it is usable
    pub fn invalid_cause(&self) -> Option<&str> {
        match &self.state {
            ModelState::Invalid { cause } => Some(cause),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state == ModelState::Valid
    }

    pub(crate) fn mark_invalid(&mut self, cause: impl Into<String>) {
        self.state = ModelState::Invalid {
            cause: cause.into(),
        };
    }

    /// Whether cells of a column with the given kind can be scored by this model
    pub fn is_compatible(&self, kind: ColumnKind) -> bool {
        match self.kind {
            AttributeKind::Nominal(_) => kind == ColumnKind::Nominal,
            AttributeKind::Numerical(_) => kind == ColumnKind::Numeric,
            AttributeKind::Class(_) => kind != ColumnKind::Unsupported,
        }
    }

    /// Class values this attribute has seen, sorted
    pub fn class_values(&self) -> Vec<&str> {
        match &self.kind {
            AttributeKind::Nominal(m) => m.class_values().collect(),
            AttributeKind::Numerical(m) => m.class_values().collect(),
            AttributeKind::Class(m) => m.class_values().collect(),
        }
    }

    /// Rows recorded for a class value, `None` if the class never occurred
    pub fn rows_for_class(&self, class_value: &str) -> Option<usize> {
        match &self.kind {
            AttributeKind::Nominal(m) => m.rows_for_class(class_value),
            AttributeKind::Numerical(m) => m.rows_for_class(class_value),
            AttributeKind::Class(m) => m.count(class_value),
        }
    }

    /// Record one observation of this attribute for the given class.
    ///
    /// A missing cell is counted; with the skip policy nothing else happens.
    /// On `TooManyValues` the model is left exactly as before the call.
    pub fn add_value(&mut self, class_value: &str, cell: &Cell) -> Result<(), AttributeError> {
        if self.state != ModelState::Accumulating {
            return Err(AttributeError::AlreadyValidated {
                attribute: self.name.clone(),
            });
        }
        if cell.is_missing() {
            self.missing_count += 1;
            if self.skip_missing {
                return Ok(());
            }
        }
        match &mut self.kind {
            AttributeKind::Nominal(m) => m.add_value(&self.name, class_value, cell),
            AttributeKind::Numerical(m) => m.add_value(&self.name, class_value, cell),
            AttributeKind::Class(m) => m.add_value(&self.name, class_value),
        }
        .inspect_err(|_| {
            if cell.is_missing() {
                self.missing_count -= 1;
            }
        })
    }

    /// P(cell | class). `None` when the cell is missing and missing values
    /// are skipped; the class variant answers the prior of `class_value`.
    pub fn probability(
        &self,
        class_value: &str,
        cell: &Cell,
        laplace_corrector: f64,
    ) -> Result<Option<f64>, AttributeError> {
        let expected = match self.kind {
            AttributeKind::Nominal(_) => Some(ColumnKind::Nominal),
            AttributeKind::Numerical(_) => Some(ColumnKind::Numeric),
            AttributeKind::Class(_) => None,
        };
        if let Some(kind) = expected {
            if !cell.is_compatible(kind) {
                return Err(AttributeError::IncompatibleValue {
                    attribute: self.name.clone(),
                    expected: kind.to_string(),
                });
            }
        }
        if cell.is_missing() && self.skip_missing {
            return Ok(None);
        }
        let probability = match &self.kind {
            AttributeKind::Nominal(m) => {
                m.probability(class_value, cell, laplace_corrector, !self.skip_missing)
            }
            AttributeKind::Numerical(m) => m.probability(class_value, cell),
            AttributeKind::Class(m) => m.probability(class_value),
        };
        Ok(Some(probability))
    }

    /// Close the learning phase. On failure the model becomes invalid with
    /// the failure's cause and the error is returned to the caller.
    pub fn validate(&mut self) -> Result<(), InvalidModel> {
        let result = match &mut self.kind {
            AttributeKind::Nominal(m) => m.validate(&self.name),
            AttributeKind::Numerical(m) => m.validate(&self.name),
            AttributeKind::Class(m) => m.validate(&self.name),
        };
        match &result {
            Ok(()) => self.state = ModelState::Valid,
            Err(invalid) => self.mark_invalid(invalid.cause()),
        }
        result
    }

    pub fn save(&self, config: &mut ConfigNode) {
        config.add_string(ATTRIBUTE_NAME, self.name.as_str());
        config.add_string(MODEL_TYPE, self.model_type());
        config.add_bool(IGNORE_MISSING_VALUES, self.skip_missing);
        config.add_count(NO_OF_MISSING_VALUES, self.missing_count);
        if let Some(cause) = self.invalid_cause() {
            config.add_string(INVALID_CAUSE, cause);
        }
        let mut data = ConfigNode::new();
        match &self.kind {
            AttributeKind::Nominal(m) => m.save(&mut data),
            AttributeKind::Numerical(m) => m.save(&mut data),
            AttributeKind::Class(m) => m.save(&mut data),
        }
        config.add_section(MODEL_DATA_SECTION, data);
    }

    /// Restore a saved model. Models saved without an invalid cause are
    /// validated again, which refits numeric distributions.
    pub fn load(config: &ConfigNode) -> Result<Self, ConfigError> {
        let name = config.get_string(ATTRIBUTE_NAME)?;
        let model_type = config.get_string(MODEL_TYPE)?;
        let data = config.get_section(MODEL_DATA_SECTION)?;
        let kind = match model_type {
            nominal::MODEL_TYPE => AttributeKind::Nominal(NominalModel::load(data)?),
            numerical::MODEL_TYPE => AttributeKind::Numerical(NumericalModel::load(data)?),
            class::MODEL_TYPE => AttributeKind::Class(ClassModel::load(data)?),
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid model type: {}",
                    other
                )))
            }
        };
        let mut model = Self::new(name, config.get_bool(IGNORE_MISSING_VALUES)?, kind);
        model.missing_count = config.get_count(NO_OF_MISSING_VALUES)?;
        match config.get_optional_string(INVALID_CAUSE)? {
            Some(cause) => model.mark_invalid(cause),
            None => {
                // a model persisted as valid must still validate
                let _ = model.validate();
            }
        }
        Ok(model)
    }
}
