//! Gaussian model of a numeric attribute per class value
//!
//! Learning only touches `SufficientStats`. A `Gaussian` is derived from them
//! once, at validation, and never changes afterwards.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::pipeline::error::{AttributeError, ConfigError, InvalidModel};
use crate::pipeline::settings::ConfigNode;
use crate::pipeline::table::Cell;

pub(crate) const MODEL_TYPE: &str = "NumericalModel";

const CLASS_VALUE_COUNTER: &str = "noOfClasses";
const CLASS_VALUE_SECTION: &str = "classValueData_";

const CLASS_VALUE: &str = "classValue";
const MISSING_VALUE_COUNTER: &str = "MissingValCounter";
const NO_OF_ROWS: &str = "noOfRows";
const SUM: &str = "sum";
const SQUARE_SUM: &str = "squareSum";
const CONSTANT_VALUE: &str = "constantValue";

/// Running count, sum and sum of squares of one class value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SufficientStats {
    rows: usize,
    missing: usize,
    sum: f64,
    square_sum: f64,
    /// The first observation, as long as every later one is identical to it
    constant_value: Option<f64>,
}

impl SufficientStats {
    fn add(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.constant_value = match self.constant_value {
                    _ if self.non_missing() == 0 => Some(v),
                    Some(first) if first == v => Some(first),
                    _ => None,
                };
                self.sum += v;
                self.square_sum += v * v;
            }
            None => self.missing += 1,
        }
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn non_missing(&self) -> usize {
        self.rows - self.missing
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn square_sum(&self) -> f64 {
        self.square_sum
    }

    /// Derive the class-conditional distribution.
    ///
    /// Fails when the class has no non-missing observation.
    pub fn finalize(&self) -> Option<Gaussian> {
        let n = self.non_missing();
        if n == 0 {
            return None;
        }
        let mean = self.sum / n as f64;
        let std_dev = if n == 1 || self.constant_value.is_some() {
            0.0
        } else {
            let variance =
                (self.square_sum - (self.sum * self.sum) / n as f64) / (n - 1) as f64;
            // cancellation leaves a tiny, possibly negative, residue for constant values
            if variance <= 4.0 * n as f64 * f64::EPSILON * mean * mean {
                0.0
            } else {
                variance.sqrt()
            }
        };
        Some(Gaussian {
            mean,
            std_dev,
            constant_value: self.constant_value,
            missing_ratio: if self.rows == 0 {
                0.0
            } else {
                self.missing as f64 / self.rows as f64
            },
        })
    }

    fn save(&self, class_value: &str, config: &mut ConfigNode) {
        config.add_string(CLASS_VALUE, class_value);
        config.add_count(MISSING_VALUE_COUNTER, self.missing);
        config.add_count(NO_OF_ROWS, self.rows);
        config.add_double(SUM, self.sum);
        config.add_double(SQUARE_SUM, self.square_sum);
        if let Some(value) = self.constant_value {
            config.add_double(CONSTANT_VALUE, value);
        }
    }

    fn load(config: &ConfigNode) -> Result<(String, Self), ConfigError> {
        let class_value = config.get_string(CLASS_VALUE)?.to_string();
        let rows = config.get_count(NO_OF_ROWS)?;
        let missing = config.get_count(MISSING_VALUE_COUNTER)?;
        if missing > rows {
            return Err(ConfigError::Invalid(format!(
                "Class '{}' has more missing values ({}) than rows ({})",
                class_value, missing, rows
            )));
        }
        let sum = config.get_double(SUM)?;
        let constant_value = if config.contains_key(CONSTANT_VALUE) {
            Some(config.get_double(CONSTANT_VALUE)?)
        } else {
            // with a single observation the sum is that observation
            (rows - missing == 1).then_some(sum)
        };
        let stats = Self {
            rows,
            missing,
            sum,
            square_sum: config.get_double(SQUARE_SUM)?,
            constant_value,
        };
        Ok((class_value, stats))
    }
}

/// Finalized class-conditional normal distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
    /// Set when every observation of the class had this same value
    pub constant_value: Option<f64>,
    pub missing_ratio: f64,
}

impl Gaussian {
    /// Likelihood of `value`; degenerate distributions answer 1 for their
    /// only value and 0 otherwise. Missing values yield the missing ratio.
    pub fn probability(&self, value: Option<f64>) -> f64 {
        let Some(x) = value else {
            return self.missing_ratio;
        };
        if let Some(constant) = self.constant_value {
            return if x == constant { 1.0 } else { 0.0 };
        }
        if self.std_dev == 0.0 {
            return if x == self.mean { 1.0 } else { 0.0 };
        }
        let diff = x - self.mean;
        let variance = self.std_dev * self.std_dev;
        (-(diff * diff) / (2.0 * variance)).exp() / (self.std_dev * (2.0 * PI).sqrt())
    }

    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

/// Numeric attribute, accumulating until `validate` fits the distributions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericalModel {
    classes: BTreeMap<String, SufficientStats>,
    fitted: Option<BTreeMap<String, Gaussian>>,
}

impl NumericalModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_values(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn stats(&self, class_value: &str) -> Option<&SufficientStats> {
        self.classes.get(class_value)
    }

    /// The fitted distribution of a class; `None` before validation
    pub fn gaussian(&self, class_value: &str) -> Option<&Gaussian> {
        self.fitted.as_ref()?.get(class_value)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub(crate) fn add_value(
        &mut self,
        attribute: &str,
        class_value: &str,
        cell: &Cell,
    ) -> Result<(), AttributeError> {
        let value = match cell {
            Cell::Missing => None,
            Cell::Numeric(v) => Some(*v),
            Cell::Nominal(_) => {
                return Err(AttributeError::IncompatibleValue {
                    attribute: attribute.to_string(),
                    expected: "numerical".to_string(),
                })
            }
        };
        self.classes
            .entry(class_value.to_string())
            .or_default()
            .add(value);
        self.fitted = None;
        Ok(())
    }

    pub(crate) fn probability(&self, class_value: &str, cell: &Cell) -> f64 {
        let value = cell.as_f64();
        if let Some(gaussian) = self.gaussian(class_value) {
            return gaussian.probability(value);
        }
        // Queried before validation or for a class this attribute never saw
        self.classes
            .get(class_value)
            .and_then(SufficientStats::finalize)
            .map_or(0.0, |g| g.probability(value))
    }

    pub(crate) fn validate(&mut self, attribute: &str) -> Result<(), InvalidModel> {
        if self.classes.is_empty() {
            return Err(InvalidModel::NoClassValues {
                attribute: attribute.to_string(),
            });
        }
        let mut fitted = BTreeMap::new();
        for (class_value, stats) in &self.classes {
            if stats.rows == 0 {
                return Err(InvalidModel::NoRecords {
                    attribute: attribute.to_string(),
                });
            }
            let gaussian = stats.finalize().ok_or_else(|| InvalidModel::OnlyMissingValues {
                attribute: attribute.to_string(),
                class_value: class_value.clone(),
            })?;
            fitted.insert(class_value.clone(), gaussian);
        }
        self.fitted = Some(fitted);
        Ok(())
    }

    pub(crate) fn rows_for_class(&self, class_value: &str) -> Option<usize> {
        self.classes.get(class_value).map(SufficientStats::rows)
    }

    pub(crate) fn save(&self, config: &mut ConfigNode) {
        config.add_count(CLASS_VALUE_COUNTER, self.classes.len());
        for (i, (class_value, stats)) in self.classes.iter().enumerate() {
            let mut section = ConfigNode::new();
            stats.save(class_value, &mut section);
            config.add_section(&format!("{}{}", CLASS_VALUE_SECTION, i), section);
        }
    }

    /// Restores the sufficient statistics; callers re-validate to fit.
    pub(crate) fn load(config: &ConfigNode) -> Result<Self, ConfigError> {
        let mut model = Self::new();
        for i in 0..config.get_count(CLASS_VALUE_COUNTER)? {
            let section = config.get_section(&format!("{}{}", CLASS_VALUE_SECTION, i))?;
            let (class_value, stats) = SufficientStats::load(section)?;
            model.classes.insert(class_value, stats);
        }
        Ok(model)
    }
}
