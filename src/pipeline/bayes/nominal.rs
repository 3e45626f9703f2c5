//! Per-class occurrence counts of a nominal attribute

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::pipeline::error::{AttributeError, ConfigError, InvalidModel};
use crate::pipeline::settings::ConfigNode;
use crate::pipeline::table::Cell;

pub(crate) const MODEL_TYPE: &str = "NominalModel";

const MAX_NO_OF_ATTRS: &str = "maxNoOfAttrs";
const CLASS_VALUE_COUNTER: &str = "noOfClasses";
const ATTRIBUTE_VALUES: &str = "attributeValues";
const CLASS_VALUE_SECTION: &str = "classValueData_";

const CLASS_VALUE: &str = "classValue";
const NO_OF_ROWS: &str = "noOfRows";
const MISSING_VALUE_COUNTER: &str = "MissingValCounter";
const ATTRIBUTE_VALS: &str = "attributeValues";
const ATTR_VAL_COUNTER: &str = "attributeCounter";

/// Counts of one class value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NominalClassValue {
    rows: usize,
    missing: usize,
    counts: HashMap<String, usize>,
}

impl NominalClassValue {
    /// Rows seen for this class, missing attribute values included
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn count(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    fn count_cell(&self, cell: &Cell) -> usize {
        if cell.is_missing() {
            self.missing
        } else {
            self.count(&cell.to_string())
        }
    }

    fn save(&self, class_value: &str, config: &mut ConfigNode) {
        config.add_string(CLASS_VALUE, class_value);
        config.add_count(NO_OF_ROWS, self.rows);
        config.add_count(MISSING_VALUE_COUNTER, self.missing);
        let mut values: Vec<(&String, &usize)> = self.counts.iter().collect();
        values.sort();
        config.add_string_array(ATTRIBUTE_VALS, values.iter().map(|(v, _)| (*v).clone()).collect());
        config.add_int_array(ATTR_VAL_COUNTER, values.iter().map(|(_, c)| **c as i64).collect());
    }

    fn load(config: &ConfigNode) -> Result<(String, Self), ConfigError> {
        let class_value = config.get_string(CLASS_VALUE)?.to_string();
        let values = config.get_string_array(ATTRIBUTE_VALS)?;
        let counters = config.get_count_array(ATTR_VAL_COUNTER)?;
        if values.len() != counters.len() {
            return Err(ConfigError::Invalid(
                "Attribute and counter array must be of equal size".to_string(),
            ));
        }
        let model = Self {
            rows: config.get_count(NO_OF_ROWS)?,
            missing: config.get_count(MISSING_VALUE_COUNTER)?,
            counts: values.iter().cloned().zip(counters).collect(),
        };
        Ok((class_value, model))
    }
}

/// Nominal attribute: per class, how often each attribute value occurred.
///
/// The distinct-value limit is shared by all classes of the attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalModel {
    max_values: usize,
    values: BTreeSet<String>,
    classes: BTreeMap<String, NominalClassValue>,
}

impl NominalModel {
    pub fn new(max_values: usize) -> Self {
        Self {
            max_values,
            values: BTreeSet::new(),
            classes: BTreeMap::new(),
        }
    }

    pub fn max_values(&self) -> usize {
        self.max_values
    }

    /// Distinct non-missing attribute values, sorted
    pub fn attribute_values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn class_values(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn class_value(&self, class_value: &str) -> Option<&NominalClassValue> {
        self.classes.get(class_value)
    }

    pub(crate) fn add_value(
        &mut self,
        attribute: &str,
        class_value: &str,
        cell: &Cell,
    ) -> Result<(), AttributeError> {
        let key = match cell {
            Cell::Missing => None,
            Cell::Nominal(value) => Some(value.as_str()),
            Cell::Numeric(_) => {
                return Err(AttributeError::IncompatibleValue {
                    attribute: attribute.to_string(),
                    expected: "nominal".to_string(),
                })
            }
        };

        // The limit is checked before anything is recorded so an overflowing
        // row leaves no trace in this model.
        if let Some(value) = key {
            if !self.values.contains(value) {
                if self.values.len() >= self.max_values {
                    return Err(AttributeError::TooManyValues {
                        attribute: attribute.to_string(),
                        value: value.to_string(),
                        limit: self.max_values,
                    });
                }
                self.values.insert(value.to_string());
            }
        }

        let class = self.classes.entry(class_value.to_string()).or_default();
        match key {
            Some(value) => *class.counts.entry(value.to_string()).or_insert(0) += 1,
            None => class.missing += 1,
        }
        class.rows += 1;
        Ok(())
    }

    /// `(count(c, v) + L) / (rows(c) + L * k)` where `k` is the number of
    /// distinct values, counting the missing bucket when missing values take
    /// part in learning.
    pub(crate) fn probability(
        &self,
        class_value: &str,
        cell: &Cell,
        laplace_corrector: f64,
        counts_missing: bool,
    ) -> f64 {
        let mut distinct = self.values.len();
        if counts_missing && self.classes.values().any(|c| c.missing > 0) {
            distinct += 1;
        }
        let (count, rows) = match self.classes.get(class_value) {
            Some(class) => (class.count_cell(cell), class.rows),
            None => (0, 0),
        };
        let numerator = count as f64 + laplace_corrector;
        let denominator = rows as f64 + laplace_corrector * distinct as f64;
        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }

    pub(crate) fn validate(&self, attribute: &str) -> Result<(), InvalidModel> {
        if self.values.is_empty() {
            return Err(InvalidModel::NoRecords {
                attribute: attribute.to_string(),
            });
        }
        if self.classes.is_empty() {
            return Err(InvalidModel::NoClassValues {
                attribute: attribute.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn rows_for_class(&self, class_value: &str) -> Option<usize> {
        self.classes.get(class_value).map(NominalClassValue::rows)
    }

    pub(crate) fn save(&self, config: &mut ConfigNode) {
        config.add_count(MAX_NO_OF_ATTRS, self.max_values);
        config.add_count(CLASS_VALUE_COUNTER, self.classes.len());
        config.add_string_array(ATTRIBUTE_VALUES, self.values.iter().cloned().collect());
        for (i, (class_value, class)) in self.classes.iter().enumerate() {
            let mut section = ConfigNode::new();
            class.save(class_value, &mut section);
            config.add_section(&format!("{}{}", CLASS_VALUE_SECTION, i), section);
        }
    }

    pub(crate) fn load(config: &ConfigNode) -> Result<Self, ConfigError> {
        let mut model = Self::new(config.get_count(MAX_NO_OF_ATTRS)?);
        model.values = config.get_string_array(ATTRIBUTE_VALUES)?.iter().cloned().collect();
        for i in 0..config.get_count(CLASS_VALUE_COUNTER)? {
            let section = config.get_section(&format!("{}{}", CLASS_VALUE_SECTION, i))?;
            let (class_value, class) = NominalClassValue::load(section)?;
            model.classes.insert(class_value, class);
        }
        Ok(model)
    }
}
