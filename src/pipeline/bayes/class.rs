//! Class value counts, the source of the prior probabilities

use std::collections::BTreeMap;

use crate::pipeline::error::{AttributeError, ConfigError, InvalidModel};
use crate::pipeline::settings::ConfigNode;

pub(crate) const MODEL_TYPE: &str = "ClassModel";

const MAX_NO_OF_CLASS_VALS: &str = "maxNoOfClassVals";
const NO_OF_RECORDS: &str = "noOfRecords";
const CLASS_VALUES: &str = "classValues";
const RECORD_COUNTER: &str = "recordCounter";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    max_values: usize,
    total_rows: usize,
    counts: BTreeMap<String, usize>,
}

impl ClassModel {
    pub fn new(max_values: usize) -> Self {
        Self {
            max_values,
            total_rows: 0,
            counts: BTreeMap::new(),
        }
    }

    pub fn max_values(&self) -> usize {
        self.max_values
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn class_values(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn count(&self, class_value: &str) -> Option<usize> {
        self.counts.get(class_value).copied()
    }

    pub(crate) fn add_value(
        &mut self,
        attribute: &str,
        class_value: &str,
    ) -> Result<(), AttributeError> {
        if !self.counts.contains_key(class_value) && self.counts.len() >= self.max_values {
            return Err(AttributeError::TooManyValues {
                attribute: attribute.to_string(),
                value: class_value.to_string(),
                limit: self.max_values,
            });
        }
        *self.counts.entry(class_value.to_string()).or_insert(0) += 1;
        self.total_rows += 1;
        Ok(())
    }

    /// Prior `count(c) / total`
    pub(crate) fn probability(&self, class_value: &str) -> f64 {
        match self.counts.get(class_value) {
            Some(&count) if self.total_rows > 0 => count as f64 / self.total_rows as f64,
            _ => 0.0,
        }
    }

    pub(crate) fn validate(&self, attribute: &str) -> Result<(), InvalidModel> {
        if self.total_rows == 0 {
            return Err(InvalidModel::NoRecords {
                attribute: attribute.to_string(),
            });
        }
        if self.counts.is_empty() {
            return Err(InvalidModel::NoClassValues {
                attribute: attribute.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn save(&self, config: &mut ConfigNode) {
        config.add_count(MAX_NO_OF_CLASS_VALS, self.max_values);
        config.add_count(NO_OF_RECORDS, self.total_rows);
        config.add_string_array(CLASS_VALUES, self.counts.keys().cloned().collect());
        config.add_int_array(
            RECORD_COUNTER,
            self.counts.values().map(|&c| c as i64).collect(),
        );
    }

    pub(crate) fn load(config: &ConfigNode) -> Result<Self, ConfigError> {
        let values = config.get_string_array(CLASS_VALUES)?;
        let counters = config.get_count_array(RECORD_COUNTER)?;
        if values.len() != counters.len() {
            return Err(ConfigError::Invalid(
                "Class value and counter array must be of equal size".to_string(),
            ));
        }
        Ok(Self {
            max_values: config.get_count(MAX_NO_OF_CLASS_VALS)?,
            total_rows: config.get_count(NO_OF_RECORDS)?,
            counts: values.iter().cloned().zip(counters).collect(),
        })
    }
}
