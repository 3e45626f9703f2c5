//! Nested, typed key-value sections used to persist learned models
//!
//! A `ConfigNode` is deliberately schema-free: each model writes the keys it
//! needs and reads them back through typed getters that fail with a
//! `ConfigError` naming the offending key. Nodes serialize to JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// A single typed entry of a `ConfigNode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConfigValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(#[serde(with = "nan_as_null")] f64),
    StringArray(Vec<String>),
    IntArray(Vec<i64>),
    DoubleArray(#[serde(with = "nan_as_null_vec")] Vec<f64>),
    Section(ConfigNode),
}

/// A section of named, typed entries; sections nest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigNode {
    entries: BTreeMap<String, ConfigValue>,
}

macro_rules! typed_getter {
    ($name:ident, $variant:ident, $ret:ty, $expected:literal) => {
        pub fn $name(&self, key: &str) -> Result<$ret, ConfigError> {
            match self.get(key)? {
                ConfigValue::$variant(value) => Ok(value),
                _ => Err(ConfigError::TypeMismatch {
                    key: key.to_string(),
                    expected: $expected,
                }),
            }
        }
    };
}

impl ConfigNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, ConfigValue::String(value.into()));
    }

    pub fn add_bool(&mut self, key: &str, value: bool) {
        self.insert(key, ConfigValue::Bool(value));
    }

    pub fn add_int(&mut self, key: &str, value: i64) {
        self.insert(key, ConfigValue::Int(value));
    }

    /// Stores a count; counts beyond `i64::MAX` cannot occur for in-memory data.
    pub fn add_count(&mut self, key: &str, value: usize) {
        self.insert(key, ConfigValue::Int(value as i64));
    }

    pub fn add_double(&mut self, key: &str, value: f64) {
        self.insert(key, ConfigValue::Double(value));
    }

    pub fn add_string_array(&mut self, key: &str, values: Vec<String>) {
        self.insert(key, ConfigValue::StringArray(values));
    }

    pub fn add_int_array(&mut self, key: &str, values: Vec<i64>) {
        self.insert(key, ConfigValue::IntArray(values));
    }

    pub fn add_double_array(&mut self, key: &str, values: Vec<f64>) {
        self.insert(key, ConfigValue::DoubleArray(values));
    }

    pub fn add_section(&mut self, key: &str, section: ConfigNode) {
        self.insert(key, ConfigValue::Section(section));
    }

    fn insert(&mut self, key: &str, value: ConfigValue) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    typed_getter!(get_string_ref, String, &String, "string");
    typed_getter!(get_bool_ref, Bool, &bool, "bool");
    typed_getter!(get_int_ref, Int, &i64, "int");
    typed_getter!(get_double_ref, Double, &f64, "double");
    typed_getter!(get_string_array, StringArray, &Vec<String>, "string array");
    typed_getter!(get_int_array, IntArray, &Vec<i64>, "int array");
    typed_getter!(get_double_array, DoubleArray, &Vec<f64>, "double array");
    typed_getter!(get_section, Section, &ConfigNode, "section");

    pub fn get_string(&self, key: &str) -> Result<&str, ConfigError> {
        self.get_string_ref(key).map(String::as_str)
    }

    /// A string entry that may be absent
    pub fn get_optional_string(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        if self.contains_key(key) {
            self.get_string(key).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get_bool_ref(key).copied()
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        self.get_int_ref(key).copied()
    }

    /// An int entry that must be a valid non-negative count
    pub fn get_count(&self, key: &str) -> Result<usize, ConfigError> {
        let value = self.get_int(key)?;
        usize::try_from(value).map_err(|_| {
            ConfigError::Invalid(format!("'{}' must be non-negative, got {}", key, value))
        })
    }

    pub fn get_double(&self, key: &str) -> Result<f64, ConfigError> {
        self.get_double_ref(key).copied()
    }

    /// An int array whose entries must all be valid counts
    pub fn get_count_array(&self, key: &str) -> Result<Vec<usize>, ConfigError> {
        self.get_int_array(key)?
            .iter()
            .map(|&v| {
                usize::try_from(v).map_err(|_| {
                    ConfigError::Invalid(format!("'{}' contains negative count {}", key, v))
                })
            })
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// JSON has no NaN; write it as `null` and read `null` back as NaN
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

mod nan_as_null_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
