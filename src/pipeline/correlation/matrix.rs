//! Correlation matrix, correlated pair extraction and greedy column reduction

use std::collections::HashSet;
use std::ops::AddAssign;
use std::path::Path;

use faer::Mat;
use serde::Serialize;

use crate::pipeline::error::{ConfigError, CorrelationError};
use crate::pipeline::settings::ConfigNode;

/// Tolerance for floating point noise around -1 and 1, and for variances near 0
pub const ROUND_ERROR_OK: f64 = 1e-8;

const COLUMN_NAMES: &str = "columnNames";
const CORRELATIONS: &str = "correlations";

/// Upper triangle of a symmetric `size` x `size` matrix, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfMatrix<T> {
    size: usize,
    include_diagonal: bool,
    values: Vec<T>,
}

impl<T: Copy> HalfMatrix<T> {
    pub fn new(size: usize, include_diagonal: bool, initial: T) -> Self {
        let len = if include_diagonal {
            size * (size + 1) / 2
        } else {
            size * size.saturating_sub(1) / 2
        };
        Self {
            size,
            include_diagonal,
            values: vec![initial; len],
        }
    }

    fn from_values(size: usize, values: Vec<T>) -> Option<Self> {
        (values.len() == size * size.saturating_sub(1) / 2).then_some(Self {
            size,
            include_diagonal: false,
            values,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        debug_assert!(j < self.size);
        if self.include_diagonal {
            i * (2 * self.size - i + 1) / 2 + (j - i)
        } else {
            debug_assert!(i != j, "diagonal not stored");
            i * (2 * self.size - i - 1) / 2 + (j - i - 1)
        }
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        self.values[self.index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let index = self.index(i, j);
        self.values[index] = value;
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Copy + AddAssign> HalfMatrix<T> {
    pub fn add(&mut self, i: usize, j: usize, value: T) {
        let index = self.index(i, j);
        self.values[index] += value;
    }
}

/// Represents a correlated pair of columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Symmetric matrix of pairwise correlations with a NaN diagonal.
///
/// Pairs that could not be computed are NaN. All other values lie in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: HalfMatrix<f64>,
}

impl CorrelationMatrix {
    /// Build the matrix, snapping values within `ROUND_ERROR_OK` of -1 or 1
    /// onto the bound. Values further outside the range are rejected.
    pub fn new(names: Vec<String>, mut values: HalfMatrix<f64>) -> Result<Self, CorrelationError> {
        if names.len() != values.size() || values.include_diagonal {
            return Err(CorrelationError::SizeMismatch {
                names: names.len(),
                size: values.size(),
            });
        }
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                let value = values.get(i, j);
                if value.is_nan() {
                    continue;
                }
                if value.abs() > 1.0 + ROUND_ERROR_OK {
                    return Err(CorrelationError::ValueOutOfRange {
                        first: names[i].clone(),
                        second: names[j].clone(),
                        value,
                    });
                }
                if value.abs() > 1.0 - ROUND_ERROR_OK {
                    values.set(i, j, value.signum());
                }
            }
        }
        Ok(Self { names, values })
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Correlation of columns `i` and `j`; NaN on the diagonal
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            f64::NAN
        } else {
            self.values.get(i, j)
        }
    }

    pub fn get_by_name(&self, first: &str, second: &str) -> Option<f64> {
        Some(self.get(self.index_of(first)?, self.index_of(second)?))
    }

    /// Full square matrix, diagonal set to NaN
    pub fn dense(&self) -> Mat<f64> {
        let n = self.len();
        Mat::from_fn(n, n, |i, j| self.get(i, j))
    }

    /// Pairs with `|r| >= threshold`, strongest first
    pub fn correlated_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.len();
        let mut pairs = Vec::new();

        // Extract upper triangle
        for i in 0..n {
            for j in (i + 1)..n {
                let corr = self.get(i, j);
                if !corr.is_nan() && corr.abs() >= threshold {
                    pairs.push(CorrelatedPair {
                        feature1: self.names[i].clone(),
                        feature2: self.names[j].clone(),
                        correlation: corr,
                    });
                }
            }
        }

        // Sort by absolute correlation descending
        pairs.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        pairs
    }

    /// Greedy reduction to columns without a partner at `|r| >= threshold`.
    ///
    /// Each round keeps the open column with the most open partners above the
    /// threshold and excludes those partners. Ties go to the lowest index.
    /// The result keeps the original column order.
    pub fn reduced_set(&self, threshold: f64) -> Vec<String> {
        let n = self.len();
        let mut excluded = vec![false; n];
        let mut kept = vec![false; n];
        let above = |i: usize, j: usize| self.get(i, j).abs() >= threshold;

        loop {
            let mut best: Option<usize> = None;
            let mut max_count = 0;
            for i in (0..n).filter(|&i| !excluded[i] && !kept[i]) {
                let count = (0..n)
                    .filter(|&j| j != i && !excluded[j] && !kept[j] && above(i, j))
                    .count();
                if count > max_count {
                    max_count = count;
                    best = Some(i);
                }
            }
            let Some(best) = best else {
                break;
            };
            kept[best] = true;
            for j in 0..n {
                if j != best && !excluded[j] && !kept[j] && above(best, j) {
                    excluded[j] = true;
                }
            }
        }

        self.names
            .iter()
            .zip(&excluded)
            .filter(|(_, excluded)| !**excluded)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Columns of `all_columns` that survive reduction. Columns the matrix
    /// does not know are kept unchanged.
    pub fn filter_columns(&self, all_columns: &[String], threshold: f64) -> Vec<String> {
        let reduced: HashSet<String> = self.reduced_set(threshold).into_iter().collect();
        all_columns
            .iter()
            .filter(|name| self.index_of(name).is_none() || reduced.contains(*name))
            .cloned()
            .collect()
    }

    pub fn save(&self, config: &mut ConfigNode) {
        config.add_string_array(COLUMN_NAMES, self.names.clone());
        config.add_double_array(CORRELATIONS, self.values.values().to_vec());
    }

    pub fn load(config: &ConfigNode) -> Result<Self, CorrelationError> {
        let names = config.get_string_array(COLUMN_NAMES)?.clone();
        let values = config.get_double_array(CORRELATIONS)?.clone();
        let count = values.len();
        let values = HalfMatrix::from_values(names.len(), values).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "{} correlations do not fit {} columns",
                count,
                names.len()
            ))
        })?;
        Self::new(names, values)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let mut config = ConfigNode::new();
        self.save(&mut config);
        config.save_to_path(path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, CorrelationError> {
        Self::load(&ConfigNode::load_from_path(path)?)
    }
}
