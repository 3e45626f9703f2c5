//! Two-pass pairwise correlation
//!
//! Pass one collects pairwise-complete means and standard deviations of the
//! numeric columns and enumerates the values of the nominal columns. Pass two
//! accumulates standardized products (Pearson) and contingency tables
//! (Cramér's V). Pairs of a numeric and a nominal column are not computed.

use std::collections::HashMap;

use faer::Mat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pipeline::error::CorrelationError;
use crate::pipeline::monitor::{row_fraction, ExecutionMonitor, SubProgress};
use crate::pipeline::table::{Cell, ColumnKind, ColumnSpec, RowSource, TableSpec};

use super::matrix::{CorrelationMatrix, HalfMatrix, ROUND_ERROR_OK};

pub const DEFAULT_MAX_POSSIBLE_VALUES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSettings {
    /// Columns to analyze; all supported columns when `None`
    pub columns: Option<Vec<String>>,
    /// Nominal columns with more distinct values (missing included) are not
    /// correlated
    pub max_possible_values: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            columns: None,
            max_possible_values: DEFAULT_MAX_POSSIBLE_VALUES,
        }
    }
}

/// Distinct values of a nominal column in order of first appearance.
/// Missing is a value of its own.
type PossibleValues = HashMap<Option<String>, usize>;

fn value_key(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Missing => None,
        other => Some(other.to_string()),
    }
}

/// Result of the first pass, consumed by the second
#[derive(Debug, Clone)]
pub struct PairwiseStatistics {
    /// `means[(i, j)]`: mean of numeric column i over rows where j is present
    means: Mat<f64>,
    std_devs: Mat<f64>,
    valid_counts: HalfMatrix<usize>,
    /// `None` for columns with too many distinct values
    possible_values: Vec<Option<PossibleValues>>,
    /// Analyzed column positions of numeric columns that contain missing values
    numerics_with_missing: Vec<usize>,
}

impl PairwiseStatistics {
    /// Mean of numeric column `i` where numeric column `j` is present
    pub fn mean(&self, i: usize, j: usize) -> f64 {
        self.means[(i, j)]
    }

    pub fn std_dev(&self, i: usize, j: usize) -> f64 {
        self.std_devs[(i, j)]
    }

    /// Rows where both numeric columns are present
    pub fn valid_count(&self, i: usize, j: usize) -> usize {
        self.valid_counts.get(i, j)
    }

    /// Number of distinct values of nominal column `i`, `None` if capped
    pub fn possible_value_count(&self, i: usize) -> Option<usize> {
        self.possible_values[i].as_ref().map(HashMap::len)
    }
}

/// Warnings collected while computing correlations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationDiagnostics {
    /// Numeric columns containing missing values
    pub numerics_with_missing: Vec<String>,
    /// Constant columns. `(x, Some(y))` means x is constant where y is present.
    pub constant_pairs: Vec<(String, Option<String>)>,
    /// Nominal columns skipped for having too many distinct values
    pub too_many_values: Vec<String>,
}

impl CorrelationDiagnostics {
    pub fn missing_value_warning(&self, max_to_report: usize) -> Option<String> {
        if self.numerics_with_missing.is_empty() {
            return None;
        }
        let items: Vec<String> = self
            .numerics_with_missing
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect();
        Some(format!(
            "Some numeric column(s) contained missing values: {}",
            capped_list(&items, max_to_report)
        ))
    }

    pub fn constant_columns_warning(&self, max_to_report: usize) -> Option<String> {
        if self.constant_pairs.is_empty() {
            return None;
        }
        let items: Vec<String> = self
            .constant_pairs
            .iter()
            .map(|(column, other)| match other {
                Some(other) => format!("\"{}\" (when \"{}\" is not missing)", column, other),
                None => format!("\"{}\"", column),
            })
            .collect();
        Some(format!(
            "Some numeric column(s) have low variance (are constant): {}",
            capped_list(&items, max_to_report)
        ))
    }

    /// Columns that are constant over the whole table
    pub fn constant_columns(&self) -> Vec<&str> {
        self.constant_pairs
            .iter()
            .filter(|(_, other)| other.is_none())
            .map(|(column, _)| column.as_str())
            .collect()
    }
}

fn capped_list(items: &[String], max: usize) -> String {
    let mut text = items
        .iter()
        .take(max)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > max {
        text.push_str(&format!(", <{} more>...", items.len() - max));
    }
    text
}

/// Finished correlation: the matrix and what was reported along the way
#[derive(Debug, Clone)]
pub struct CorrelationResult {
    pub matrix: CorrelationMatrix,
    pub diagnostics: CorrelationDiagnostics,
}

/// Pairwise correlation over a fixed set of analyzed columns
#[derive(Debug, Clone)]
pub struct PmccCalculator {
    /// Analyzed columns with their index in the source table
    columns: Vec<(usize, ColumnSpec)>,
    /// Positions in `columns` of numeric columns
    numeric: Vec<usize>,
    /// Positions in `columns` of nominal columns
    categorical: Vec<usize>,
    max_possible_values: usize,
}

impl PmccCalculator {
    /// Select the analyzed columns of `spec`. Requested columns must exist;
    /// columns of unsupported kind are left out.
    pub fn new(spec: &TableSpec, settings: &CorrelationSettings) -> Result<Self, CorrelationError> {
        let indices: Vec<usize> = match &settings.columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    spec.find_column_index(name)
                        .ok_or_else(|| CorrelationError::ColumnNotFound(name.clone()))
                })
                .collect::<Result<_, _>>()?,
            None => (0..spec.len()).collect(),
        };

        let columns: Vec<(usize, ColumnSpec)> = indices
            .into_iter()
            .map(|index| (index, spec.column(index).clone()))
            .filter(|(_, column)| column.kind != ColumnKind::Unsupported)
            .collect();
        let positions_of = |kind: ColumnKind| -> Vec<usize> {
            columns
                .iter()
                .enumerate()
                .filter(|(_, (_, column))| column.kind == kind)
                .map(|(position, _)| position)
                .collect()
        };
        let numeric = positions_of(ColumnKind::Numeric);
        let categorical = positions_of(ColumnKind::Nominal);

        Ok(Self {
            columns,
            numeric,
            categorical,
            max_possible_values: settings.max_possible_values,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(_, c)| c.name.clone()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|&p| self.columns[p].1.name.as_str())
            .collect()
    }

    pub fn categorical_column_names(&self) -> Vec<&str> {
        self.categorical
            .iter()
            .map(|&p| self.columns[p].1.name.as_str())
            .collect()
    }

    fn source_index(&self, position: usize) -> usize {
        self.columns[position].0
    }

    fn name(&self, position: usize) -> &str {
        &self.columns[position].1.name
    }

    /// First pass: pairwise-complete sums turned into means and standard
    /// deviations, and the possible values of every nominal column.
    pub fn calculate_statistics(
        &self,
        source: &dyn RowSource,
        monitor: &dyn ExecutionMonitor,
    ) -> Result<PairwiseStatistics, CorrelationError> {
        let row_count = source.row_count();
        if row_count == 0 {
            return Err(CorrelationError::NoRows);
        }
        let n = self.numeric.len();
        let mut sums = Mat::<f64>::zeros(n, n);
        let mut square_sums = Mat::<f64>::zeros(n, n);
        let mut valid_counts = HalfMatrix::new(n, true, 0usize);
        let mut possible_values: Vec<Option<PossibleValues>> =
            vec![Some(PossibleValues::new()); self.categorical.len()];
        let mut numerics_with_missing: Vec<usize> = Vec::new();
        let mut values: Vec<Option<f64>> = vec![None; n];

        for (row_index, row) in source.rows().enumerate() {
            monitor.check_canceled()?;
            monitor.set_progress(row_fraction(row_index, row_count), "Calculating statistics");

            for (k, &position) in self.numeric.iter().enumerate() {
                values[k] = row.cell(self.source_index(position)).as_f64();
            }
            for i in 0..n {
                let Some(value) = values[i] else {
                    if !numerics_with_missing.contains(&self.numeric[i]) {
                        numerics_with_missing.push(self.numeric[i]);
                    }
                    continue;
                };
                for j in 0..n {
                    if values[j].is_some() {
                        sums[(i, j)] += value;
                        square_sums[(i, j)] += value * value;
                        // symmetric, count once
                        if j >= i {
                            valid_counts.add(i, j, 1);
                        }
                    }
                }
            }

            for (k, &position) in self.categorical.iter().enumerate() {
                let Some(map) = possible_values[k].as_mut() else {
                    continue;
                };
                let next = map.len();
                map.entry(value_key(row.cell(self.source_index(position))))
                    .or_insert(next);
                if map.len() > self.max_possible_values {
                    warn!(
                        column = %self.name(position),
                        limit = self.max_possible_values,
                        "too many distinct values, column not correlated"
                    );
                    possible_values[k] = None;
                }
            }
        }

        // sums become means, square sums become standard deviations
        for i in 0..n {
            for j in 0..n {
                let count = valid_counts.get(i, j);
                let (sum, square_sum) = (sums[(i, j)], square_sums[(i, j)]);
                square_sums[(i, j)] = if count > 1 {
                    let variance =
                        (square_sum - sum * sum / count as f64) / (count - 1) as f64;
                    if variance < ROUND_ERROR_OK {
                        0.0
                    } else {
                        variance.sqrt()
                    }
                } else {
                    0.0
                };
                sums[(i, j)] = if count > 0 { sum / count as f64 } else { f64::NAN };
            }
        }
        monitor.set_progress(1.0, "Statistics calculated");

        Ok(PairwiseStatistics {
            means: sums,
            std_devs: square_sums,
            valid_counts,
            possible_values,
            numerics_with_missing,
        })
    }

    /// Second pass: correlation of every analyzed column pair.
    ///
    /// Takes the first pass's statistics by value; they are only valid for
    /// the same source.
    pub fn calculate_output(
        &self,
        statistics: PairwiseStatistics,
        source: &dyn RowSource,
        monitor: &dyn ExecutionMonitor,
    ) -> Result<CorrelationResult, CorrelationError> {
        let n = self.numeric.len();
        let cat = self.categorical.len();
        let std_devs = &statistics.std_devs;
        let means = &statistics.means;

        // cross-type pairs stay NaN
        let mut output = HalfMatrix::new(self.columns.len(), false, f64::NAN);
        let mut constant_pairs: Vec<(usize, Option<usize>)> = Vec::new();
        // numeric pairs with a usable standard deviation on both sides
        let mut computable = HalfMatrix::new(n.max(1), true, false);

        for i in 0..n {
            if std_devs[(i, i)] == 0.0 {
                constant_pairs.push((self.numeric[i], None));
                continue;
            }
            for j in (i + 1)..n {
                if std_devs[(j, j)] == 0.0 {
                    // reported when j is the outer column
                    continue;
                }
                let mut usable = true;
                if std_devs[(i, j)] == 0.0 {
                    constant_pairs.push((self.numeric[i], Some(self.numeric[j])));
                    usable = false;
                }
                if std_devs[(j, i)] == 0.0 {
                    constant_pairs.push((self.numeric[j], Some(self.numeric[i])));
                    usable = false;
                }
                if usable {
                    computable.set(i, j, true);
                    output.set(self.numeric[i], self.numeric[j], 0.0);
                }
            }
        }

        let mut contingency: Vec<Option<Vec<Vec<usize>>>> =
            Vec::with_capacity(cat * cat.saturating_sub(1) / 2);
        for i in 0..cat {
            for j in (i + 1)..cat {
                let table = match (&statistics.possible_values[i], &statistics.possible_values[j]) {
                    (Some(a), Some(b)) => Some(vec![vec![0usize; b.len()]; a.len()]),
                    _ => None,
                };
                contingency.push(table);
            }
        }

        let row_count = source.row_count();
        let mut values: Vec<Option<f64>> = vec![None; n];
        let mut keys: Vec<Option<usize>> = vec![None; cat];
        for (row_index, row) in source.rows().enumerate() {
            monitor.check_canceled()?;
            monitor.set_progress(row_fraction(row_index, row_count), "Calculating correlations");

            for (k, &position) in self.numeric.iter().enumerate() {
                values[k] = row.cell(self.source_index(position)).as_f64();
            }
            for i in 0..n {
                let Some(x) = values[i] else {
                    continue;
                };
                for j in (i + 1)..n {
                    let Some(y) = values[j] else {
                        continue;
                    };
                    if !computable.get(i, j) {
                        continue;
                    }
                    let vi = (x - means[(i, j)]) / std_devs[(i, j)];
                    let vj = (y - means[(j, i)]) / std_devs[(j, i)];
                    output.add(self.numeric[i], self.numeric[j], vi * vj);
                }
            }

            for (k, &position) in self.categorical.iter().enumerate() {
                keys[k] = statistics.possible_values[k].as_ref().and_then(|map| {
                    map.get(&value_key(row.cell(self.source_index(position))))
                        .copied()
                });
            }
            let mut pair = 0;
            for i in 0..cat {
                for j in (i + 1)..cat {
                    if let (Some(table), Some(a), Some(b)) =
                        (&mut contingency[pair], keys[i], keys[j])
                    {
                        table[a][b] += 1;
                    }
                    pair += 1;
                }
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if computable.get(i, j) {
                    let (a, b) = (self.numeric[i], self.numeric[j]);
                    let count = statistics.valid_counts.get(i, j);
                    output.set(a, b, output.get(a, b) / (count - 1) as f64);
                }
            }
        }

        let mut pair = 0;
        for i in 0..cat {
            for j in (i + 1)..cat {
                let value = contingency[pair].as_deref().map_or(f64::NAN, cramers_v);
                output.set(self.categorical[i], self.categorical[j], value);
                pair += 1;
            }
        }
        monitor.set_progress(1.0, "Correlations calculated");

        let diagnostics = CorrelationDiagnostics {
            numerics_with_missing: statistics
                .numerics_with_missing
                .iter()
                .map(|&p| self.name(p).to_string())
                .collect(),
            constant_pairs: constant_pairs
                .iter()
                .map(|&(p, other)| {
                    (
                        self.name(p).to_string(),
                        other.map(|o| self.name(o).to_string()),
                    )
                })
                .collect(),
            too_many_values: self
                .categorical
                .iter()
                .zip(&statistics.possible_values)
                .filter(|(_, values)| values.is_none())
                .map(|(&p, _)| self.name(p).to_string())
                .collect(),
        };
        if !diagnostics.constant_pairs.is_empty() {
            debug!(pairs = diagnostics.constant_pairs.len(), "constant numeric columns found");
        }

        let matrix = CorrelationMatrix::new(self.column_names(), output)?;
        Ok(CorrelationResult {
            matrix,
            diagnostics,
        })
    }

    /// Run both passes over `source`
    pub fn calculate(
        &self,
        source: &dyn RowSource,
        monitor: &dyn ExecutionMonitor,
    ) -> Result<CorrelationResult, CorrelationError> {
        info!(
            numeric = self.numeric.len(),
            nominal = self.categorical.len(),
            rows = source.row_count(),
            "calculating correlations"
        );
        let first = SubProgress::new(monitor, 0.0, 0.5);
        let statistics = self.calculate_statistics(source, &first)?;
        let second = SubProgress::new(monitor, 0.5, 0.5);
        let result = self.calculate_output(statistics, source, &second)?;
        info!(columns = result.matrix.len(), "correlations calculated");
        Ok(result)
    }
}

/// Cramér's V of a contingency table; 0 when either dimension has a single value
pub fn cramers_v(contingency: &[Vec<usize>]) -> f64 {
    let rows = contingency.len();
    let cols = contingency.first().map_or(0, Vec::len);
    if rows <= 1 || cols <= 1 {
        return 0.0;
    }
    let mut row_sums = vec![0.0; rows];
    let mut col_sums = vec![0.0; cols];
    let mut total = 0.0;
    for (i, row) in contingency.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let count = count as f64;
            row_sums[i] += count;
            col_sums[j] += count;
            total += count;
        }
    }
    if total == 0.0 {
        return 0.0;
    }
    let mut chi_square = 0.0;
    for (i, row) in contingency.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / total;
            if expected > 0.0 {
                let diff = count as f64 - expected;
                chi_square += diff * diff / expected;
            }
        }
    }
    let min_value_count = (rows.min(cols) - 1) as f64;
    (chi_square / (total * min_value_count)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cramers_v_single_value_is_zero() {
        assert_eq!(cramers_v(&[vec![3, 4]]), 0.0);
        assert_eq!(cramers_v(&[vec![3], vec![4]]), 0.0);
    }

    #[test]
    fn test_cramers_v_perfect_association() {
        let v = cramers_v(&[vec![5, 0], vec![0, 5]]);
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cramers_v_independent() {
        let v = cramers_v(&[vec![2, 2], vec![3, 3]]);
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn test_capped_list() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(capped_list(&items, 5), "a, b, c");
        assert_eq!(capped_list(&items, 2), "a, b, <1 more>...");
    }
}
