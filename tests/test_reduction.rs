//! Tests for correlation-based column reduction

use tabstat::pipeline::correlation::{CorrelationMatrix, HalfMatrix};
use tabstat::pipeline::{compute_correlations, dataframe_to_table, CorrelationSettings, NoopMonitor};

#[path = "common/mod.rs"]
mod common;

fn matrix(names: &[&str], pairs: &[(usize, usize, f64)]) -> CorrelationMatrix {
    let mut values = HalfMatrix::new(names.len(), false, f64::NAN);
    for &(i, j, r) in pairs {
        values.set(i, j, r);
    }
    CorrelationMatrix::new(names.iter().map(|s| s.to_string()).collect(), values).unwrap()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_hub_column_is_kept() {
    // b correlates with everything, the others only with b
    let m = matrix(
        &["a", "b", "c", "d"],
        &[(0, 1, 0.95), (1, 2, -0.97), (1, 3, 0.92), (0, 2, 0.1), (0, 3, 0.2), (2, 3, 0.3)],
    );
    assert_eq!(m.reduced_set(0.9), vec!["b"]);
}

#[test]
fn test_chain_reduction() {
    // a-b and b-c above the threshold: keeping b drops both neighbors
    let m = matrix(&["a", "b", "c"], &[(0, 1, 0.95), (1, 2, 0.95), (0, 2, 0.5)]);
    assert_eq!(m.reduced_set(0.9), vec!["b"]);

    // at a lower threshold every column is connected; the first one wins
    assert_eq!(m.reduced_set(0.4), vec!["a"]);
}

#[test]
fn test_threshold_is_inclusive() {
    let m = matrix(&["a", "b"], &[(0, 1, 0.8)]);
    assert_eq!(m.reduced_set(0.8), vec!["a"]);
    assert_eq!(m.reduced_set(0.81), vec!["a", "b"]);
}

#[test]
fn test_nan_never_reduces() {
    let m = matrix(&["a", "b", "c"], &[]);
    assert_eq!(m.reduced_set(0.0), vec!["a", "b", "c"]);
}

#[test]
fn test_reduced_set_is_stable() {
    let m = matrix(
        &["a", "b", "c", "d", "e"],
        &[(0, 1, 0.99), (2, 3, -0.95), (3, 4, 0.96), (1, 4, 0.2)],
    );
    let reduced = m.reduced_set(0.9);
    assert_eq!(reduced, vec!["a", "d"]);

    // no kept pair is above the threshold
    for (i, first) in reduced.iter().enumerate() {
        for second in &reduced[i + 1..] {
            let r = m.get_by_name(first, second).unwrap();
            assert!(r.is_nan() || r.abs() < 0.9);
        }
    }

    // reducing the kept columns again changes nothing
    let names: Vec<&str> = reduced.iter().map(String::as_str).collect();
    let mut pairs = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            pairs.push((i, j, m.get_by_name(names[i], names[j]).unwrap()));
        }
    }
    assert_eq!(matrix(&names, &pairs).reduced_set(0.9), reduced);
}

#[test]
fn test_filter_keeps_unknown_columns_in_order() {
    let m = matrix(&["a", "b"], &[(0, 1, 0.99)]);
    let all = strings(&["id", "a", "b", "target"]);
    assert_eq!(m.filter_columns(&all, 0.9), vec!["id", "a", "target"]);
}

#[test]
fn test_correlated_pairs_sorted_by_strength() {
    let m = matrix(
        &["a", "b", "c"],
        &[(0, 1, 0.91), (0, 2, -0.99), (1, 2, 0.5)],
    );
    let pairs = m.correlated_pairs(0.9);
    assert_eq!(pairs.len(), 2);
    assert_eq!((pairs[0].feature1.as_str(), pairs[0].feature2.as_str()), ("a", "c"));
    assert_eq!(pairs[0].correlation, -0.99);
    assert_eq!(pairs[1].correlation, 0.91);
}

#[test]
fn test_reduction_of_computed_matrix() {
    let df = common::create_correlation_test_dataframe();
    let source = dataframe_to_table(&df).unwrap();
    let matrix = compute_correlations(&source, &CorrelationSettings::default(), &NoopMonitor)
        .unwrap()
        .matrix;

    // a, b and c are perfectly correlated; color and shade are equivalent
    assert_eq!(matrix.reduced_set(0.95), vec!["a", "d", "color"]);
}
