//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tabstat::pipeline::{Cell, ColumnKind, ColumnSpec, InMemoryTable};
use tempfile::TempDir;

/// Nominal column from optional string values; `None` is a missing cell
pub fn nominal(name: &str, values: &[Option<&str>]) -> (ColumnSpec, Vec<Cell>) {
    (
        ColumnSpec::new(name, ColumnKind::Nominal),
        values.iter().map(|v| Cell::from(*v)).collect(),
    )
}

/// Numeric column from optional values; `None` is a missing cell
pub fn numeric(name: &str, values: &[Option<f64>]) -> (ColumnSpec, Vec<Cell>) {
    (
        ColumnSpec::new(name, ColumnKind::Numeric),
        values.iter().map(|v| Cell::from(*v)).collect(),
    )
}

pub fn table(columns: Vec<(ColumnSpec, Vec<Cell>)>) -> InMemoryTable {
    InMemoryTable::from_columns(columns).unwrap()
}

/// The classic 14-row weather table.
///
/// - `outlook`: nominal, 3 values
/// - `temperature`: numeric
/// - `windy`: nominal, 2 values
/// - `play`: class column, 9 x "yes" and 5 x "no"
pub fn weather_table() -> InMemoryTable {
    let outlook = [
        "sunny", "sunny", "overcast", "rainy", "rainy", "rainy", "overcast", "sunny", "sunny",
        "rainy", "sunny", "overcast", "overcast", "rainy",
    ];
    let temperature = [
        85.0, 80.0, 83.0, 70.0, 68.0, 65.0, 64.0, 72.0, 69.0, 75.0, 75.0, 72.0, 81.0, 71.0,
    ];
    let windy = [
        "false", "true", "false", "false", "false", "true", "true", "false", "false", "false",
        "true", "true", "false", "true",
    ];
    let play = [
        "no", "no", "yes", "yes", "yes", "no", "yes", "no", "yes", "yes", "yes", "yes", "yes",
        "no",
    ];

    table(vec![
        nominal("outlook", &outlook.map(Some)),
        numeric("temperature", &temperature.map(Some)),
        nominal("windy", &windy.map(Some)),
        nominal("play", &play.map(Some)),
    ])
}

/// Weather-like DataFrame for loader and CLI tests
pub fn create_test_dataframe() -> DataFrame {
    df! {
        "outlook" => ["sunny", "sunny", "overcast", "rainy", "rainy", "rainy", "overcast", "sunny", "sunny", "rainy"],
        "temperature" => [85.0f64, 80.0, 83.0, 70.0, 68.0, 65.0, 64.0, 72.0, 69.0, 75.0],
        "humidity" => [Some(85i64), Some(90), None, Some(96), Some(80), Some(70), Some(65), Some(95), Some(70), Some(80)],
        "play" => ["no", "no", "yes", "yes", "yes", "no", "yes", "no", "yes", "yes"],
    }
    .unwrap()
}

/// Create a DataFrame with known correlation patterns
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0], // b = 2*a
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], // negatively correlated with a
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0],
        "color" => ["red", "red", "blue", "blue", "red", "red", "blue", "blue", "red", "red"],
        "shade" => ["dark", "dark", "light", "light", "dark", "dark", "light", "light", "dark", "dark"],
    }
    .unwrap()
}

/// Create a larger test DataFrame for performance/stress tests
pub fn create_large_test_dataframe(rows: usize, cols: usize) -> DataFrame {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(42);

    let mut columns: Vec<Column> = Vec::with_capacity(cols + 1);

    let class: Vec<&str> = (0..rows)
        .map(|_| if rng.gen_bool(0.5) { "pos" } else { "neg" })
        .collect();
    columns.push(Column::new("class".into(), class));

    for i in 0..cols {
        let values: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Assert two floats are equal within `eps`
pub fn assert_close(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() < eps,
        "expected {} but got {} (eps {})",
        expected,
        actual,
        eps
    );
}
