//! Benchmark for the two-pass correlation computation and column reduction
//!
//! Run with: cargo bench --bench correlation_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;

use tabstat::pipeline::{
    compute_correlations, Cell, ColumnKind, ColumnSpec, CorrelationSettings, InMemoryTable,
    NoopMonitor,
};

const LEVELS: [&str; 4] = ["low", "mid", "high", "max"];

/// Generate a table with controlled characteristics
fn generate_test_table(n_rows: usize, n_numeric: usize, n_nominal: usize, seed: u64) -> InMemoryTable {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut numeric: Vec<Vec<f64>> = Vec::with_capacity(n_numeric);

    for i in 0..n_numeric {
        let values: Vec<f64> = match i % 3 {
            0 => (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect(),
            1 => (0..n_rows)
                .map(|_| {
                    let v = rng.gen::<f64>();
                    (v * v * v) * 100.0
                })
                .collect(),
            // Correlated with an earlier column
            _ => numeric[i - 2]
                .iter()
                .map(|v| v + rng.gen::<f64>() * 10.0 - 5.0)
                .collect(),
        };
        numeric.push(values);
    }

    let mut columns: Vec<(ColumnSpec, Vec<Cell>)> = numeric
        .into_iter()
        .enumerate()
        .map(|(i, values)| {
            (
                ColumnSpec::new(format!("num_{}", i), ColumnKind::Numeric),
                values.into_iter().map(Cell::Numeric).collect(),
            )
        })
        .collect();

    for i in 0..n_nominal {
        let cells = (0..n_rows)
            .map(|_| {
                if rng.gen::<f64>() < 0.05 {
                    Cell::Missing
                } else {
                    Cell::from(LEVELS[rng.gen_range(0..LEVELS.len())])
                }
            })
            .collect();
        columns.push((ColumnSpec::new(format!("nom_{}", i), ColumnKind::Nominal), cells));
    }

    InMemoryTable::from_columns(columns).expect("Failed to create table")
}

/// Varying column count at a fixed row count
fn benchmark_correlation_by_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_by_columns");
    group.sample_size(20);

    let n_rows = 10_000;
    let settings = CorrelationSettings::default();

    for n_cols in [10, 25, 50, 100] {
        let table = generate_test_table(n_rows, n_cols * 4 / 5, n_cols / 5, 42);
        group.throughput(Throughput::Elements(((n_cols * (n_cols - 1)) / 2) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_cols), &table, |b, table| {
            b.iter(|| {
                let _ = compute_correlations(black_box(table), black_box(&settings), &NoopMonitor);
            });
        });
    }

    group.finish();
}

/// Varying row count at a fixed column count
fn benchmark_correlation_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_by_rows");
    group.sample_size(20);

    let settings = CorrelationSettings::default();

    for n_rows in [1_000, 10_000, 50_000] {
        let table = generate_test_table(n_rows, 40, 10, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &table, |b, table| {
            b.iter(|| {
                let _ = compute_correlations(black_box(table), black_box(&settings), &NoopMonitor);
            });
        });
    }

    group.finish();
}

fn benchmark_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduced_set");

    for n_cols in [50, 200] {
        let table = generate_test_table(2_000, n_cols, 0, 42);
        let matrix = compute_correlations(&table, &CorrelationSettings::default(), &NoopMonitor)
            .expect("Failed to compute correlations")
            .matrix;

        group.bench_with_input(BenchmarkId::from_parameter(n_cols), &matrix, |b, matrix| {
            b.iter(|| matrix.reduced_set(black_box(0.8)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_correlation_by_columns,
    benchmark_correlation_by_rows,
    benchmark_reduction,
);
criterion_main!(benches);
