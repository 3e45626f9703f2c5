//! Benchmark for Naive Bayes learning and table scoring
//!
//! Run with: cargo bench --bench bayes_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;

use tabstat::pipeline::{
    predict_table, Cell, ColumnKind, ColumnSpec, InMemoryTable, LearnerSettings, NaiveBayesModel,
    NoopMonitor, PredictorSettings,
};

const LEVELS: [&str; 5] = ["a", "b", "c", "d", "e"];

/// Generate a table with a binary class column and alternating numeric/nominal features
fn generate_test_table(n_rows: usize, n_features: usize, seed: u64) -> InMemoryTable {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let class: Vec<bool> = (0..n_rows).map(|_| rng.gen::<f64>() > 0.7).collect();
    let mut columns = vec![(
        ColumnSpec::new("class", ColumnKind::Nominal),
        class
            .iter()
            .map(|&positive| Cell::from(if positive { "pos" } else { "neg" }))
            .collect::<Vec<_>>(),
    )];

    for i in 0..n_features {
        let column = if i % 2 == 0 {
            // Shifted by class so the features carry signal
            let cells = class
                .iter()
                .map(|&positive| {
                    if rng.gen::<f64>() < 0.02 {
                        Cell::Missing
                    } else {
                        let shift = if positive { 10.0 } else { 0.0 };
                        Cell::Numeric(rng.gen::<f64>() * 100.0 + shift)
                    }
                })
                .collect();
            (ColumnSpec::new(format!("num_{}", i), ColumnKind::Numeric), cells)
        } else {
            let cells = (0..n_rows)
                .map(|_| Cell::from(LEVELS[rng.gen_range(0..LEVELS.len())]))
                .collect();
            (ColumnSpec::new(format!("nom_{}", i), ColumnKind::Nominal), cells)
        };
        columns.push(column);
    }

    InMemoryTable::from_columns(columns).expect("Failed to create table")
}

fn benchmark_learning(c: &mut Criterion) {
    let mut group = c.benchmark_group("bayes_learn");
    group.sample_size(20);

    let n_features = 20;
    let settings = LearnerSettings::new("class");

    for n_rows in [1_000, 10_000, 50_000] {
        let table = generate_test_table(n_rows, n_features, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &table, |b, table| {
            b.iter(|| {
                let _ = NaiveBayesModel::learn(
                    black_box(table),
                    black_box(&settings),
                    &NoopMonitor,
                );
            });
        });
    }

    group.finish();
}

fn benchmark_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("bayes_predict");
    group.sample_size(20);

    let n_features = 20;
    let training = generate_test_table(10_000, n_features, 42);
    let model = NaiveBayesModel::learn(&training, &LearnerSettings::new("class"), &NoopMonitor)
        .expect("Failed to learn model");

    let plain = PredictorSettings::default();
    let with_probabilities = PredictorSettings {
        laplace_corrector: 1.0,
        include_probabilities: true,
        ..PredictorSettings::default()
    };

    for n_rows in [1_000, 10_000, 50_000] {
        let table = generate_test_table(n_rows, n_features, 7);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::new("class_only", n_rows), &table, |b, table| {
            b.iter(|| {
                let _ = predict_table(
                    black_box(&model),
                    black_box(table),
                    black_box(&plain),
                    &NoopMonitor,
                );
            });
        });

        group.bench_with_input(
            BenchmarkId::new("with_probabilities", n_rows),
            &table,
            |b, table| {
                b.iter(|| {
                    let _ = predict_table(
                        black_box(&model),
                        black_box(table),
                        black_box(&with_probabilities),
                        &NoopMonitor,
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_learning, benchmark_prediction);
criterion_main!(benches);
