//! Benchmark fitting the three candidate models on synthetic indicator data
//!
//! Run with: cargo bench --bench training_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand::SeedableRng;

use shinkansen::model::{ModelKind, ModelParams};

/// Mostly 0/1 columns with a few wide numeric ones, like an encoded survey
fn generate_training_data(n_rows: usize, n_features: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let x = Array2::from_shape_fn((n_rows, n_features), |(_, c)| {
        if c < 4 {
            rng.gen::<f64>() * 1000.0
        } else if rng.gen::<f64>() > 0.8 {
            1.0
        } else {
            0.0
        }
    });

    // Label depends on two indicators plus noise
    let y = Array1::from_iter((0..n_rows).map(|r| {
        let signal = x[[r, 4]] + x[[r, 5]] + rng.gen::<f64>() * 0.5;
        if signal > 0.7 {
            1.0
        } else {
            0.0
        }
    }));

    (x, y)
}

fn benchmark_model_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_fit");
    group.sample_size(10);

    let mut params = ModelParams::default();
    params.leaf_wise.n_estimators = 50;
    params.level_wise.n_estimators = 50;
    params.level_wise.early_stopping_rounds = None;
    params.forest.n_estimators = 20;

    for (n_rows, n_features) in [(2_000, 40), (10_000, 80)] {
        let (x, y) = generate_training_data(n_rows, n_features, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        for kind in ModelKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.label(), format!("{}x{}", n_rows, n_features)),
                &(&x, &y),
                |b, (x, y)| {
                    b.iter(|| {
                        let mut model = params.build(kind);
                        let _ = model.fit(black_box(x), black_box(y), None);
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_proba");

    let (x, y) = generate_training_data(10_000, 80, 7);
    let mut params = ModelParams::default();
    params.leaf_wise.n_estimators = 100;
    params.forest.n_estimators = 50;

    for kind in [ModelKind::LeafWiseBoosting, ModelKind::RandomForest] {
        let mut model = params.build(kind);
        if model.fit(&x, &y, None).is_err() {
            continue;
        }
        group.bench_function(kind.label(), |b| {
            b.iter(|| model.predict_proba(black_box(&x)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_model_fit, benchmark_predict);
criterion_main!(benches);
