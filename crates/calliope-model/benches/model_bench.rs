//! Criterion benchmarks for calliope-model: per-code training, prediction and selection.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use calliope_model::{Penalty, SelectionConfig, TrainerConfig};

/// Sparse count features; code k follows feature k.
fn make_messages(
    n_samples: usize,
    n_features: usize,
    n_codes: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<Vec<bool>>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features)
            .map(|_| if rng.r#gen::<f64>() < 0.05 { 1.0 } else { 0.0 })
            .collect();
        labels.push((0..n_codes).map(|k| row[k] > 0.0).collect());
        features.push(row);
    }
    let names: Vec<String> = (0..n_codes).map(|k| format!("code{k}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_messages(1000, 500, 8, 42);
    let cfg = TrainerConfig::new(Penalty::L2, 1.0).unwrap();

    c.bench_function("train_1000x500_8codes_l2", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names, None).unwrap());
    });
}

fn bench_train_l1(c: &mut Criterion) {
    let (features, labels, names) = make_messages(1000, 500, 8, 42);
    let cfg = TrainerConfig::new(Penalty::L1, 1.0).unwrap();

    c.bench_function("train_1000x500_8codes_l1", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names, None).unwrap());
    });
}

fn bench_predict(c: &mut Criterion) {
    let (features, labels, names) = make_messages(1000, 500, 8, 42);
    let set = TrainerConfig::new(Penalty::L2, 1.0)
        .unwrap()
        .fit(&features, &labels, &names, None)
        .unwrap()
        .into_classifiers();

    c.bench_function("predict_1000x500_8codes", |b| {
        b.iter(|| set.predict(&features).unwrap());
    });
}

fn bench_select(c: &mut Criterion) {
    let (features, labels, names) = make_messages(1000, 500, 8, 42);
    let set = TrainerConfig::new(Penalty::L2, 1.0)
        .unwrap()
        .fit(&features, &labels, &names, None)
        .unwrap()
        .into_classifiers();
    let selector = SelectionConfig::new();

    c.bench_function("select_top100_of_1000", |b| {
        b.iter(|| selector.select(set.slots(), &features, 100).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_train_l1, bench_predict, bench_select);
criterion_main!(benches);
