//! Benchmarks for tessera-math operations.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::Rng;
use tessera_math::{
    FitOptions, compound, exp_weights, fit, nan_mean, nan_std, standardize, winsorize_mad,
};

fn random_vec(n: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.r#gen::<f64>() * 0.1 - 0.05).collect()
}

fn random_matrix(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>() * 0.1 - 0.05)
}

fn bench_winsorize_mad(c: &mut Criterion) {
    let mut group = c.benchmark_group("winsorize_mad");

    for size in [100, 1000, 5000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_vec(size);
            b.iter(|| winsorize_mad(black_box(&data), black_box(5.0)));
        });
    }

    group.finish();
}

fn bench_standardize(c: &mut Criterion) {
    let mut group = c.benchmark_group("standardize");

    for size in [100, 1000, 5000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_vec(size);
            b.iter(|| standardize(black_box(&data)));
        });
    }

    group.finish();
}

fn bench_window_reducers(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_reducers");

    for window in [21, 63, 252] {
        let data = random_vec(window);
        group.bench_with_input(BenchmarkId::new("compound", window), &data, |b, data| {
            b.iter(|| compound(black_box(data)));
        });
        group.bench_with_input(BenchmarkId::new("mean_std", window), &data, |b, data| {
            b.iter(|| (nan_mean(black_box(data)), nan_std(black_box(data))));
        });
    }

    group.finish();
}

fn bench_exp_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("exp_weights");

    for (window, half_life) in [(252, 42), (252, 126), (504, 252)] {
        group.bench_with_input(
            BenchmarkId::new("window", format!("{window}_{half_life}")),
            &(window, half_life),
            |b, &(window, half_life)| {
                b.iter(|| exp_weights(black_box(window), black_box(half_life)));
            },
        );
    }

    group.finish();
}

fn bench_weighted_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_fit");
    group.sample_size(50);

    // Rolling beta shape: one regressor, many entity columns sharing the design.
    for (n_obs, n_entities) in [(504, 1), (504, 100), (504, 1000)] {
        group.throughput(Throughput::Elements((n_obs * n_entities) as u64));
        group.bench_with_input(
            BenchmarkId::new("obs_entities", format!("{n_obs}x{n_entities}")),
            &(n_obs, n_entities),
            |b, &(n_obs, n_entities)| {
                let x = random_matrix(n_obs, 1);
                let y = random_matrix(n_obs, n_entities);
                let options = FitOptions::weighted(exp_weights(n_obs, 252));

                b.iter(|| fit(black_box(x.view()), black_box(y.view()), &options).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_robust_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("robust_fit");
    group.sample_size(30);

    for n_obs in [60, 252, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n_obs), &n_obs, |b, &n_obs| {
            let x = random_matrix(n_obs, 2);
            let y = Array2::from_shape_vec((n_obs, 1), random_vec(n_obs)).unwrap();
            let options = FitOptions::weighted(Array1::ones(n_obs)).with_robust(true);

            b.iter(|| fit(black_box(x.view()), black_box(y.view()), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_winsorize_mad,
    bench_standardize,
    bench_window_reducers,
    bench_exp_weights,
    bench_weighted_fit,
    bench_robust_fit,
);

criterion_main!(benches);
