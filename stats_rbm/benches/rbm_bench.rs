use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use stats_rbm::partition::all_patterns;
use stats_rbm::*;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(0);
    let params = RbmParams::random(20, 10, 0.5, &mut rng);

    c.bench_function("Exact log Z vectorized 20x10", |b| {
        b.iter(|| black_box(&params).log_z(Strategy::Vectorized))
    });
    c.bench_function("Exact log Z serial 20x10", |b| {
        b.iter(|| black_box(&params).log_z(Strategy::Serial))
    });

    let data = all_patterns(8).unwrap();
    let small = RbmParams::random(8, 6, 0.5, &mut rng);
    c.bench_function("KL divergence 8x6", |b| {
        b.iter(|| small.kl_divergence_from(black_box(data.view()), Strategy::Vectorized))
    });
}

fn fisher_information_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("fisher_information");
    let mut rng = SmallRng::seed_from_u64(1);
    for nhid in [2usize, 4, 8].iter() {
        let params = RbmParams::random(8, *nhid, 0.5, &mut rng);
        let rows: Vec<Array1<f64>> = GibbsSampler::new(&params, SmallRng::seed_from_u64(2))
            .take(1000)
            .collect();
        let sample = Array2::from_shape_fn((1000, 8 + nhid), |(i, j)| rows[i][j]);
        group.bench_with_input(BenchmarkId::new("vectorized", nhid), &sample, |b, sample| {
            b.iter(|| fim_vectorized(sample.view(), 8))
        });
        group.bench_with_input(BenchmarkId::new("streaming", nhid), &sample, |b, sample| {
            b.iter(|| fim_streaming(sample.outer_iter(), 8))
        });
        let fim = fim_vectorized(sample.view(), 8).unwrap();
        group.bench_with_input(BenchmarkId::new("spectrum", nhid), &fim, |b, fim| {
            b.iter(|| fim_spectrum(fim.view(), 8, true))
        });
    }
    group.finish();
}

fn unique_rows(c: &mut Criterion) {
    let data = Array2::from_shape_fn((10_000, 16), |(i, j)| (i * 2654435761 >> j) % 3 == 0);
    c.bench_function("Unique rows 10000x16", |b| {
        b.iter(|| unique(black_box(&data), Axis(0)))
    });
}

criterion_group!(benches, criterion_benchmark, fisher_information_strategies, unique_rows);
criterion_main!(benches);
