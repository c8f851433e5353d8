//! Benchmarks for the moving-average baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use triarb_core::traits::Indicator;
use triarb_indicators::{moving_average, Sma};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [20, 1000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("series", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("latest", size), &data, |b, data| {
            b.iter(|| moving_average(black_box(data), black_box(20)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sma);
criterion_main!(benches);
