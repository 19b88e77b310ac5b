// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use mcod_bench::clustered_stream;
use mcod_core::StreamingOutlierDetector;
use mcod_online::{McodConfig, McodDetector};

fn bench_sliding(c: &mut Criterion, case_id: &str, n: usize, window_size: i64, slide: i64) {
    let points = clustered_stream(42, n, 2, 50);
    let config = McodConfig {
        max_distance: 1.0,
        min_neighbor_count: 10,
        window_size,
        slide,
        ..McodConfig::default()
    };

    c.bench_function(case_id, |b| {
        b.iter_batched(
            || McodDetector::new(config.clone()).expect("benchmark config should be valid"),
            |mut detector| {
                for batch in points.chunks(slide as usize) {
                    let current_time = batch.last().map_or(0, |p| p.arrival_time());
                    detector
                        .detect_outliers(black_box(batch), current_time)
                        .expect("sliding benchmark slide should succeed");
                }
                detector
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_sliding_n1e4_w1000_s100(c: &mut Criterion) {
    bench_sliding(c, "mcod_sliding_n1e4_w1000_s100", 10_000, 1_000, 100);
}

fn benchmark_sliding_n1e4_w1000_s10(c: &mut Criterion) {
    bench_sliding(c, "mcod_sliding_n1e4_w1000_s10", 10_000, 1_000, 10);
}

criterion_group!(
    benches,
    benchmark_sliding_n1e4_w1000_s100,
    benchmark_sliding_n1e4_w1000_s10
);
criterion_main!(benches);
