// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::Point;

/// Linear congruential stream: dense blobs plus rare far-away strays.
///
/// `stray_every` points out of each run land in a region ten times wider,
/// so most of them end up as outliers.
pub fn clustered_stream(
    seed: u64,
    len: usize,
    dimensions: usize,
    stray_every: usize,
) -> Vec<Point> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..len)
        .map(|i| {
            let stray = stray_every > 0 && i % stray_every == stray_every - 1;
            let blob = (next() * 4.0).floor();
            let values: Vec<f64> = (0..dimensions)
                .map(|_| {
                    if stray {
                        next() * 100.0
                    } else {
                        blob * 10.0 + next() * 2.0
                    }
                })
                .collect();
            Point::new(i as i64 + 1, values)
        })
        .collect()
}

/// Benchmark helpers namespace.
pub fn crate_name() -> &'static str {
    let _ = (mcod_core::crate_name(), mcod_online::crate_name());
    "mcod-bench"
}
