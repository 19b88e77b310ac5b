// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]
#![allow(dead_code)]

use mcod_core::{Distance, Euclidean, Point};
use mcod_online::McodConfig;
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per binary; `RUST_LOG` selects verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Arrival times of the points that a full rescan of the window flags.
pub fn brute_force_outliers(
    history: &[Point],
    current_time: i64,
    config: &McodConfig,
) -> BTreeSet<i64> {
    let live: Vec<&Point> = history
        .iter()
        .filter(|point| {
            point.arrival_time() > current_time - config.window_size
                && point.arrival_time() <= current_time
        })
        .collect();

    live.iter()
        .filter(|point| {
            let neighbors = live
                .iter()
                .filter(|other| {
                    other.arrival_time() != point.arrival_time()
                        && Euclidean.distance(point.values(), other.values())
                            <= config.max_distance
                })
                .count();
            neighbors < config.min_neighbor_count
        })
        .map(|point| point.arrival_time())
        .collect()
}

pub fn arrival_set(points: &[Point]) -> BTreeSet<i64> {
    points.iter().map(Point::arrival_time).collect()
}

/// Points with consecutive arrival times starting at `first_arrival`.
pub fn sequence(first_arrival: i64, rows: &[&[f64]]) -> Vec<Point> {
    rows.iter()
        .enumerate()
        .map(|(offset, row)| Point::new(first_arrival + offset as i64, row.to_vec()))
        .collect()
}
