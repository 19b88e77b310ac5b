// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use mcod_core::{Point, StreamingOutlierDetector};
use mcod_online::{McodConfig, McodDetector, SlideDriver};

fn build_coordinate(mode_seed: u8, raw_seed: i16) -> f64 {
    match mode_seed % 8 {
        0 => f64::NAN,
        1 => f64::INFINITY,
        2 => 0.0,
        _ => f64::from(raw_seed) / 64.0,
    }
}

fn build_config(cursor: &mut common::ByteCursor<'_>) -> McodConfig {
    let window_size = i64::from(cursor.next_u8() % 32);
    let slide = i64::from(cursor.next_u8() % 32);
    McodConfig {
        max_distance: f64::from(cursor.next_u8()) / 32.0,
        min_neighbor_count: usize::from(cursor.next_u8() % 8),
        window_size,
        slide,
        dimensions: match cursor.next_u8() % 4 {
            0 => None,
            seed => Some(usize::from(seed)),
        },
        cluster_formation_factor: 0.5 + f64::from(cursor.next_u8() % 16) / 8.0,
        propagation_radius_factor: 1.0 + f64::from(cursor.next_u8() % 16) / 8.0,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let config = build_config(&mut cursor);

    let Ok(mut detector) = McodDetector::new(config.clone()) else {
        return;
    };

    let steps = common::bounded(cursor.next_u8(), 1, 48);
    let mut arrival = i64::from(cursor.next_i16());
    let mut current_time = arrival;

    for _ in 0..steps {
        let op_seed = cursor.next_u8();
        if op_seed % 13 == 0 {
            detector.reset();
            continue;
        }
        if op_seed % 17 == 0 {
            let snapshot = detector.save_state();
            detector.load_state(&snapshot);
            continue;
        }

        let batch_len = common::bounded(cursor.next_u8(), 0, 12);
        let mut batch = Vec::with_capacity(batch_len);
        for _ in 0..batch_len {
            let dims = common::bounded(cursor.next_u8(), 0, 3);
            let values: Vec<f64> = (0..dims)
                .map(|_| build_coordinate(cursor.next_u8(), cursor.next_i16()))
                .collect();
            // Mostly increasing arrivals, with occasional replays.
            let step = i64::from(cursor.next_u8() % 4);
            arrival = if op_seed % 7 == 0 {
                arrival.saturating_sub(step)
            } else {
                arrival.saturating_add(step.max(1))
            };
            batch.push(Point::new(arrival, values));
        }

        current_time = current_time.max(arrival).saturating_add(i64::from(cursor.next_u8() % 3));
        if detector.detect_outliers(&batch, current_time).is_ok() {
            let _ = detector.outliers();
            let _ = detector.stats();
        }
    }

    if let Ok(mut driver) = SlideDriver::new(detector) {
        for _ in 0..common::bounded(cursor.next_u8(), 0, 16) {
            let values = vec![f64::from(cursor.next_i16()) / 64.0; 2];
            let _ = driver.push_values(values);
        }
        let _ = driver.finish();
    }
});
