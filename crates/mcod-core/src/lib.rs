// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod detectors;
pub mod error;
pub mod metric;
pub mod point;

pub use detectors::StreamingOutlierDetector;
pub use error::McodError;
pub use metric::{Distance, Euclidean, LinearScanIndex, MetricIndex, Neighbor};
pub use point::{Point, PointId};

/// Core shared types and traits for continuous outlier detection.
pub fn crate_name() -> &'static str {
    "mcod-core"
}
