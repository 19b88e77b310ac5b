// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

mod arena;
mod clusters;
pub mod config;
pub mod driver;
mod event_queue;
pub mod mcod;
mod outliers;
pub mod stats;
pub mod tuning;

pub use arena::{PendingState, Role};
pub use clusters::MicroCluster;
pub use config::{
    DEFAULT_CLUSTER_FORMATION_FACTOR, DEFAULT_PROPAGATION_RADIUS_FACTOR,
    MIN_CLUSTER_FORMATION_FACTOR, MIN_PROPAGATION_RADIUS_FACTOR, McodConfig, WindowMode,
};
pub use driver::{SlideDriver, SlideReport};
pub use mcod::{MCOD_DETECTOR_ID, McodDetector, McodState};
pub use stats::EngineStats;
pub use tuning::{TunedParameters, tune_parameters, tune_parameters_with};

/// Continuous outlier detection namespace.
pub fn crate_name() -> &'static str {
    let _ = mcod_core::crate_name();
    "mcod-online"
}
