// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors surfaced by outlier-detector construction and slide processing.
///
/// Every variant is raised before any detector state is mutated, so a caller
/// that receives an error can keep using the detector as it was.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum McodError {
    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A point does not match the dimensionality fixed for the run.
    #[error("dimension mismatch at arrival_time={arrival_time}: expected {expected}, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        arrival_time: i64,
    },

    /// A point carries no coordinates.
    #[error("point at arrival_time={arrival_time} has no coordinates")]
    EmptyPoint { arrival_time: i64 },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate at arrival_time={arrival_time}, index={index}")]
    NonFiniteCoordinate { arrival_time: i64, index: usize },

    /// Arrival times must be strictly increasing within a run.
    #[error("arrival_time must be strictly increasing: previous={previous}, got={got}")]
    NonMonotonicArrival { previous: i64, got: i64 },

    /// Not enough usable samples to derive a result.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl McodError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    /// True for errors that reject the configuration rather than one input batch.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::DimensionMismatch { .. }
        )
    }
}
