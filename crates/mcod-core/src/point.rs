// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::McodError;
use std::fmt;
use std::sync::Arc;

/// One arriving observation: coordinates plus a unique, increasing arrival time.
///
/// Coordinates are shared behind an `Arc` so the engine, the metric index and
/// returned outlier snapshots can hold the same point without copying.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    arrival_time: i64,
    values: Arc<[f64]>,
}

impl Point {
    pub fn new(arrival_time: i64, values: impl Into<Arc<[f64]>>) -> Self {
        Self {
            arrival_time,
            values: values.into(),
        }
    }

    pub fn arrival_time(&self) -> i64 {
        self.arrival_time
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Shared handle to the coordinates; cloning it does not copy them.
    pub fn shared_values(&self) -> Arc<[f64]> {
        Arc::clone(&self.values)
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Checks that the point is non-empty, finite and, when `expected` is set,
    /// of the given dimensionality.
    pub fn validate(&self, expected: Option<usize>) -> Result<(), McodError> {
        if self.values.is_empty() {
            return Err(McodError::EmptyPoint {
                arrival_time: self.arrival_time,
            });
        }
        if let Some(expected) = expected
            && expected != self.values.len()
        {
            return Err(McodError::DimensionMismatch {
                expected,
                got: self.values.len(),
                arrival_time: self.arrival_time,
            });
        }
        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(McodError::NonFiniteCoordinate {
                arrival_time: self.arrival_time,
                index,
            });
        }
        Ok(())
    }
}

/// Stable handle of a point inside one detector's window arena.
///
/// Handles are issued in arrival order and never reused within a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
