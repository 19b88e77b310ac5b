// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::McodError;

/// Pending neighbors within `R/2` must reach `factor * k` before a cluster forms.
pub const DEFAULT_CLUSTER_FORMATION_FACTOR: f64 = 1.1;
/// Below this a freshly formed cluster could hold fewer than `k + 1` points.
pub const MIN_CLUSTER_FORMATION_FACTOR: f64 = 1.0;
/// Clusters whose center lies within `factor * R` are tracked in a pending point's `Rmc`.
pub const DEFAULT_PROPAGATION_RADIUS_FACTOR: f64 = 1.5;
/// Smallest propagation factor that still covers every cluster able to hold a neighbor.
pub const MIN_PROPAGATION_RADIUS_FACTOR: f64 = 1.5;

/// Window semantics selected by the slide/window ratio.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowMode {
    /// `slide < window_size`: state carries across slides, expired points are purged.
    Sliding,
    /// `slide == window_size`: every call starts from an empty window.
    Tumbling,
}

impl WindowMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sliding => "sliding",
            Self::Tumbling => "tumbling",
        }
    }
}

/// MCOD configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct McodConfig {
    /// Neighbor distance threshold `R` (inclusive).
    pub max_distance: f64,
    /// Neighbor-count threshold `k`; fewer than `k` neighbors means outlier.
    pub min_neighbor_count: usize,
    /// Window length `W` in arrival-time units.
    pub window_size: i64,
    pub slide: i64,
    /// Fixed dimensionality; `None` lets the first point decide.
    pub dimensions: Option<usize>,
    pub cluster_formation_factor: f64,
    pub propagation_radius_factor: f64,
}

impl Default for McodConfig {
    fn default() -> Self {
        Self {
            max_distance: 1.0,
            min_neighbor_count: 30,
            window_size: 1_000,
            slide: 500,
            dimensions: None,
            cluster_formation_factor: DEFAULT_CLUSTER_FORMATION_FACTOR,
            propagation_radius_factor: DEFAULT_PROPAGATION_RADIUS_FACTOR,
        }
    }
}

impl McodConfig {
    pub fn validate(&self) -> Result<(), McodError> {
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(McodError::invalid_config(format!(
                "max_distance must be finite and > 0; got {}",
                self.max_distance
            )));
        }
        if self.min_neighbor_count == 0 {
            return Err(McodError::invalid_config(
                "min_neighbor_count must be > 0; got 0",
            ));
        }
        if self.window_size <= 0 {
            return Err(McodError::invalid_config(format!(
                "window_size must be > 0; got {}",
                self.window_size
            )));
        }
        if self.slide <= 0 || self.slide > self.window_size {
            return Err(McodError::invalid_config(format!(
                "slide must be in 1..=window_size ({}); got {}",
                self.window_size, self.slide
            )));
        }
        if self.dimensions == Some(0) {
            return Err(McodError::invalid_config("dimensions must be > 0 when set"));
        }
        if !self.cluster_formation_factor.is_finite()
            || self.cluster_formation_factor < MIN_CLUSTER_FORMATION_FACTOR
        {
            return Err(McodError::invalid_config(format!(
                "cluster_formation_factor must be finite and >= {MIN_CLUSTER_FORMATION_FACTOR}; got {}",
                self.cluster_formation_factor
            )));
        }
        if !self.propagation_radius_factor.is_finite()
            || self.propagation_radius_factor < MIN_PROPAGATION_RADIUS_FACTOR
        {
            return Err(McodError::invalid_config(format!(
                "propagation_radius_factor must be finite and >= {MIN_PROPAGATION_RADIUS_FACTOR}; got {}",
                self.propagation_radius_factor
            )));
        }
        Ok(())
    }

    pub fn window_mode(&self) -> WindowMode {
        if self.slide == self.window_size {
            WindowMode::Tumbling
        } else {
            WindowMode::Sliding
        }
    }

    /// Cluster radius `R/2`.
    pub fn cluster_radius(&self) -> f64 {
        self.max_distance / 2.0
    }

    pub fn propagation_radius(&self) -> f64 {
        self.max_distance * self.propagation_radius_factor
    }

    /// Minimum number of pending `R/2`-neighbors needed to form a cluster.
    pub fn formation_threshold(&self) -> f64 {
        self.cluster_formation_factor * self.min_neighbor_count as f64
    }

    /// Time at which a point arriving at `arrival_time` leaves the window.
    pub(crate) fn expiry_of(&self, arrival_time: i64) -> i64 {
        arrival_time.saturating_add(self.window_size)
    }
}

#[cfg(test)]
mod tests {
    use super::{McodConfig, WindowMode};

    #[test]
    fn default_config_is_valid_sliding() {
        let config = McodConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.window_mode(), WindowMode::Sliding);
        assert_eq!(config.cluster_radius(), 0.5);
        assert_eq!(config.propagation_radius(), 1.5);
        assert!((config.formation_threshold() - 33.0).abs() < 1e-9);
    }

    #[test]
    fn slide_equal_to_window_selects_tumbling() {
        let config = McodConfig {
            window_size: 10,
            slide: 10,
            ..McodConfig::default()
        };
        config.validate().expect("config should be valid");
        assert_eq!(config.window_mode(), WindowMode::Tumbling);
        assert_eq!(config.window_mode().as_str(), "tumbling");
    }

    #[test]
    fn validation_rejects_non_positive_thresholds() {
        let cases = [
            (
                McodConfig {
                    max_distance: 0.0,
                    ..McodConfig::default()
                },
                "max_distance",
            ),
            (
                McodConfig {
                    max_distance: f64::NAN,
                    ..McodConfig::default()
                },
                "max_distance",
            ),
            (
                McodConfig {
                    min_neighbor_count: 0,
                    ..McodConfig::default()
                },
                "min_neighbor_count",
            ),
            (
                McodConfig {
                    window_size: 0,
                    ..McodConfig::default()
                },
                "window_size",
            ),
            (
                McodConfig {
                    slide: 0,
                    ..McodConfig::default()
                },
                "slide",
            ),
            (
                McodConfig {
                    slide: 1_001,
                    ..McodConfig::default()
                },
                "slide",
            ),
            (
                McodConfig {
                    dimensions: Some(0),
                    ..McodConfig::default()
                },
                "dimensions",
            ),
            (
                McodConfig {
                    cluster_formation_factor: 0.9,
                    ..McodConfig::default()
                },
                "cluster_formation_factor",
            ),
            (
                McodConfig {
                    propagation_radius_factor: 1.2,
                    ..McodConfig::default()
                },
                "propagation_radius_factor",
            ),
        ];

        for (config, field) in cases {
            let err = config.validate().expect_err("config should be rejected");
            assert!(err.is_configuration_error());
            assert!(
                err.to_string().contains(field),
                "error `{err}` should mention {field}"
            );
        }
    }

    #[test]
    fn expiry_is_arrival_plus_window_for_any_origin() {
        let config = McodConfig {
            window_size: 10,
            slide: 5,
            ..McodConfig::default()
        };
        assert_eq!(config.expiry_of(6), 16);
        assert_eq!(config.expiry_of(0), 10);
        assert_eq!(config.expiry_of(-7), 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde_fills_missing_fields_from_defaults() {
        let decoded: McodConfig =
            serde_json::from_str(r#"{"max_distance": 2.5, "min_neighbor_count": 4}"#)
                .expect("partial config should deserialize");
        assert_eq!(decoded.max_distance, 2.5);
        assert_eq!(decoded.min_neighbor_count, 4);
        assert_eq!(decoded.window_size, McodConfig::default().window_size);
        decoded.validate().expect("decoded config should be valid");
    }
}
