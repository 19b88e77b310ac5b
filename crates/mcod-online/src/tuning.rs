// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::McodConfig;
use mcod_core::{Distance, Euclidean, McodError, Point};
use tracing::debug;

/// Pairs at or below this distance count as duplicates while sizing `R`.
pub const DUPLICATE_DISTANCE_EPSILON: f64 = 1e-8;
/// `R` is this multiple of the largest nearest-neighbor distance.
pub const TUNING_RADIUS_MULTIPLIER: f64 = 4.0;

/// Thresholds derived from a training sample.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunedParameters {
    pub max_distance: f64,
    pub min_neighbor_count: usize,
}

impl TunedParameters {
    /// Copies the tuned thresholds into `config`, keeping its window settings.
    pub fn apply_to(&self, config: McodConfig) -> McodConfig {
        McodConfig {
            max_distance: self.max_distance,
            min_neighbor_count: self.min_neighbor_count,
            ..config
        }
    }
}

/// Derives `R` and `k` from `training` under the Euclidean metric.
pub fn tune_parameters(training: &[Point]) -> Result<TunedParameters, McodError> {
    tune_parameters_with(training, &Euclidean)
}

/// Derives `R` and `k` from `training`.
///
/// `R` is [`TUNING_RADIUS_MULTIPLIER`] times the largest distance from any
/// point to its nearest non-duplicate neighbor; points whose every neighbor is
/// a duplicate do not take part. `k` is the smallest number of other points
/// strictly closer than `R` over the whole sample.
pub fn tune_parameters_with<D: Distance>(
    training: &[Point],
    metric: &D,
) -> Result<TunedParameters, McodError> {
    if training.len() < 2 {
        return Err(McodError::insufficient_data(format!(
            "parameter tuning needs at least 2 points; got {}",
            training.len()
        )));
    }
    let dimensions = training[0].dimensions();
    for point in training {
        point.validate(Some(dimensions))?;
    }

    let mut widest_gap: Option<f64> = None;
    for (i, point) in training.iter().enumerate() {
        let nearest = training
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| metric.distance(point.values(), other.values()))
            .filter(|distance| *distance > DUPLICATE_DISTANCE_EPSILON)
            .min_by(f64::total_cmp);
        if let Some(nearest) = nearest {
            widest_gap = Some(widest_gap.map_or(nearest, |gap| gap.max(nearest)));
        }
    }
    let Some(widest_gap) = widest_gap else {
        return Err(McodError::insufficient_data(
            "parameter tuning needs at least one pair of distinct points",
        ));
    };
    let max_distance = widest_gap * TUNING_RADIUS_MULTIPLIER;

    let min_neighbor_count = training
        .iter()
        .enumerate()
        .map(|(i, point)| {
            training
                .iter()
                .enumerate()
                .filter(|(j, other)| {
                    *j != i && metric.distance(point.values(), other.values()) < max_distance
                })
                .count()
        })
        .min()
        .unwrap_or(0);
    if min_neighbor_count == 0 {
        return Err(McodError::invalid_config(format!(
            "tuned min_neighbor_count must be > 0; got 0 at max_distance={max_distance}"
        )));
    }

    debug!(
        points = training.len(),
        max_distance, min_neighbor_count, "tuned outlier thresholds"
    );
    Ok(TunedParameters {
        max_distance,
        min_neighbor_count,
    })
}

#[cfg(test)]
mod tests {
    use super::{TunedParameters, tune_parameters, tune_parameters_with};
    use crate::config::McodConfig;
    use mcod_core::{Distance, McodError, Point};

    fn sample(rows: &[&[f64]]) -> Vec<Point> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| Point::new(i as i64 + 1, row.to_vec()))
            .collect()
    }

    #[test]
    fn evenly_spaced_line_yields_four_gaps_and_full_neighborhoods() {
        let tuned = tune_parameters(&sample(&[&[0.0], &[1.0], &[2.0], &[3.0]]))
            .expect("tuning should succeed");
        assert_eq!(tuned.max_distance, 4.0);
        assert_eq!(tuned.min_neighbor_count, 3);
    }

    #[test]
    fn duplicates_are_ignored_when_sizing_radius() {
        let tuned = tune_parameters(&sample(&[&[0.0, 0.0], &[0.0, 0.0], &[0.5, 0.0], &[9.0, 0.0]]))
            .expect("tuning should succeed");
        // 9.0 is 8.5 away from its nearest distinct neighbor.
        assert_eq!(tuned.max_distance, 34.0);
        assert_eq!(tuned.min_neighbor_count, 3);
    }

    #[test]
    fn radius_excludes_points_exactly_at_the_boundary() {
        // Gaps 1 and 3; R = 12 puts 0 and 12 exactly on the boundary.
        let tuned = tune_parameters(&sample(&[&[0.0], &[1.0], &[12.0], &[9.0]]))
            .expect("tuning should succeed");
        assert_eq!(tuned.max_distance, 12.0);
        assert_eq!(tuned.min_neighbor_count, 2);
    }

    #[test]
    fn too_few_or_only_duplicate_points_are_rejected() {
        let err = tune_parameters(&sample(&[&[1.0]])).expect_err("one point is not enough");
        assert!(matches!(err, McodError::InsufficientData(_)));

        let err = tune_parameters(&sample(&[&[1.0], &[1.0], &[1.0]]))
            .expect_err("duplicates carry no spacing information");
        assert!(matches!(err, McodError::InsufficientData(_)));
    }

    #[test]
    fn inconsistent_rows_are_rejected() {
        let err = tune_parameters(&sample(&[&[1.0], &[1.0, 2.0]]))
            .expect_err("rows must share dimensionality");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn custom_metric_is_honored() {
        #[derive(Clone, Debug)]
        struct Manhattan;
        impl Distance for Manhattan {
            fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
                a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
            }
        }

        let tuned = tune_parameters_with(
            &sample(&[&[0.0, 0.0], &[1.0, 1.0], &[2.0, 2.0]]),
            &Manhattan,
        )
        .expect("tuning should succeed");
        assert_eq!(tuned.max_distance, 8.0);
        assert_eq!(tuned.min_neighbor_count, 2);
    }

    #[test]
    fn apply_to_keeps_window_settings() {
        let tuned = TunedParameters {
            max_distance: 2.5,
            min_neighbor_count: 7,
        };
        let base = McodConfig {
            window_size: 40,
            slide: 8,
            ..McodConfig::default()
        };
        let config = tuned.apply_to(base);
        assert_eq!(config.max_distance, 2.5);
        assert_eq!(config.min_neighbor_count, 7);
        assert_eq!(config.window_size, 40);
        assert_eq!(config.slide, 8);
        config.validate().expect("tuned config should be valid");
    }
}
