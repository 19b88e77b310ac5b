// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::mcod::McodDetector;
use mcod_core::{LinearScanIndex, McodError, MetricIndex, Point, StreamingOutlierDetector};
use std::sync::Arc;

/// Outcome of one flushed slide.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideReport {
    /// Arrival time of the last point in the slide.
    pub current_time: i64,
    pub ingested: usize,
    pub outliers: Vec<Point>,
}

/// Count-based batching in front of an [`McodDetector`].
///
/// Points are buffered until `slide` of them have arrived, then handed to the
/// detector in one call with `current_time` set to the last arrival. Arrival
/// times are generated from 1 unless the caller supplies its own.
#[derive(Clone, Debug)]
pub struct SlideDriver<I: MetricIndex = LinearScanIndex> {
    detector: McodDetector<I>,
    batch_len: usize,
    buffer: Vec<Point>,
    next_arrival: i64,
    last_buffered: Option<i64>,
}

impl<I: MetricIndex> SlideDriver<I> {
    pub fn new(detector: McodDetector<I>) -> Result<Self, McodError> {
        let slide = detector.config().slide;
        let batch_len = usize::try_from(slide).map_err(|_| {
            McodError::invalid_config(format!("slide must fit in usize; got {slide}"))
        })?;
        let next_arrival = detector
            .state()
            .last_arrival()
            .map_or(1, |last| last.saturating_add(1));
        Ok(Self {
            detector,
            batch_len,
            buffer: Vec::with_capacity(batch_len),
            next_arrival,
            last_buffered: None,
        })
    }

    pub fn detector(&self) -> &McodDetector<I> {
        &self.detector
    }

    pub fn into_inner(self) -> McodDetector<I> {
        self.detector
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a point with the next generated arrival time.
    pub fn push_values(
        &mut self,
        values: impl Into<Arc<[f64]>>,
    ) -> Result<Option<SlideReport>, McodError> {
        let point = Point::new(self.next_arrival, values);
        self.push_point(point)
    }

    /// Appends a point with a caller-chosen arrival time.
    ///
    /// The point is checked before it is buffered; a rejected point leaves the
    /// buffer unchanged.
    pub fn push_point(&mut self, point: Point) -> Result<Option<SlideReport>, McodError> {
        let dimensions = self
            .buffer
            .first()
            .map(Point::dimensions)
            .or(self.detector.dimensions());
        point.validate(dimensions)?;
        let previous = self.last_buffered.or(self.detector.state().last_arrival());
        if let Some(previous) = previous
            && point.arrival_time() <= previous
        {
            return Err(McodError::NonMonotonicArrival {
                previous,
                got: point.arrival_time(),
            });
        }

        self.last_buffered = Some(point.arrival_time());
        self.next_arrival = point.arrival_time().saturating_add(1);
        self.buffer.push(point);
        if self.buffer.len() >= self.batch_len {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    /// Flushes a trailing partial slide, if any.
    pub fn finish(&mut self) -> Result<Option<SlideReport>, McodError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    fn flush(&mut self) -> Result<SlideReport, McodError> {
        let batch = std::mem::take(&mut self.buffer);
        let Some(current_time) = batch.last().map(Point::arrival_time) else {
            return Ok(SlideReport {
                current_time: self.detector.state().current_time().unwrap_or(0),
                ingested: 0,
                outliers: self.detector.outliers(),
            });
        };
        match self.detector.detect_outliers(&batch, current_time) {
            Ok(outliers) => {
                self.last_buffered = None;
                self.buffer = Vec::with_capacity(self.batch_len);
                Ok(SlideReport {
                    current_time,
                    ingested: batch.len(),
                    outliers,
                })
            }
            Err(err) => {
                self.buffer = batch;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SlideDriver;
    use crate::config::McodConfig;
    use crate::mcod::McodDetector;
    use mcod_core::{McodError, Point};

    fn driver(window_size: i64, slide: i64) -> SlideDriver {
        let detector = McodDetector::new(McodConfig {
            max_distance: 1.0,
            min_neighbor_count: 2,
            window_size,
            slide,
            ..McodConfig::default()
        })
        .expect("config should be valid");
        SlideDriver::new(detector).expect("driver should build")
    }

    #[test]
    fn flushes_every_slide_with_generated_arrivals() {
        let mut driver = driver(6, 3);
        assert!(driver.push_values(vec![0.0]).expect("push").is_none());
        assert!(driver.push_values(vec![0.1]).expect("push").is_none());
        let report = driver
            .push_values(vec![7.0])
            .expect("push")
            .expect("third point completes the slide");

        assert_eq!(report.current_time, 3);
        assert_eq!(report.ingested, 3);
        let flagged: Vec<_> = report.outliers.iter().map(Point::arrival_time).collect();
        assert_eq!(flagged, vec![1, 2, 3]);
        assert_eq!(driver.buffered(), 0);
        assert_eq!(driver.detector().state().last_arrival(), Some(3));
    }

    #[test]
    fn finish_flushes_partial_slide_once() {
        let mut driver = driver(6, 3);
        driver.push_values(vec![0.0]).expect("push");
        driver.push_values(vec![0.1]).expect("push");
        let report = driver
            .finish()
            .expect("finish")
            .expect("partial slide should flush");
        assert_eq!(report.current_time, 2);
        assert_eq!(report.ingested, 2);
        assert!(driver.finish().expect("finish").is_none());
    }

    #[test]
    fn explicit_arrivals_continue_generated_sequence() {
        let mut driver = driver(6, 3);
        driver.push_point(Point::new(10, vec![0.0])).expect("push");
        driver.push_values(vec![0.1]).expect("push");
        let err = driver
            .push_point(Point::new(11, vec![0.2]))
            .expect_err("arrival 11 was already generated");
        assert_eq!(
            err,
            McodError::NonMonotonicArrival {
                previous: 11,
                got: 11
            }
        );
        assert_eq!(driver.buffered(), 2);
    }

    #[test]
    fn rejected_point_is_not_buffered() {
        let mut driver = driver(6, 3);
        driver.push_values(vec![0.0, 0.0]).expect("push");
        let err = driver
            .push_values(vec![1.0])
            .expect_err("dimension mismatch should be rejected");
        assert!(err.is_configuration_error());
        let err = driver
            .push_values(vec![f64::INFINITY, 0.0])
            .expect_err("non-finite coordinate should be rejected");
        assert!(matches!(err, McodError::NonFiniteCoordinate { .. }));
        assert_eq!(driver.buffered(), 1);
    }

    #[test]
    fn tumbling_driver_flushes_whole_windows() {
        let mut driver = driver(2, 2);
        driver.push_values(vec![0.0]).expect("push");
        let report = driver
            .push_values(vec![0.5])
            .expect("push")
            .expect("window complete");
        assert_eq!(report.outliers.len(), 2);
        let report = driver
            .push_values(vec![3.0])
            .expect("push");
        assert!(report.is_none());
        assert_eq!(driver.detector().stats().window_points, 2);
    }
}
