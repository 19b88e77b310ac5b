// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{McodError, Point};

/// Streaming outlier detector contract: stateful, slide-at-a-time.
pub trait StreamingOutlierDetector {
    type State: Clone + std::fmt::Debug;

    fn reset(&mut self);

    /// Advances the window to `current_time`, ingests `new_points` and returns
    /// the outliers currently flagged, in flagging order.
    fn detect_outliers(
        &mut self,
        new_points: &[Point],
        current_time: i64,
    ) -> Result<Vec<Point>, McodError>;

    /// Current outlier snapshot without advancing the window.
    fn outliers(&self) -> Vec<Point>;

    fn save_state(&self) -> Self::State;
    fn load_state(&mut self, state: &Self::State);

    /// Default multi-slide path implemented on top of `detect_outliers`.
    fn detect_slides<'a, I>(&mut self, slides: I) -> Result<Vec<Vec<Point>>, McodError>
    where
        I: IntoIterator<Item = (&'a [Point], i64)>,
    {
        let mut out = Vec::new();
        for (points, current_time) in slides {
            out.push(self.detect_outliers(points, current_time)?);
        }
        Ok(out)
    }
}
