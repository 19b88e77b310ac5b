// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::arena::PendingState;
use std::fmt;

/// Point-in-time summary of one engine instance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineStats {
    /// Live points in the current window.
    pub window_points: usize,
    pub clusters: usize,
    /// Live points held by micro-clusters, centers included.
    pub clustered_points: usize,
    pub pending_points: usize,
    /// Pending points waiting in the expiry queue.
    pub queued_points: usize,
    pub outliers: usize,
    /// Mean tracked-expiry count over pending points; zero when none are pending.
    pub mean_pending_expiries: f64,
    pub slides_processed: u64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window={} clusters={} clustered={} pending={} queued={} outliers={} mean_exps={:.3}",
            self.window_points,
            self.clusters,
            self.clustered_points,
            self.pending_points,
            self.queued_points,
            self.outliers,
            self.mean_pending_expiries
        )
    }
}

pub(crate) fn mean_expiries<'a>(pending: impl Iterator<Item = &'a PendingState>) -> f64 {
    let (count, total) = pending.fold((0usize, 0usize), |(count, total), state| {
        (count + 1, total + state.expiries().len())
    });
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineStats, mean_expiries};
    use crate::arena::PendingState;

    #[test]
    fn mean_expiries_is_zero_for_empty_pending_set() {
        assert_eq!(mean_expiries(std::iter::empty()), 0.0);
    }

    #[test]
    fn mean_expiries_averages_tracked_entries() {
        let mut a = PendingState::default();
        a.push_expiry(10);
        a.push_expiry(11);
        let b = PendingState::default();
        assert_eq!(mean_expiries([&a, &b].into_iter()), 1.0);
    }

    #[test]
    fn display_lists_every_counter() {
        let stats = EngineStats {
            window_points: 12,
            clusters: 1,
            clustered_points: 9,
            pending_points: 3,
            queued_points: 1,
            outliers: 2,
            mean_pending_expiries: 0.5,
            slides_processed: 4,
        };
        assert_eq!(
            stats.to_string(),
            "window=12 clusters=1 clustered=9 pending=3 queued=1 outliers=2 mean_exps=0.500"
        );
    }
}
