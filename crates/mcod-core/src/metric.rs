// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::PointId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Distance contract shared by the index and the engine's pairwise checks.
pub trait Distance: Clone + std::fmt::Debug + Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Euclidean (L2) distance over equal-length coordinate slices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Euclidean;

impl Distance for Euclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

/// Result entry of an index query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: PointId,
    pub distance: f64,
}

/// Metric index used for nearest-center and radius queries.
///
/// The engine only relies on this contract; any metric tree that honors it
/// can replace the linear scan below.
pub trait MetricIndex: Clone + std::fmt::Debug {
    fn insert(&mut self, id: PointId, values: Arc<[f64]>);
    fn remove(&mut self, id: PointId) -> bool;
    fn clear(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance under the index's own metric.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Closest indexed entry; ties resolve to the lowest id.
    fn nearest(&self, query: &[f64]) -> Option<Neighbor>;

    /// All entries with `distance <= radius`, ordered by id.
    fn within(&self, query: &[f64], radius: f64) -> Vec<Neighbor>;
}

/// Exhaustive index: O(n) queries, deterministic iteration order.
#[derive(Clone, Debug, Default)]
pub struct LinearScanIndex<D: Distance = Euclidean> {
    metric: D,
    entries: BTreeMap<PointId, Arc<[f64]>>,
}

impl<D: Distance> LinearScanIndex<D> {
    pub fn new(metric: D) -> Self {
        Self {
            metric,
            entries: BTreeMap::new(),
        }
    }

    pub fn metric(&self) -> &D {
        &self.metric
    }
}

impl<D: Distance> MetricIndex for LinearScanIndex<D> {
    fn insert(&mut self, id: PointId, values: Arc<[f64]>) {
        self.entries.insert(id, values);
    }

    fn remove(&mut self, id: PointId) -> bool {
        self.entries.remove(&id).is_some()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.metric.distance(a, b)
    }

    fn nearest(&self, query: &[f64]) -> Option<Neighbor> {
        let mut best: Option<Neighbor> = None;
        for (id, values) in &self.entries {
            let distance = self.metric.distance(query, values);
            if best.is_none_or(|current| distance < current.distance) {
                best = Some(Neighbor { id: *id, distance });
            }
        }
        best
    }

    fn within(&self, query: &[f64], radius: f64) -> Vec<Neighbor> {
        self.entries
            .iter()
            .filter_map(|(id, values)| {
                let distance = self.metric.distance(query, values);
                (distance <= radius).then_some(Neighbor { id: *id, distance })
            })
            .collect()
    }
}
