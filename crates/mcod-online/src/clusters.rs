// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::{MetricIndex, Neighbor, PointId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One micro-cluster: every member lies within `R/2` of `center`.
///
/// `center` keeps the coordinates of the founding point, so the cluster stays
/// addressable after that point itself leaves the window.
#[derive(Clone, Debug, PartialEq)]
pub struct MicroCluster {
    pub(crate) center: Arc<[f64]>,
    pub(crate) members: BTreeSet<PointId>,
}

impl MicroCluster {
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Live members, including the center point while it is in the window.
    pub fn members(&self) -> &BTreeSet<PointId> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Cluster table keyed by center id, with centers mirrored into a metric index.
#[derive(Clone, Debug)]
pub(crate) struct ClusterTable<I: MetricIndex> {
    index: I,
    clusters: BTreeMap<PointId, MicroCluster>,
}

impl<I: MetricIndex> ClusterTable<I> {
    pub(crate) fn new(mut index: I) -> Self {
        index.clear();
        Self {
            index,
            clusters: BTreeMap::new(),
        }
    }

    pub(crate) fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.index.distance(a, b)
    }

    pub(crate) fn form(
        &mut self,
        center_id: PointId,
        center: Arc<[f64]>,
        members: impl IntoIterator<Item = PointId>,
    ) {
        let mut members: BTreeSet<PointId> = members.into_iter().collect();
        members.insert(center_id);
        self.index.insert(center_id, Arc::clone(&center));
        self.clusters
            .insert(center_id, MicroCluster { center, members });
    }

    pub(crate) fn join(&mut self, center_id: PointId, member: PointId) -> bool {
        match self.clusters.get_mut(&center_id) {
            Some(cluster) => cluster.members.insert(member),
            None => false,
        }
    }

    /// Removes `member`; returns the remaining size when the cluster exists.
    pub(crate) fn leave(&mut self, center_id: PointId, member: PointId) -> Option<usize> {
        let cluster = self.clusters.get_mut(&center_id)?;
        cluster.members.remove(&member);
        Some(cluster.members.len())
    }

    pub(crate) fn dissolve(&mut self, center_id: PointId) -> Option<MicroCluster> {
        let cluster = self.clusters.remove(&center_id)?;
        self.index.remove(center_id);
        Some(cluster)
    }

    pub(crate) fn nearest_center(&self, values: &[f64]) -> Option<Neighbor> {
        self.index.nearest(values)
    }

    pub(crate) fn centers_within(&self, values: &[f64], radius: f64) -> Vec<Neighbor> {
        self.index.within(values, radius)
    }

    pub(crate) fn get(&self, center_id: PointId) -> Option<&MicroCluster> {
        self.clusters.get(&center_id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (PointId, &MicroCluster)> {
        self.clusters.iter().map(|(id, cluster)| (*id, cluster))
    }

    pub(crate) fn len(&self) -> usize {
        self.clusters.len()
    }

    pub(crate) fn clustered_points(&self) -> usize {
        self.clusters.values().map(MicroCluster::len).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.clusters.clear();
        self.index.clear();
    }
}
