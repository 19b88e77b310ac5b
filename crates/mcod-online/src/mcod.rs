// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::arena::{PendingState, Role, WindowArena};
use crate::clusters::{ClusterTable, MicroCluster};
use crate::config::{McodConfig, WindowMode};
use crate::event_queue::ExpiryQueue;
use crate::outliers::OutlierSet;
use crate::stats::{EngineStats, mean_expiries};
use mcod_core::{
    LinearScanIndex, McodError, MetricIndex, Point, PointId, StreamingOutlierDetector,
};
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

pub const MCOD_DETECTOR_ID: &str = "mcod";

/// How a point enters the pending set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Admission {
    /// A new arrival; existing pending neighbors are credited too.
    Arrival,
    /// A former cluster member; only its own bookkeeping is rebuilt.
    Dissolution,
}

/// Full engine state. Cloning it is the in-memory snapshot.
#[derive(Clone, Debug)]
pub struct McodState<I: MetricIndex = LinearScanIndex> {
    arena: WindowArena,
    clusters: ClusterTable<I>,
    pending: BTreeSet<PointId>,
    queue: ExpiryQueue,
    outliers: OutlierSet,
    dimensions: Option<usize>,
    last_arrival: Option<i64>,
    current_time: Option<i64>,
    slides_processed: u64,
}

impl<I: MetricIndex> McodState<I> {
    fn new(index: I, dimensions: Option<usize>) -> Self {
        Self {
            arena: WindowArena::default(),
            clusters: ClusterTable::new(index),
            pending: BTreeSet::new(),
            queue: ExpiryQueue::default(),
            outliers: OutlierSet::default(),
            dimensions,
            last_arrival: None,
            current_time: None,
            slides_processed: 0,
        }
    }

    fn clear_window(&mut self) {
        self.arena.clear();
        self.clusters.clear();
        self.pending.clear();
        self.queue.clear();
        self.outliers.clear();
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn last_arrival(&self) -> Option<i64> {
        self.last_arrival
    }

    pub fn current_time(&self) -> Option<i64> {
        self.current_time
    }

    pub fn slides_processed(&self) -> u64 {
        self.slides_processed
    }

    pub fn window_len(&self) -> usize {
        self.arena.len()
    }
}

fn credit_neighbor(
    config: &McodConfig,
    state: &mut PendingState,
    own_arrival: i64,
    neighbor_arrival: i64,
) {
    // A neighbor that arrived later leaves the window no earlier than the point itself.
    if neighbor_arrival >= own_arrival {
        state.succeeding += 1;
    } else {
        state.push_expiry(config.expiry_of(neighbor_arrival));
    }
}

/// Continuous distance-based outlier detector over micro-clusters (MCOD).
///
/// A point is an outlier when fewer than `min_neighbor_count` other live
/// points lie within `max_distance` of it. Points inside a micro-cluster are
/// inliers by construction; all other points are tracked individually.
#[derive(Clone, Debug)]
pub struct McodDetector<I: MetricIndex = LinearScanIndex> {
    config: McodConfig,
    state: McodState<I>,
}

impl McodDetector<LinearScanIndex> {
    pub fn new(config: McodConfig) -> Result<Self, McodError> {
        Self::with_index(config, LinearScanIndex::default())
    }
}

impl<I: MetricIndex> McodDetector<I> {
    /// Builds a detector that keeps cluster centers in `index`.
    pub fn with_index(config: McodConfig, index: I) -> Result<Self, McodError> {
        config.validate()?;
        let state = McodState::new(index, config.dimensions);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &McodConfig {
        &self.config
    }

    pub fn state(&self) -> &McodState<I> {
        &self.state
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.state.dimensions
    }

    /// Live window points with their current roles, oldest first.
    pub fn window(&self) -> impl Iterator<Item = (PointId, &Point, &Role)> + '_ {
        self.state
            .arena
            .iter()
            .map(|(id, slot)| (id, &slot.point, &slot.role))
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.state.arena.get(id).map(|slot| &slot.point)
    }

    pub fn role_of(&self, arrival_time: i64) -> Option<&Role> {
        let id = self.state.arena.find_by_arrival(arrival_time)?;
        self.state.arena.get(id).map(|slot| &slot.role)
    }

    pub fn is_outlier(&self, arrival_time: i64) -> bool {
        self.state
            .arena
            .find_by_arrival(arrival_time)
            .is_some_and(|id| self.state.outliers.contains(id))
    }

    /// Active micro-clusters keyed by the id of their founding center.
    pub fn clusters(&self) -> impl Iterator<Item = (PointId, &MicroCluster)> + '_ {
        self.state.clusters.iter()
    }

    pub fn stats(&self) -> EngineStats {
        let state = &self.state;
        EngineStats {
            window_points: state.arena.len(),
            clusters: state.clusters.len(),
            clustered_points: state.clusters.clustered_points(),
            pending_points: state.pending.len(),
            queued_points: state.queue.len(),
            outliers: state.outliers.len(),
            mean_pending_expiries: mean_expiries(
                state
                    .pending
                    .iter()
                    .filter_map(|id| state.arena.get(*id))
                    .filter_map(|slot| slot.role.pending()),
            ),
            slides_processed: state.slides_processed,
        }
    }

    /// Checks the whole batch and returns the dimensionality it fixes.
    fn validate_batch(
        &self,
        points: &[Point],
        mode: WindowMode,
    ) -> Result<Option<usize>, McodError> {
        let mut dimensions = self.state.dimensions;
        let mut previous = match mode {
            WindowMode::Sliding => self.state.last_arrival,
            WindowMode::Tumbling => None,
        };
        for point in points {
            point.validate(dimensions)?;
            if let Some(previous) = previous
                && point.arrival_time() <= previous
            {
                return Err(McodError::NonMonotonicArrival {
                    previous,
                    got: point.arrival_time(),
                });
            }
            previous = Some(point.arrival_time());
            dimensions.get_or_insert(point.dimensions());
        }
        Ok(dimensions)
    }

    // The metric index holds only cluster centers, so pending points are scanned linearly.
    fn pending_within(&self, values: &[f64], radius: f64) -> Vec<PointId> {
        let state = &self.state;
        state
            .pending
            .iter()
            .copied()
            .filter(|id| {
                state.arena.get(*id).is_some_and(|slot| {
                    state.clusters.distance(values, slot.point.values()) <= radius
                })
            })
            .collect()
    }

    /// Evicts every point at or before `current_time - window_size`, then
    /// dissolves the clusters that fell below `k + 1` live members.
    fn purge(&mut self, current_time: i64) {
        let cutoff = current_time.saturating_sub(self.config.window_size);
        let min_cluster_size = self.config.min_neighbor_count.saturating_add(1);
        let mut shrunk = BTreeSet::new();

        for id in self.state.arena.ids_through(cutoff) {
            let Some(slot) = self.state.arena.take(id) else {
                continue;
            };
            match slot.role.cluster(id) {
                Some(center) => {
                    if let Some(remaining) = self.state.clusters.leave(center, id)
                        && remaining < min_cluster_size
                    {
                        shrunk.insert(center);
                    }
                }
                None => {
                    self.state.pending.remove(&id);
                    self.state.queue.remove(id);
                    self.state.outliers.remove(id);
                }
            }
        }

        for center in shrunk {
            self.dissolve_cluster(center);
        }

        // Flagged outliers sit outside the queue, so their stale expiries are dropped here.
        let state = &mut self.state;
        for id in state.outliers.iter() {
            if let Some(bookkeeping) = state.arena.pending_mut(id) {
                bookkeeping.expire_through(current_time);
            }
        }
    }

    fn process_new_point(&mut self, point: Point) {
        let cluster_radius = self.config.cluster_radius();
        if let Some(nearest) = self.state.clusters.nearest_center(point.values())
            && nearest.distance <= cluster_radius
        {
            self.join_cluster(point, nearest.id);
            return;
        }

        let candidates = self.pending_within(point.values(), cluster_radius);
        if candidates.len() as f64 >= self.config.formation_threshold() {
            self.form_cluster(point, candidates);
            return;
        }

        let id = self
            .state
            .arena
            .push(point, Role::Pending(PendingState::default()));
        self.admit_pending(id, Admission::Arrival);
    }

    fn join_cluster(&mut self, point: Point, center_id: PointId) {
        let arrival = point.arrival_time();
        let values = point.shared_values();
        let id = self
            .state
            .arena
            .push(point, Role::Member { center: center_id });
        self.state.clusters.join(center_id, id);

        let max_distance = self.config.max_distance;
        let state = &self.state;
        // Linear over the pending set; see `pending_within`.
        let credited: Vec<PointId> = state
            .pending
            .iter()
            .copied()
            .filter(|pid| {
                state.arena.get(*pid).is_some_and(|slot| {
                    slot.role
                        .pending()
                        .is_some_and(|bookkeeping| bookkeeping.rmc.contains(&center_id))
                        && state.clusters.distance(slot.point.values(), &values) <= max_distance
                })
            })
            .collect();

        for pid in credited {
            self.credit(pid, arrival);
            self.check_inlier(pid);
        }
    }

    fn form_cluster(&mut self, point: Point, members: Vec<PointId>) {
        let arrival = point.arrival_time();
        let values = point.shared_values();
        let id = self.state.arena.push(point, Role::Center);

        for &member in &members {
            self.state.pending.remove(&member);
            self.state.queue.remove(member);
            self.state.outliers.remove(member);
            if let Some(slot) = self.state.arena.get_mut(member) {
                slot.role = Role::Member { center: id };
            }
        }
        trace!(center = %id, members = members.len(), "formed micro-cluster");
        self.state.clusters.form(id, values.clone(), members);

        let propagation_radius = self.config.propagation_radius();
        let max_distance = self.config.max_distance;
        let state = &mut self.state;
        let mut credited = Vec::new();
        for &pid in &state.pending {
            let Some(slot) = state.arena.get_mut(pid) else {
                continue;
            };
            let distance = state.clusters.distance(slot.point.values(), &values);
            if distance > propagation_radius {
                continue;
            }
            if let Role::Pending(bookkeeping) = &mut slot.role {
                bookkeeping.rmc.insert(id);
            }
            if distance <= max_distance {
                credited.push(pid);
            }
        }

        for pid in credited {
            self.credit(pid, arrival);
            self.check_inlier(pid);
        }
    }

    /// Returns the live members of a shrunk cluster to the pending set, oldest first.
    fn dissolve_cluster(&mut self, center_id: PointId) {
        let Some(cluster) = self.state.clusters.dissolve(center_id) else {
            return;
        };
        let state = &mut self.state;
        for id in &state.pending {
            if let Some(bookkeeping) = state.arena.pending_mut(*id) {
                bookkeeping.rmc.remove(&center_id);
            }
        }

        // Ids are issued in arrival order, so the set is already oldest first.
        let members: Vec<PointId> = cluster
            .members
            .into_iter()
            .filter(|id| state.arena.get(*id).is_some())
            .collect();
        trace!(center = %center_id, survivors = members.len(), "dissolving micro-cluster");

        let total = members.len();
        for (position, id) in members.into_iter().enumerate() {
            let Some(slot) = self.state.arena.get_mut(id) else {
                continue;
            };
            // Every later cluster-mate is a neighbor that expires no earlier.
            slot.role = Role::Pending(PendingState::with_succeeding(total - 1 - position));
            self.admit_pending(id, Admission::Dissolution);
        }
    }

    /// Counts the neighbors of an already-stored pending point and enters it in the pending set.
    fn admit_pending(&mut self, id: PointId, admission: Admission) {
        let Some(probe) = self.state.arena.get(id).map(|slot| slot.point.clone()) else {
            return;
        };
        let arrival = probe.arrival_time();
        let max_distance = self.config.max_distance;
        let neighbors = self.pending_within(probe.values(), max_distance);

        let state = &mut self.state;
        let mut neighbor_arrivals: Vec<i64> = neighbors
            .iter()
            .filter_map(|nid| state.arena.get(*nid))
            .map(|slot| slot.point.arrival_time())
            .collect();

        let mut nearby_centers = BTreeSet::new();
        for center in state
            .clusters
            .centers_within(probe.values(), self.config.propagation_radius())
        {
            nearby_centers.insert(center.id);
            let Some(cluster) = state.clusters.get(center.id) else {
                continue;
            };
            for member in cluster.members() {
                if let Some(slot) = state.arena.get(*member)
                    && state.clusters.distance(slot.point.values(), probe.values()) <= max_distance
                {
                    neighbor_arrivals.push(slot.point.arrival_time());
                }
            }
        }

        if let Some(bookkeeping) = state.arena.pending_mut(id) {
            for neighbor_arrival in neighbor_arrivals {
                credit_neighbor(&self.config, bookkeeping, arrival, neighbor_arrival);
            }
            bookkeeping.rmc.extend(nearby_centers);
        }

        if admission == Admission::Arrival {
            for nid in neighbors {
                self.credit(nid, arrival);
                self.check_inlier(nid);
            }
        }

        self.state.pending.insert(id);
        self.check_inlier(id);
    }

    fn credit(&mut self, id: PointId, neighbor_arrival: i64) {
        let Some(slot) = self.state.arena.get_mut(id) else {
            return;
        };
        let own_arrival = slot.point.arrival_time();
        if let Role::Pending(bookkeeping) = &mut slot.role {
            credit_neighbor(&self.config, bookkeeping, own_arrival, neighbor_arrival);
        }
    }

    /// Trims the expiry list and files the point as safe, queued or outlier.
    fn check_inlier(&mut self, id: PointId) {
        let k = self.config.min_neighbor_count;
        let state = &mut self.state;
        let Some(bookkeeping) = state.arena.pending_mut(id) else {
            return;
        };
        bookkeeping.trim(k);
        if bookkeeping.succeeding >= k {
            state.queue.remove(id);
            state.outliers.remove(id);
        } else if bookkeeping.neighbor_count() >= k {
            let ev = bookkeeping.ev();
            state.outliers.remove(id);
            state.queue.upsert(id, ev);
        } else {
            state.queue.remove(id);
            state.outliers.insert(id);
        }
    }

    fn drain_expiry_queue(&mut self, current_time: i64) {
        while let Some((ev, id)) = self.state.queue.peek() {
            if ev > current_time {
                break;
            }
            self.state.queue.pop();
            if let Some(bookkeeping) = self.state.arena.pending_mut(id) {
                bookkeeping.expire_through(current_time);
            }
            self.check_inlier(id);
        }
    }
}

impl<I: MetricIndex> StreamingOutlierDetector for McodDetector<I> {
    type State = McodState<I>;

    fn reset(&mut self) {
        self.state.clear_window();
        self.state.dimensions = self.config.dimensions;
        self.state.last_arrival = None;
        self.state.current_time = None;
        self.state.slides_processed = 0;
    }

    fn detect_outliers(
        &mut self,
        new_points: &[Point],
        current_time: i64,
    ) -> Result<Vec<Point>, McodError> {
        let mode = self.config.window_mode();
        let dimensions = self.validate_batch(new_points, mode)?;
        self.state.dimensions = dimensions;

        match mode {
            WindowMode::Tumbling => {
                self.state.clear_window();
                for point in new_points {
                    self.process_new_point(point.clone());
                }
            }
            WindowMode::Sliding => {
                self.purge(current_time);
                self.drain_expiry_queue(current_time);
                let cutoff = current_time.saturating_sub(self.config.window_size);
                for point in new_points {
                    if point.arrival_time() <= cutoff {
                        warn!(
                            arrival_time = point.arrival_time(),
                            current_time, "dropping point that is already outside the window"
                        );
                        continue;
                    }
                    self.process_new_point(point.clone());
                }
                self.drain_expiry_queue(current_time);
            }
        }

        if let Some(last) = new_points.last() {
            self.state.last_arrival = Some(last.arrival_time());
        }
        self.state.current_time = Some(current_time);
        self.state.slides_processed += 1;

        debug!(
            detector = MCOD_DETECTOR_ID,
            mode = mode.as_str(),
            current_time,
            window = self.state.arena.len(),
            clusters = self.state.clusters.len(),
            pending = self.state.pending.len(),
            queued = self.state.queue.len(),
            outliers = self.state.outliers.len(),
            "slide processed"
        );

        Ok(self.outliers())
    }

    fn outliers(&self) -> Vec<Point> {
        self.state
            .outliers
            .iter()
            .filter_map(|id| self.state.arena.get(id))
            .map(|slot| slot.point.clone())
            .collect()
    }

    fn save_state(&self) -> Self::State {
        self.state.clone()
    }

    fn load_state(&mut self, state: &Self::State) {
        self.state = state.clone();
    }
}
