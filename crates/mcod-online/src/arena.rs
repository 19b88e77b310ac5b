// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::{Point, PointId};
use std::collections::{BTreeSet, VecDeque};

/// Neighbor bookkeeping of a point that is not in any micro-cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingState {
    /// Window-exit times of counted preceding neighbors, ascending.
    pub(crate) exps: Vec<i64>,
    /// Neighbors that arrived later; they never expire first.
    pub(crate) succeeding: usize,
    /// Cluster centers within the propagation radius.
    pub(crate) rmc: BTreeSet<PointId>,
}

impl PendingState {
    pub(crate) fn with_succeeding(succeeding: usize) -> Self {
        Self {
            succeeding,
            ..Self::default()
        }
    }

    pub fn expiries(&self) -> &[i64] {
        &self.exps
    }

    pub fn succeeding(&self) -> usize {
        self.succeeding
    }

    pub fn nearby_centers(&self) -> &BTreeSet<PointId> {
        &self.rmc
    }

    /// Earliest tracked expiry, or zero when none is tracked.
    pub fn ev(&self) -> i64 {
        self.exps.first().copied().unwrap_or(0)
    }

    /// Confirmed plus still-tracked neighbors.
    pub fn neighbor_count(&self) -> usize {
        self.succeeding.saturating_add(self.exps.len())
    }

    pub(crate) fn push_expiry(&mut self, at: i64) {
        let idx = self.exps.partition_point(|&existing| existing <= at);
        self.exps.insert(idx, at);
    }

    /// Drops the earliest expiries so at most `min_neighbor_count - succeeding` remain.
    pub(crate) fn trim(&mut self, min_neighbor_count: usize) {
        let keep = min_neighbor_count.saturating_sub(self.succeeding);
        if self.exps.len() > keep {
            let excess = self.exps.len() - keep;
            self.exps.drain(..excess);
        }
    }

    /// Removes expiries at or before `current_time`; returns how many were dropped.
    pub(crate) fn expire_through(&mut self, current_time: i64) -> usize {
        let expired = self.exps.partition_point(|&at| at <= current_time);
        self.exps.drain(..expired);
        expired
    }
}

/// Role of a point in the window. Exactly one applies at any time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Center,
    Member { center: PointId },
    Pending(PendingState),
}

impl Role {
    pub fn is_clustered(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }

    pub fn pending(&self) -> Option<&PendingState> {
        match self {
            Self::Pending(state) => Some(state),
            _ => None,
        }
    }

    /// Cluster key this point belongs to, if any.
    pub fn cluster(&self, own_id: PointId) -> Option<PointId> {
        match self {
            Self::Center => Some(own_id),
            Self::Member { center } => Some(*center),
            Self::Pending(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) point: Point,
    pub(crate) role: Role,
}

/// Dense arena of live window points keyed by issue order.
///
/// Points leave in arrival order, so evicted slots form a prefix that is popped
/// from the front; handles stay valid and are never reused.
#[derive(Clone, Debug, Default)]
pub(crate) struct WindowArena {
    base: u64,
    slots: VecDeque<Option<Slot>>,
    live: usize,
}

impl WindowArena {
    pub(crate) fn next_id(&self) -> PointId {
        PointId(self.base + self.slots.len() as u64)
    }

    pub(crate) fn push(&mut self, point: Point, role: Role) -> PointId {
        let id = self.next_id();
        self.slots.push_back(Some(Slot { point, role }));
        self.live += 1;
        id
    }

    fn offset(&self, id: PointId) -> Option<usize> {
        id.0.checked_sub(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
    }

    pub(crate) fn get(&self, id: PointId) -> Option<&Slot> {
        let offset = self.offset(id)?;
        self.slots.get(offset)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: PointId) -> Option<&mut Slot> {
        let offset = self.offset(id)?;
        self.slots.get_mut(offset)?.as_mut()
    }

    pub(crate) fn pending_mut(&mut self, id: PointId) -> Option<&mut PendingState> {
        match &mut self.get_mut(id)?.role {
            Role::Pending(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn take(&mut self, id: PointId) -> Option<Slot> {
        let offset = self.offset(id)?;
        let slot = self.slots.get_mut(offset)?.take()?;
        self.live -= 1;
        while matches!(self.slots.front(), Some(None)) {
            self.slots.pop_front();
            self.base += 1;
        }
        Some(slot)
    }

    /// Live ids whose arrival time is `<= cutoff`, oldest first.
    pub(crate) fn ids_through(&self, cutoff: i64) -> Vec<PointId> {
        let mut out = Vec::new();
        for (offset, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            if slot.point.arrival_time() > cutoff {
                break;
            }
            out.push(PointId(self.base + offset as u64));
        }
        out
    }

    pub(crate) fn find_by_arrival(&self, arrival_time: i64) -> Option<PointId> {
        self.iter()
            .find(|(_, slot)| slot.point.arrival_time() == arrival_time)
            .map(|(id, _)| id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (PointId, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(offset, slot)| {
                slot.as_ref()
                    .map(|slot| (PointId(self.base + offset as u64), slot))
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Empties the arena without rewinding handle issue.
    pub(crate) fn clear(&mut self) {
        self.base += self.slots.len() as u64;
        self.slots.clear();
        self.live = 0;
    }
}
