// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::PointId;
use std::collections::{BTreeMap, HashMap};

/// Flagged outliers, iterated in the order they were flagged.
#[derive(Clone, Debug, Default)]
pub(crate) struct OutlierSet {
    by_flag: BTreeMap<u64, PointId>,
    flags: HashMap<PointId, u64>,
    next_flag: u64,
}

impl OutlierSet {
    /// Flags `id`; a point already flagged keeps its original position.
    pub(crate) fn insert(&mut self, id: PointId) -> bool {
        if self.flags.contains_key(&id) {
            return false;
        }
        let flag = self.next_flag;
        self.next_flag = self.next_flag.saturating_add(1);
        self.flags.insert(id, flag);
        self.by_flag.insert(flag, id);
        true
    }

    pub(crate) fn remove(&mut self, id: PointId) -> bool {
        match self.flags.remove(&id) {
            Some(flag) => self.by_flag.remove(&flag).is_some(),
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: PointId) -> bool {
        self.flags.contains_key(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = PointId> + '_ {
        self.by_flag.values().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.flags.len()
    }

    pub(crate) fn clear(&mut self) {
        self.by_flag.clear();
        self.flags.clear();
    }
}
