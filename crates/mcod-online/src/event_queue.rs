// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcod_core::PointId;
use std::collections::{BTreeSet, HashMap};

/// Addressable min-queue of pending points keyed by `(ev, id)`.
///
/// The reverse map makes arbitrary removal and re-keying logarithmic.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExpiryQueue {
    order: BTreeSet<(i64, PointId)>,
    keys: HashMap<PointId, i64>,
}

impl ExpiryQueue {
    /// Inserts `id` or moves it to the new key.
    pub(crate) fn upsert(&mut self, id: PointId, ev: i64) {
        if let Some(previous) = self.keys.insert(id, ev) {
            if previous == ev {
                return;
            }
            self.order.remove(&(previous, id));
        }
        self.order.insert((ev, id));
    }

    pub(crate) fn remove(&mut self, id: PointId) -> bool {
        match self.keys.remove(&id) {
            Some(ev) => self.order.remove(&(ev, id)),
            None => false,
        }
    }

    pub(crate) fn peek(&self) -> Option<(i64, PointId)> {
        self.order.first().copied()
    }

    pub(crate) fn pop(&mut self) -> Option<(i64, PointId)> {
        let entry = self.order.pop_first()?;
        self.keys.remove(&entry.1);
        Some(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.keys.clear();
    }
}
