//! Keyed free lists shared by enemies, projectiles and pickups.

use std::collections::{BTreeMap, HashSet};

use horde_core::{ObjectPool, PoolEntry, PoolHandle, PoolKey};

/// Usage counters for a single free list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Handles waiting in the free list.
    pub idle: usize,
    /// Handles currently checked out.
    pub active: usize,
    /// Handles allocated after the free list ran dry.
    pub overflow_allocations: u64,
    /// Released handles dropped because the free list was full.
    pub destroyed: u64,
}

#[derive(Debug)]
struct FreeList {
    free: Vec<u32>,
    active: HashSet<u32>,
    next_slot: u32,
    max_size: usize,
    overflow_allocations: u64,
    destroyed: u64,
}

impl FreeList {
    fn new(entry: &PoolEntry) -> Self {
        let initial = u32::try_from(entry.initial_size).unwrap_or(u32::MAX);
        Self {
            free: (0..initial).rev().collect(),
            active: HashSet::new(),
            next_slot: initial,
            max_size: entry.max_size,
            overflow_allocations: 0,
            destroyed: 0,
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.free.len(),
            active: self.active.len(),
            overflow_allocations: self.overflow_allocations,
            destroyed: self.destroyed,
        }
    }
}

/// Pooled-object allocator.
#[derive(Debug, Default)]
pub struct Pool {
    lists: BTreeMap<PoolKey, FreeList>,
}

impl Pool {
    /// Creates and pre-fills the configured free lists.
    #[must_use]
    pub fn new(entries: &[PoolEntry]) -> Self {
        Self {
            lists: entries
                .iter()
                .map(|entry| (entry.key.clone(), FreeList::new(entry)))
                .collect(),
        }
    }

    /// Usage counters for every free list, ordered by key.
    #[must_use]
    pub fn stats(&self) -> Vec<(PoolKey, PoolStats)> {
        self.lists
            .iter()
            .map(|(key, list)| (key.clone(), list.stats()))
            .collect()
    }
}

impl ObjectPool for Pool {
    fn acquire(&mut self, key: &PoolKey) -> Option<PoolHandle> {
        let Some(list) = self.lists.get_mut(key) else {
            log::warn!("pool `{key}` is not configured");
            return None;
        };

        let slot = match list.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = list.next_slot;
                list.next_slot = list.next_slot.saturating_add(1);
                list.overflow_allocations += 1;
                log::debug!("pool `{key}` exhausted, allocating slot {slot}");
                slot
            }
        };
        let _ = list.active.insert(slot);
        Some(PoolHandle::new(key.clone(), slot))
    }

    fn release(&mut self, handle: PoolHandle) {
        let Some(list) = self.lists.get_mut(handle.key()) else {
            log::warn!("released handle into unknown pool `{}`", handle.key());
            return;
        };

        if !list.active.remove(&handle.slot()) {
            log::warn!(
                "pool `{}` slot {} was not checked out",
                handle.key(),
                handle.slot()
            );
            return;
        }

        if list.free.len() >= list.max_size {
            list.destroyed += 1;
            log::trace!("pool `{}` full, destroying slot {}", handle.key(), handle.slot());
        } else {
            list.free.push(handle.slot());
        }
    }
}
