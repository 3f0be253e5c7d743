//! Per-entity lock table
//!
//! Every mutation of a wallet balance or an item's listing state runs while
//! holding the locks of all entities it touches. `EntityLocks` hands out one
//! mutex per entity, created on first use and shared through a `DashMap`.
//!
//! # Deadlock Freedom
//!
//! [`EntityLocks::acquire`] sorts and de-duplicates the requested keys and
//! locks them in that global order, so two operations touching overlapping
//! entity sets can never wait on each other in a cycle.

use crate::types::{ItemId, UserId};
use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::sync::Arc;
use tracing::debug;

/// Identity of a lockable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Wallet(UserId),
    Item(ItemId),
}

/// Guards held for the duration of one operation
///
/// Dropping the set releases every lock.
#[must_use = "locks are released as soon as the set is dropped"]
pub struct LockSet {
    keys: Vec<LockKey>,
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl LockSet {
    /// Keys held, in acquisition order
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

/// Lazily populated table of per-entity mutexes
///
/// Entries are never removed. The table holds at most one mutex per wallet
/// and per item ever locked, the same rows the record store keeps for good,
/// so it grows with the store and not with the number of operations.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every entity in `keys`, blocking until all are held
    pub fn acquire(&self, keys: &[LockKey]) -> LockSet {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let guards = keys
            .iter()
            .map(|key| {
                // Clone the Arc so the map shard is released before blocking
                let mutex = Arc::clone(
                    self.locks
                        .entry(*key)
                        .or_insert_with(|| Arc::new(Mutex::new(())))
                        .value(),
                );
                mutex.lock_arc()
            })
            .collect();

        debug!(?keys, "entity locks acquired");
        LockSet {
            keys,
            _guards: guards,
        }
    }

    /// Number of entities that have ever been locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
