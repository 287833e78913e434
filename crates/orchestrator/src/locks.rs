//! Per-order mutual exclusion.

use std::sync::Arc;

use common::OrderId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async locks keyed by order ID.
///
/// Serializes the read-decide-write sequences that independent producers
/// (webhook handler, polling reader, retry endpoint, saga worker) can race
/// on for the same order. Without this guard, two payment confirmations
/// arriving together could launch the saga twice.
#[derive(Default)]
pub struct OrderLocks {
    locks: DashMap<OrderId, Arc<Mutex<()>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one order, creating it on first use.
    pub async fn acquire(&self, id: &OrderId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of orders currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
