//! Record store
//!
//! Holds the canonical order set. Readers take cheap `Arc` snapshots; the
//! sync orchestrator is the only writer and replaces the set wholesale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use loadplan_domain::{OrderRecord, Provenance};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct StoreInner {
    records: Arc<Vec<OrderRecord>>,
    provenance: Option<Provenance>,
}

/// Canonical record set with a monotonic generation counter
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: RwLock<StoreInner>,
    generation: AtomicU64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new record set and bump the generation.
    ///
    /// Crate-private: the orchestrator's `sync` and `hydrate_from_cache`
    /// are the only callers.
    pub(crate) fn replace(&self, records: Vec<OrderRecord>, provenance: Provenance) -> u64 {
        let mut inner = self.inner.write();
        inner.records = Arc::new(records);
        inner.provenance = Some(provenance);
        // Bumped under the write lock so a reader never sees the new
        // generation paired with the old records.
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn snapshot(&self) -> Arc<Vec<OrderRecord>> {
        Arc::clone(&self.inner.read().records)
    }

    /// Records and the generation they belong to, read consistently
    pub fn versioned_snapshot(&self) -> (u64, Arc<Vec<OrderRecord>>) {
        let inner = self.inner.read();
        (self.generation.load(Ordering::Acquire), Arc::clone(&inner.records))
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.inner.read().provenance.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}
