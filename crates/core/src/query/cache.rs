//! Result cache for filtered record sets
//!
//! Keys are canonical filter signatures from [`cache_key`]; values are shared
//! slices so a hit never copies records. The query engine is the only writer
//! and clears the cache whenever the record store generation moves.

use std::fmt::Write as _;
use std::num::NonZeroUsize;
use std::sync::Arc;

use loadplan_common::cache::{CacheStats, MetricsCollector};
use loadplan_common::collections::LruCache;
use loadplan_domain::constants::FILTER_KEY_SCHEMA;
use loadplan_domain::{DateMode, FilterMode, FilterState, LoadplanError, OrderRecord, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

/// Shared filtered record set
pub type CachedOrders = Arc<[OrderRecord]>;

/// Canonical signature of a filter evaluation.
///
/// Field order is fixed by the schema version, free text is trimmed and
/// quoted, search is lowercased (matching is case-insensitive) and open
/// bounds are written as `0` / `inf`. The mode is normalized to `AND` when no
/// field constrains the result, since it then has no effect.
pub fn cache_key(filter: &FilterState, date_mode: DateMode, factory_scope: &str) -> String {
    let mode = if filter.is_default() { FilterMode::And } else { filter.mode };
    let optional = |value: Option<String>| value.unwrap_or_default();

    let mut key = String::with_capacity(128);
    let _ = write!(
        key,
        "{schema}|search={search:?}|month={month:?}|dest={dest:?}|vendor={vendor:?}\
         |factory={factory}|status={status}|quick={quick}|date={start}..{end}\
         |qty={min}..{max}|mode={mode}|date_mode={date_mode}|scope={scope:?}",
        schema = FILTER_KEY_SCHEMA,
        search = filter.search.trim().to_lowercase(),
        month = filter.month.trim(),
        dest = filter.destination.trim(),
        vendor = filter.vendor.trim(),
        factory = optional(filter.factory.map(|f| f.to_string())),
        status = optional(filter.status.map(|s| s.to_string())),
        quick = optional(filter.quick.map(|q| q.to_string())),
        start = optional(filter.date_range.start.map(|d| d.to_string())),
        end = optional(filter.date_range.end.map(|d| d.to_string())),
        min = filter.quantity_range.min.unwrap_or(0),
        max = filter.quantity_range.max.map_or_else(|| "inf".to_string(), |m| m.to_string()),
        mode = mode.as_str().to_uppercase(),
        date_mode = date_mode,
        scope = factory_scope,
    );
    key
}

/// Consumer-facing cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Formatted as `"NN.N%"`
    pub hit_rate: String,
}

impl From<CacheStats> for ResultCacheStats {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate_percent(),
            size: stats.size,
            capacity: stats.capacity,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
        }
    }
}

/// Bounded LRU of filtered record sets
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<LruCache<String, CachedOrders>>,
    metrics: MetricsCollector,
    capacity: usize,
}

impl ResultCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            metrics: MetricsCollector::new(),
            capacity: capacity.get(),
        }
    }

    /// Fallible constructor for configured capacities
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or_else(|| LoadplanError::Config("result cache capacity must be > 0".into()))
    }

    /// Look up a key, promoting it to most recently used on a hit
    pub fn get(&self, key: &str) -> Option<CachedOrders> {
        let hit = self.entries.lock().get(key).cloned();
        match hit {
            Some(value) => {
                self.metrics.record_hit();
                Some(value)
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Insert or replace; a new key at capacity evicts the LRU entry
    pub fn set(&self, key: String, value: CachedOrders) {
        let evicted = self.entries.lock().put_evicting(key, value);
        if let Some((evicted_key, _)) = evicted {
            self.metrics.record_eviction();
            trace!(key = %evicted_key, "result cache evicted entry");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.metrics.reset();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> ResultCacheStats {
        self.metrics.snapshot(self.len(), self.capacity).into()
    }
}
