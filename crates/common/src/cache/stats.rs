//! Hit/miss/eviction accounting for in-memory caches

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of a cache's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, `0.0` before the first lookup
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// e.g. `"66.7%"`
    pub fn hit_rate_percent(&self) -> String {
        format!("{:.1}%", self.hit_rate() * 100.0)
    }
}

/// Shared counters updated from `&self`; the cache supplies size and capacity
/// when a snapshot is taken.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, size: usize, capacity: usize) -> CacheStats {
        CacheStats {
            size,
            capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.evictions] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_before_any_lookup_is_zero() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.hit_rate_percent(), "0.0%");
    }

    /// Validates collector snapshots and reset.
    ///
    /// Assertions:
    /// - Counters reflect recorded lookups and the rate rounds to one decimal
    /// - `reset` zeroes every counter while size/capacity come from the caller
    #[test]
    fn snapshot_then_reset() {
        let collector = MetricsCollector::new();
        collector.record_hit();
        collector.record_hit();
        collector.record_miss();
        collector.record_eviction();

        let stats = collector.snapshot(1, 4);
        assert_eq!((stats.hits, stats.misses, stats.evictions), (2, 1, 1));
        assert_eq!(stats.hit_rate_percent(), "66.7%");

        collector.reset();
        assert_eq!(collector.snapshot(0, 4), CacheStats { capacity: 4, ..CacheStats::default() });
    }
}
