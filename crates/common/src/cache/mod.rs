//! Cache instrumentation shared by in-memory caches.
//!
//! # Examples
//!
//! ```
//! use loadplan_common::cache::MetricsCollector;
//!
//! let metrics = MetricsCollector::new();
//! metrics.record_hit();
//! metrics.record_miss();
//! assert_eq!(metrics.snapshot(0, 10).hit_rate_percent(), "50.0%");
//! ```

pub mod stats;

pub use stats::{CacheStats, MetricsCollector};
