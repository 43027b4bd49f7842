//! Filtering, aggregation and result caching over the record store

pub mod aggregate;
pub mod cache;
pub mod engine;
pub mod filter;
pub mod regions;

pub use cache::{cache_key, CachedOrders, ResultCache, ResultCacheStats};
pub use engine::{MemoStats, QueryEngine};
pub use filter::{FilterContext, Predicate};
pub use regions::Region;
