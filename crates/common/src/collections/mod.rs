//! Specialized data structures
//!
//! - **[`lru`]**: LRU cache backed by the `lru` crate

pub mod lru;

pub use lru::LruCache;
