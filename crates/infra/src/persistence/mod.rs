//! Durable storage for the last good record set

mod snapshot_cache;

pub use snapshot_cache::JsonSnapshotCache;
