//! Background scheduling
//!
//! The sync scheduler drives periodic remote syncs while the loadplan is
//! being watched. Lifecycle is explicit: a join handle is kept for the
//! spawned task and a cancellation token stops it.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
