//! # Loadplan Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Order classification rules
//! - The record store and the query engine (filters, statistics, groupings)
//! - The sync orchestrator and its port interfaces (traits)
//! - The sync event bus
//!
//! ## Architecture Principles
//! - Only depends on `loadplan-common` and `loadplan-domain`
//! - No HTTP, filesystem or parsing code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod classification;
pub mod events;
pub mod query;
pub mod store;
pub mod sync;

pub use events::{EventBus, EventKind, ListenerError, ListenerResult, Subscription, SyncEvent};
pub use query::{QueryEngine, Region, ResultCache};
pub use store::RecordStore;
pub use sync::{FileParser, RemoteFileHost, SecondaryCache, SyncOrchestrator};
