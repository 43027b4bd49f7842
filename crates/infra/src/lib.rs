//! # Loadplan Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client and the Drive-backed remote file host
//! - CSV/JSON loadplan parser
//! - JSON snapshot secondary cache
//! - Configuration loader and the polling sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `loadplan-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod config;
pub mod drive;
pub mod errors;
pub mod http;
pub mod parser;
pub mod persistence;
pub mod scheduling;

pub use drive::DriveFileHost;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use parser::LoadplanParser;
pub use persistence::JsonSnapshotCache;
pub use scheduling::{SyncScheduler, SyncSchedulerConfig};
