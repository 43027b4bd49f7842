//! Remote sync: ports, retry policy and the orchestrator

pub mod ports;
pub mod retry;
pub mod service;

pub use ports::{FileParser, RemoteFileHost, SecondaryCache};
pub use service::{combined_signature, SyncOrchestrator};
