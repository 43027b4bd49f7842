//! # Loadplan Domain
//!
//! Business domain types and models for the loadplan engine.
//!
//! This crate contains:
//! - Order records, filter criteria and statistics types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and date helpers
//!
//! ## Architecture
//! - Depends only on the foundation tier of `loadplan-common`
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
