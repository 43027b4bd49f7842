//! # Loadplan App
//!
//! Application layer: context wiring, consumer commands and the headless
//! entry point.
//!
//! This crate contains:
//! - Commands (consumer → engine bridge)
//! - Application context (dependency injection)
//! - Logging and health helpers
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the ports defined in `core` to the adapters in `infra`

pub mod commands;
pub mod context;
pub mod utils;

pub use commands::*;
pub use context::*;
