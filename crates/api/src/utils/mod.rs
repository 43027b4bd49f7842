//! Shared helpers for commands and the entry point

pub mod command_helpers;
pub mod health;
pub mod logging;
