//! Configuration loading
//!
//! Environment variables first, then a config file in one of the standard
//! locations.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
