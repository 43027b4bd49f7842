//! Drive-style shared-file host adapter

mod client;

pub use client::DriveFileHost;
