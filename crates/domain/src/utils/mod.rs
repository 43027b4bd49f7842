//! Utility helpers shared by parsing and querying

pub mod dates;
