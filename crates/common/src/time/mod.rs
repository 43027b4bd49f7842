//! Time utilities and abstractions
//!
//! ```rust
//! use std::time::Duration;
//!
//! use loadplan_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.millis_since_epoch(), 5_000);
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
