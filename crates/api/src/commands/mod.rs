//! Consumer commands - the boundary between callers and the engine
//!
//! Every command is timed and logged through
//! [`execute_command`](crate::utils::command_helpers::execute_command).
//! Tag strings from callers are parsed here; unknown tags surface as
//! `LoadplanError::InvalidInput`.

mod health;
mod orders;
mod sync;

pub use health::*;
pub use orders::*;
pub use sync::*;
