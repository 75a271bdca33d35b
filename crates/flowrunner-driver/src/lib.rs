//! Flowrunner Driver
//!
//! Entry points that sit above the interpreter: a run-to-completion helper
//! for script mode, and a `Supervisor` that accepts start/stop commands
//! for one flow at a time and narrates its lifecycle, for server mode.

mod error;
mod script;
mod supervisor;

pub use error::DriverError;
pub use script::run_to_completion;
pub use supervisor::Supervisor;
