//! spektor-exec: Local command execution
//!
//! Provides the command runner used by inventory probes: one subprocess per
//! call, bounded by a timeout, with every failure mode recorded in the result
//! instead of raised.

pub mod result;
pub mod runner;
pub mod traits;

pub use result::{CommandOutcome, CommandResult};
pub use runner::LocalRunner;
pub use traits::CommandRunner;
