//! Command runner trait

use async_trait::async_trait;
use std::time::Duration;

use crate::result::CommandResult;

/// Default per-command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command, capturing output and classifying the outcome.
    ///
    /// Never fails: a missing binary, a timeout, or a nonzero exit are all
    /// recorded in the returned [`CommandResult`]. One attempt per call, no
    /// retries.
    async fn run(&self, command: &str, args: &[&str], timeout: Duration) -> CommandResult;
}
