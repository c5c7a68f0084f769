//! Local command execution using `tokio::process`

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::result::{CommandOutcome, CommandResult};
use crate::traits::CommandRunner;

/// Local command runner
///
/// Executes commands on the local machine using `tokio::process::Command`.
/// The child is spawned with `kill_on_drop` so a timeout reliably reaps it.
#[derive(Debug, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    /// Create a new local runner
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn execute(command: &str, args: &[&str], start: Instant) -> CommandResult {
        let spawned = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let outcome = if e.kind() == std::io::ErrorKind::NotFound {
                    CommandOutcome::NotFound
                } else {
                    CommandOutcome::SpawnFailed
                };
                warn!(command = %command, error = %e, "failed to spawn command");
                return CommandResult {
                    command: command.to_string(),
                    args: args.iter().map(ToString::to_string).collect(),
                    outcome,
                    return_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    duration: start.elapsed(),
                };
            }
        };

        match child.wait_with_output().await {
            Ok(output) => {
                let status = output.status.code();
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                debug!(
                    command = %command,
                    status = ?status,
                    duration = ?start.elapsed(),
                    "command completed"
                );

                CommandResult {
                    command: command.to_string(),
                    args: args.iter().map(ToString::to_string).collect(),
                    outcome: CommandOutcome::Completed,
                    return_code: status,
                    stdout,
                    stderr,
                    duration: start.elapsed(),
                }
            }
            Err(e) => CommandResult {
                command: command.to_string(),
                args: args.iter().map(ToString::to_string).collect(),
                outcome: CommandOutcome::SpawnFailed,
                return_code: None,
                stdout: String::new(),
                stderr: e.to_string(),
                duration: start.elapsed(),
            },
        }
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    #[instrument(skip(self, args), level = "debug")]
    async fn run(&self, command: &str, args: &[&str], timeout_duration: Duration) -> CommandResult {
        let start = Instant::now();

        debug!(command = %command, timeout = ?timeout_duration, "executing local command");

        match timeout(timeout_duration, Self::execute(command, args, start)).await {
            Ok(result) => result,
            Err(_) => {
                // Dropping the execute future drops the child handle, which
                // kills the process (kill_on_drop).
                warn!(
                    command = %command,
                    timeout = ?timeout_duration,
                    "command timed out"
                );
                CommandResult {
                    command: command.to_string(),
                    args: args.iter().map(ToString::to_string).collect(),
                    outcome: CommandOutcome::TimedOut,
                    return_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: start.elapsed(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DEFAULT_TIMEOUT;

    #[tokio::test]
    async fn test_run_success() {
        let runner = LocalRunner::new();
        let result = runner.run("echo", &["hello"], DEFAULT_TIMEOUT).await;

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let runner = LocalRunner::new();
        let result = runner.run("sh", &["-c", "exit 42"], DEFAULT_TIMEOUT).await;

        assert!(!result.success());
        assert_eq!(result.outcome, CommandOutcome::Completed);
        assert_eq!(result.return_code, Some(42));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = LocalRunner::new();
        let result = runner
            .run("sleep", &["5"], Duration::from_millis(100))
            .await;

        assert_eq!(result.outcome, CommandOutcome::TimedOut);
        assert_eq!(result.return_code, None);
    }

    #[tokio::test]
    async fn test_run_not_found() {
        let runner = LocalRunner::new();
        let result = runner
            .run("definitely-not-a-real-binary", &[], DEFAULT_TIMEOUT)
            .await;

        assert_eq!(result.outcome, CommandOutcome::NotFound);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_run_with_stderr() {
        let runner = LocalRunner::new();
        let result = runner
            .run("sh", &["-c", "echo error >&2"], DEFAULT_TIMEOUT)
            .await;

        assert!(result.success());
        assert_eq!(result.stderr.trim(), "error");
    }
}
