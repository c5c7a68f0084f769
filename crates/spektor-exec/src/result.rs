//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a command invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Process ran to completion (any exit code)
    Completed,
    /// Process was killed after exceeding the timeout
    TimedOut,
    /// Executable could not be located
    NotFound,
    /// Process could not be spawned for another reason
    SpawnFailed,
}

/// Result of a command execution
///
/// Produced once per invocation and immutable afterwards. Serializable so it
/// can be written verbatim as a raw-capture artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Executable name or path
    pub command: String,
    /// Argument list
    pub args: Vec<String>,
    /// Outcome classification
    pub outcome: CommandOutcome,
    /// Exit status code, if the process completed
    pub return_code: Option<i32>,
    /// stdout output
    pub stdout: String,
    /// stderr output (or spawn error message)
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command ran to completion with exit code 0
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome == CommandOutcome::Completed && self.return_code == Some(0)
    }

    /// Short description of a failure, suitable for a validation issue
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match self.outcome {
            CommandOutcome::Completed => match self.return_code {
                Some(0) => "succeeded".to_string(),
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            },
            CommandOutcome::TimedOut => "timed out".to_string(),
            CommandOutcome::NotFound => "command not found".to_string(),
            CommandOutcome::SpawnFailed => format!("failed to spawn: {}", self.stderr.trim()),
        }
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: CommandOutcome, code: Option<i32>) -> CommandResult {
        CommandResult {
            command: "true".to_string(),
            args: Vec::new(),
            outcome,
            return_code: code,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_success_requires_completed_zero() {
        assert!(result(CommandOutcome::Completed, Some(0)).success());
        assert!(!result(CommandOutcome::Completed, Some(1)).success());
        assert!(!result(CommandOutcome::TimedOut, None).success());
        assert!(!result(CommandOutcome::NotFound, None).success());
    }

    #[test]
    fn test_failure_reason_mentions_exit_code() {
        let r = result(CommandOutcome::Completed, Some(42));
        assert!(r.failure_reason().contains("42"));
    }
}
