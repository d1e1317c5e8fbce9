//! Captured command execution for scheduler calls.

use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to execute {command}: {error}")]
    Execution { command: String, error: String },
}

/// Exit status and captured streams of a finished scheduler call.
///
/// A non-zero exit is not an error at this layer: callers inspect the
/// status and stderr themselves to decide between retry, recovery, and
/// failure-signature handling.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Process exit code, if the process exited normally.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// First non-empty stdout line, if any.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().find(|l| !l.trim().is_empty())
    }
}

/// Run a command to completion, capturing stdout and stderr.
///
/// Only a spawn failure (missing binary, permission denied) is an `Err`;
/// everything else comes back as a [`CapturedOutput`].
pub async fn run_captured(cmd: &mut Command, name: &str) -> Result<CapturedOutput, CommandError> {
    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: name.to_string(),
        error: e.to_string(),
    })?;

    Ok(CapturedOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
