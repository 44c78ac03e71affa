//! Child-process execution with a wall-clock timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a finished child process.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ToolOutput {
    /// Complete stdout.
    pub stdout: String,
    /// Complete stderr.
    pub stderr: String,
    /// Exit code (`-1` if the process was terminated by a signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ToolOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Why a child process produced no [`ToolOutput`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The program could not be started.
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    /// The program ran past its timeout and was killed.
    #[error("timed out after {elapsed_ms}ms")]
    Timeout {
        /// Time spent before the child was killed.
        elapsed_ms: u64,
    },
}

/// Runs `cmd` to completion, capturing stdout and stderr.
///
/// Stdin is closed. If `timeout` elapses first the output future is dropped,
/// and `kill_on_drop` takes the child down with it.
pub async fn run_command(cmd: &mut Command, timeout: Duration) -> Result<ToolOutput, RunError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(err)) => Err(RunError::Spawn(err)),
        Err(_elapsed) => Err(RunError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }),
    }
}
