use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

/// Error type shared by the reset sequencer, the demo manager and the status checker.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The remote query tool is not installed or cannot be started.
    #[error("remote query tool '{tool}' is not available: {reason}")]
    MissingTool {
        /// Program name or path that was probed.
        tool: String,
        /// Why the probe failed.
        reason: String,
    },
    /// The reachability probe did not succeed on the connection.
    #[error("connection {connection} failed: {detail}")]
    ConnectionFailed {
        /// Display form of the connection that was probed.
        connection: String,
        /// Tool output explaining the failure.
        detail: String,
    },
    /// A SQL asset expected in the demo project is absent.
    #[error("SQL script not found: {}", .0.display())]
    MissingScript(PathBuf),
    /// A supporting asset (not a SQL script) is absent.
    #[error("required file not found: {}", .0.display())]
    MissingAsset(PathBuf),
    /// A remote invocation exited non-zero.
    #[error("{step} failed with exit code {code}")]
    RemoteFailed {
        /// Label of the step that failed.
        step: String,
        /// Exit status reported by the tool (`-1` when killed by a signal).
        code: i32,
        /// Captured stderr of the tool.
        stderr: String,
        /// Last lines of the tool's stdout.
        stdout_tail: String,
    },
    /// A remote invocation exceeded its timeout and was killed.
    #[error("{step} timed out after {elapsed_ms}ms")]
    Timeout {
        /// Label of the step that timed out.
        step: String,
        /// Wall-clock time spent before the child was killed.
        elapsed_ms: u64,
    },
    /// The configured readiness poll never saw its marker.
    #[error("remote services were not ready after {waited_secs}s")]
    ReadinessTimeout {
        /// Total seconds spent polling.
        waited_secs: u64,
    },
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Local I/O error (spawning, reading prompts, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Free-form failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    pub(crate) fn missing_script(path: impl AsRef<Path>) -> Self {
        ProvisionError::MissingScript(path.as_ref().to_path_buf())
    }

    /// Process exit status the binaries use for this error.
    ///
    /// Every kind maps to `1`; there is no distinction between transient and
    /// permanent failures.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Remote output worth echoing after the error line, if any.
    ///
    /// Stderr wins; the stdout tail is used when the tool said nothing there.
    pub fn remote_detail(&self) -> Option<&str> {
        match self {
            ProvisionError::RemoteFailed {
                stderr,
                stdout_tail,
                ..
            } => [stderr.trim(), stdout_tail.trim()]
                .into_iter()
                .find(|text| !text.is_empty()),
            _ => None,
        }
    }
}
