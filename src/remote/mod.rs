//! Remote warehouse access through the vendor query tool.
//!
//! [`RemoteTool`] is the seam between the orchestration code and the child
//! process. [`SnowSql`] is the production implementation; tests substitute
//! recording fakes.

mod snowsql;
mod subprocess;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ProvisionError, Result};

pub use snowsql::SnowSql;
pub use subprocess::{run_command, RunError, ToolOutput};

/// Trivial query proving the connection is usable.
pub const PROBE_QUERY: &str = "SELECT CURRENT_USER();";

/// Stdout lines kept on a failed step.
const STDOUT_TAIL_LINES: usize = 20;

/// One call of the remote tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Run a whole SQL file; SQL errors abort the file with a non-zero exit.
    Script(PathBuf),
    /// Run a literal query and keep the tool's terminal formatting.
    Query(String),
    /// Run a literal query and emit bare CSV rows (no header, no banners).
    CsvQuery(String),
    /// List the connections configured for the tool. Ignores the connection.
    ListConnections,
}

/// A command-line client able to run requests against a named connection.
pub trait RemoteTool {
    /// Program name used in diagnostics.
    fn program(&self) -> &str;

    /// Runs the tool's version command.
    fn version(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = std::result::Result<ToolOutput, RunError>> + Send;

    /// Runs `request` on `connection` (`None` selects the tool's default).
    fn execute(
        &self,
        connection: Option<&str>,
        request: &Request,
        timeout: Duration,
    ) -> impl Future<Output = std::result::Result<ToolOutput, RunError>> + Send;
}

/// Human-readable name of a connection selection.
pub fn describe_connection(connection: Option<&str>) -> String {
    match connection {
        Some(name) => format!("'{name}'"),
        None => "<default>".to_string(),
    }
}

/// Fails with [`ProvisionError::MissingTool`] unless the tool runs.
///
/// Returns the first line the version command printed.
pub async fn ensure_installed<R: RemoteTool>(tool: &R, timeout: Duration) -> Result<String> {
    let missing = |reason: String| ProvisionError::MissingTool {
        tool: tool.program().to_string(),
        reason,
    };
    match tool.version(timeout).await {
        Ok(output) if output.success() => {
            let version = output.stdout.lines().next().unwrap_or("").trim().to_string();
            info!(tool = tool.program(), %version, "remote.tool.found");
            Ok(version)
        }
        Ok(output) => Err(missing(format!(
            "version check exited with code {}",
            output.exit_code
        ))),
        Err(err) => Err(missing(err.to_string())),
    }
}

/// Runs [`PROBE_QUERY`], mapping any failure to [`ProvisionError::ConnectionFailed`].
pub async fn probe<R: RemoteTool>(
    tool: &R,
    connection: Option<&str>,
    timeout: Duration,
) -> Result<()> {
    let failed = |detail: String| ProvisionError::ConnectionFailed {
        connection: describe_connection(connection),
        detail,
    };
    let request = Request::Query(PROBE_QUERY.to_string());
    match tool.execute(connection, &request, timeout).await {
        Ok(output) if output.success() => {
            info!(connection = ?connection, "remote.probe.ok");
            Ok(())
        }
        Ok(output) => {
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() {
                format!("probe exited with code {}", output.exit_code)
            } else {
                stderr.to_string()
            };
            warn!(connection = ?connection, code = output.exit_code, "remote.probe.failed");
            Err(failed(detail))
        }
        Err(err) => Err(failed(err.to_string())),
    }
}

/// Lists the configured connections.
///
/// `None` means the tool could not produce a listing; callers only warn.
pub async fn list_connections<R: RemoteTool>(tool: &R, timeout: Duration) -> Option<String> {
    match tool.execute(None, &Request::ListConnections, timeout).await {
        Ok(output) if output.success() => Some(output.stdout),
        Ok(output) => {
            warn!(code = output.exit_code, "remote.connections.failed");
            None
        }
        Err(err) => {
            warn!(%err, "remote.connections.failed");
            None
        }
    }
}

/// Runs one labeled step, failing fast on timeouts and non-zero exits.
pub async fn run_step<R: RemoteTool>(
    tool: &R,
    connection: Option<&str>,
    request: &Request,
    timeout: Duration,
    step: &str,
) -> Result<ToolOutput> {
    info!(step, ?request, "remote.exec.started");
    let output = match tool.execute(connection, request, timeout).await {
        Ok(output) => output,
        Err(RunError::Timeout { elapsed_ms }) => {
            warn!(step, elapsed_ms, "remote.exec.timeout");
            return Err(ProvisionError::Timeout {
                step: step.to_string(),
                elapsed_ms,
            });
        }
        Err(RunError::Spawn(err)) => {
            return Err(ProvisionError::MissingTool {
                tool: tool.program().to_string(),
                reason: err.to_string(),
            })
        }
    };
    if !output.success() {
        warn!(step, code = output.exit_code, "remote.exec.failed");
        return Err(ProvisionError::RemoteFailed {
            step: step.to_string(),
            code: output.exit_code,
            stdout_tail: tail_lines(&output.stdout, STDOUT_TAIL_LINES),
            stderr: output.stderr,
        });
    }
    info!(step, duration_ms = output.duration_ms, "remote.exec.completed");
    Ok(output)
}

fn tail_lines(text: &str, keep: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(keep)..].join("\n")
}
