use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::Ui;
use crate::config::ReadinessSettings;
use crate::error::{ProvisionError, Result};
use crate::remote::{RemoteTool, Request};

/// Source of delays. Production code sleeps on the tokio timer.
pub trait Clock {
    /// Suspends for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Clock`] backed by `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Waits the full `delay` behind a spinner.
pub async fn settle<C: Clock>(clock: &C, ui: &Ui, label: &str, delay: Duration) {
    info!(delay_secs = delay.as_secs(), "reset.settle.started");
    let task = ui.task(format!("{label} ({}s)", delay.as_secs()));
    clock.sleep(delay).await;
    task.finish();
    info!("reset.settle.completed");
}

/// Polls `readiness.query` until its output contains the ready marker.
///
/// Failed or timed-out polls count as "not ready yet". Returns the number of
/// polls made, or [`ProvisionError::ReadinessTimeout`] once the configured
/// budget is spent.
pub async fn await_readiness<R: RemoteTool, C: Clock>(
    tool: &R,
    clock: &C,
    ui: &Ui,
    connection: Option<&str>,
    readiness: &ReadinessSettings,
    query_timeout: Duration,
) -> Result<u32> {
    let marker = readiness.ready_marker.to_ascii_lowercase();
    let request = Request::CsvQuery(readiness.query.clone());
    let task = ui.task("Waiting for remote services to report ready");
    let mut waited = Duration::ZERO;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match tool.execute(connection, &request, query_timeout).await {
            Ok(output) if output.success() => {
                if output.stdout.to_ascii_lowercase().contains(&marker) {
                    task.finish();
                    info!(attempts, waited_secs = waited.as_secs(), "reset.readiness.ready");
                    return Ok(attempts);
                }
                debug!(attempts, "reset.readiness.pending");
            }
            Ok(output) => {
                warn!(attempts, code = output.exit_code, "reset.readiness.poll_failed");
            }
            Err(err) => {
                warn!(attempts, %err, "reset.readiness.poll_failed");
            }
        }
        if waited >= readiness.timeout {
            task.finish();
            return Err(ProvisionError::ReadinessTimeout {
                waited_secs: waited.as_secs(),
            });
        }
        let pause = readiness.interval.min(readiness.timeout - waited);
        clock.sleep(pause).await;
        waited += pause;
    }
}
