//! Destructive reset of the demo environment.
//!
//! The sequence is fixed: preflight checks, operator confirmation, cleanup,
//! a fixed settle delay, full setup, sample data, manual instructions and a
//! verification query. Any failing remote step aborts everything after it.

mod wait;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::cli::{Prompt, Ui};
use crate::config::{ReadinessSettings, Settings, Timeouts};
use crate::error::{ProvisionError, Result};
use crate::remote::{self, describe_connection, RemoteTool, Request};
use crate::status;

pub use wait::{await_readiness, settle, Clock, TokioClock};

#[cfg(test)]
pub(crate) use wait::fake::RecordingClock;

/// Pause after cleanup so the platform finishes dropping objects.
pub const CLEANUP_SETTLE_DELAY: Duration = Duration::from_secs(30);

/// Steps left to the operator once the scripted reset finishes.
pub const MANUAL_STEPS: [&str; 4] = [
    "Upload sql/05_semantic_model.yaml to @customer_360_semantic_model_stage",
    "Run sql/06_cortex_agent.sql to recreate the agent and AI functions",
    "In Snowsight, open Projects > Streamlit and create an app from the streamlit/ directory",
    "Run `demo-manager status` once search indexing has finished",
];

/// Everything the reset needs, resolved up front.
#[derive(Clone, Debug)]
pub struct ResetPlan {
    /// Connection to reset; `None` uses the tool's default connection.
    pub connection: Option<String>,
    /// Cleanup script (absolute).
    pub cleanup: PathBuf,
    /// Full setup script (absolute).
    pub setup: PathBuf,
    /// Sample data script (absolute).
    pub load: PathBuf,
    /// Query whose raw output closes the reset.
    pub verify_query: String,
    /// Delay between cleanup and setup.
    pub settle_delay: Duration,
    /// Per-invocation timeouts.
    pub timeouts: Timeouts,
    /// Optional completion poll after the data load.
    pub readiness: Option<ReadinessSettings>,
}

impl ResetPlan {
    /// Builds the plan from settings and an optional explicit connection.
    pub fn from_settings(settings: &Settings, connection: Option<String>) -> Self {
        Self {
            connection: connection.or_else(|| settings.default_connection.clone()),
            cleanup: settings.asset(&settings.reset_scripts.cleanup),
            setup: settings.asset(&settings.reset_scripts.setup),
            load: settings.asset(&settings.reset_scripts.load),
            verify_query: status::verification_query(&settings.qualified_schema()),
            settle_delay: CLEANUP_SETTLE_DELAY,
            timeouts: settings.timeouts,
            readiness: settings.readiness.clone(),
        }
    }

    fn scripts(&self) -> [&Path; 3] {
        [
            self.cleanup.as_path(),
            self.setup.as_path(),
            self.load.as_path(),
        ]
    }
}

/// How a reset ended without error.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ResetOutcome {
    /// The operator declined; nothing ran.
    Declined,
    /// Every step succeeded.
    Completed {
        /// Raw output of the verification query.
        verification: String,
        /// Total wall-clock time in milliseconds.
        duration_ms: u64,
    },
}

/// Runs [`ResetPlan`]s against a remote tool.
pub struct Sequencer<'a, R, C> {
    tool: &'a R,
    clock: &'a C,
    ui: &'a Ui,
}

impl<'a, R: RemoteTool, C: Clock> Sequencer<'a, R, C> {
    /// Creates a sequencer.
    pub fn new(tool: &'a R, clock: &'a C, ui: &'a Ui) -> Self {
        Self { tool, clock, ui }
    }

    /// Executes the reset. Returns at the first failure.
    pub async fn run<P: Prompt>(&self, plan: &ResetPlan, prompt: &mut P) -> Result<ResetOutcome> {
        let started = std::time::Instant::now();
        let connection = plan.connection.as_deref();
        let ui = self.ui;

        ui.banner("CUSTOMER 360 DEMO RESET");
        self.preflight(plan).await?;

        ui.spacer();
        ui.warn(&format!(
            "This drops and recreates every demo object on connection {}.",
            describe_connection(connection)
        ));
        if !prompt.confirm("Are you sure you want to reset the demo?")? {
            info!("reset.declined");
            ui.info("Reset cancelled; nothing was changed.");
            return Ok(ResetOutcome::Declined);
        }

        self.script("Demo cleanup", &plan.cleanup, plan).await?;
        settle(
            self.clock,
            ui,
            "Waiting for cleanup to settle",
            plan.settle_delay,
        )
        .await;
        self.script("Full setup", &plan.setup, plan).await?;
        self.script("Sample data load", &plan.load, plan).await?;

        if let Some(readiness) = &plan.readiness {
            let attempts = await_readiness(
                self.tool,
                self.clock,
                ui,
                connection,
                readiness,
                plan.timeouts.query,
            )
            .await?;
            ui.success(&format!("Remote services ready after {attempts} poll(s)"));
        }

        ui.spacer();
        ui.list(
            "Manual steps (not automated)",
            MANUAL_STEPS.iter().map(|step| step.to_string()),
        );

        ui.spacer();
        ui.info("Verifying demo tables");
        let output = remote::run_step(
            self.tool,
            connection,
            &Request::Query(plan.verify_query.clone()),
            plan.timeouts.query,
            "Verification query",
        )
        .await?;
        ui.raw(&output.stdout);

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(duration_ms, "reset.completed");
        ui.success("Demo reset complete");
        Ok(ResetOutcome::Completed {
            verification: output.stdout,
            duration_ms,
        })
    }

    async fn preflight(&self, plan: &ResetPlan) -> Result<()> {
        let connection = plan.connection.as_deref();
        let version = remote::ensure_installed(self.tool, plan.timeouts.probe).await?;
        self.ui.success(&format!("Found {} {version}", self.tool.program()));

        self.ui.info(&format!(
            "Testing connection {}",
            describe_connection(connection)
        ));
        remote::probe(self.tool, connection, plan.timeouts.probe).await?;
        self.ui.success("Connection successful");

        for path in plan.scripts() {
            if !path.is_file() {
                return Err(ProvisionError::missing_script(path));
            }
        }
        Ok(())
    }

    async fn script(&self, step: &str, path: &Path, plan: &ResetPlan) -> Result<()> {
        info!(step, path = %path.display(), "reset.step.started");
        let task = self.ui.task(format!("{step}: {}", path.display()));
        let result = remote::run_step(
            self.tool,
            plan.connection.as_deref(),
            &Request::Script(path.to_path_buf()),
            plan.timeouts.script,
            step,
        )
        .await;
        let elapsed = task.finish();
        result?;
        info!(step, elapsed_ms = elapsed.as_millis() as u64, "reset.step.completed");
        self.ui.success(&format!(
            "{step} completed in {}",
            crate::cli::format_duration(elapsed)
        ));
        Ok(())
    }
}
