//! Step-by-step demo management.
//!
//! Each operation of the interactive demo manager works on a single verified
//! connection: cleanup, database setup, search setup, agent setup, status,
//! and the complete run. Unlike the reset sequencer, the complete run keeps
//! going after a failed step and reports every failure at the end.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{format_duration, Prompt, Ui};
use crate::config::{
    Settings, AGENT_SCRIPT, CLEANUP_SCRIPT, DATABASE_SCRIPT, SAMPLE_DATA_SCRIPT, SEARCH_SCRIPT,
    SEMANTIC_MODEL, TABLES_SCRIPT,
};
use crate::error::{ProvisionError, Result};
use crate::remote::{self, describe_connection, RemoteTool, Request};
use crate::sequence::Clock;
use crate::status::{self, StatusReport};

/// Pause between the database setup scripts.
pub const SETUP_STEP_PAUSE: Duration = Duration::from_secs(2);

const DATABASE_STEPS: [(&str, &str); 3] = [
    (DATABASE_SCRIPT, "Database and warehouse setup"),
    (TABLES_SCRIPT, "Table creation"),
    (SAMPLE_DATA_SCRIPT, "Sample data loading"),
];

/// Follow-up checklist printed after a complete setup.
pub const NEXT_STEPS: [(&str, &[&str]); 4] = [
    (
        "Verify all components are working",
        &[
            "Check Cortex Search services are indexed",
            "Test AI functions",
        ],
    ),
    (
        "Deploy the Streamlit application",
        &[
            "Go to Snowsight > AI & ML > Studio",
            "Create a new Streamlit app",
            "Upload files from the streamlit/ directory",
        ],
    ),
    (
        "Test demo scenarios",
        &[
            "High-value customer analysis",
            "Churn risk assessment",
            "Support issue analysis",
            "Revenue optimization",
        ],
    ),
    ("Demo is ready", &[]),
];

/// Entries of the interactive menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    /// Drop every demo object.
    Cleanup,
    /// Database, tables, sample data.
    Database,
    /// Search services.
    Search,
    /// Agent and AI functions.
    Agent,
    /// Readiness report.
    Status,
    /// Every setup step in order.
    Complete,
    /// Follow-up checklist.
    NextSteps,
    /// Leave the menu.
    Exit,
}

impl MenuChoice {
    /// Menu lines in display order.
    pub const ENTRIES: [(MenuChoice, &'static str); 8] = [
        (MenuChoice::Cleanup, "Clean up existing demo"),
        (MenuChoice::Database, "Set up database and tables"),
        (MenuChoice::Search, "Set up Cortex Search"),
        (MenuChoice::Agent, "Set up Cortex Agent"),
        (MenuChoice::Status, "Check demo status"),
        (MenuChoice::Complete, "Complete setup (all steps)"),
        (MenuChoice::NextSteps, "Show next steps"),
        (MenuChoice::Exit, "Exit"),
    ];

    /// Parses a menu number (`1`-`8`).
    pub fn parse(input: &str) -> Option<Self> {
        let index: usize = input.trim().parse().ok()?;
        Self::ENTRIES
            .get(index.checked_sub(1)?)
            .map(|(choice, _)| *choice)
    }
}

/// Result of a complete setup run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CompleteReport {
    /// Steps that failed or were skipped, in order.
    pub failed_steps: Vec<String>,
}

impl CompleteReport {
    /// Whether every step completed.
    pub fn success(&self) -> bool {
        self.failed_steps.is_empty()
    }
}

/// Demo operations bound to one connection.
pub struct DemoManager<'a, R, C> {
    tool: &'a R,
    clock: &'a C,
    ui: &'a Ui,
    settings: &'a Settings,
    connection: Option<String>,
}

impl<'a, R: RemoteTool, C: Clock> DemoManager<'a, R, C> {
    /// Creates a manager for `connection` (already verified by the caller).
    pub fn new(
        tool: &'a R,
        clock: &'a C,
        ui: &'a Ui,
        settings: &'a Settings,
        connection: Option<String>,
    ) -> Self {
        Self {
            tool,
            clock,
            ui,
            settings,
            connection,
        }
    }

    /// Connection the manager works on.
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Drops every demo object after confirmation.
    ///
    /// Returns `false` when the operator cancels.
    pub async fn cleanup<P: Prompt>(&self, prompt: &mut P, assume_yes: bool) -> Result<bool> {
        self.ui.banner("CLEANING UP EXISTING DEMO");
        self.ui.warn("This will delete all existing demo data!");
        if !assume_yes && !prompt.confirm("Continue?")? {
            self.ui.info("Cleanup cancelled");
            return Ok(false);
        }
        self.execute_sql_file(CLEANUP_SCRIPT, "Demo cleanup").await?;
        Ok(true)
    }

    /// Runs the database, table and sample data scripts, pausing between them.
    pub async fn setup_database(&self) -> Result<()> {
        self.ui.banner("SETTING UP DATABASE");
        for (script, description) in DATABASE_STEPS {
            self.execute_sql_file(script, description).await?;
            self.clock.sleep(SETUP_STEP_PAUSE).await;
        }
        Ok(())
    }

    /// Creates the search services; indexing continues remotely afterwards.
    pub async fn setup_search(&self) -> Result<()> {
        self.ui.banner("SETTING UP CORTEX SEARCH");
        self.ui.warn("This may take 5-10 minutes for indexing");
        self.execute_sql_file(SEARCH_SCRIPT, "Cortex Search services")
            .await?;
        self.ui.info("Search services created. Indexing in progress...");
        Ok(())
    }

    /// Creates the agent once the operator has uploaded the semantic model.
    ///
    /// Returns `false` when the operator has not uploaded it yet.
    pub async fn setup_agent<P: Prompt>(&self, prompt: &mut P, uploaded: bool) -> Result<bool> {
        self.ui.banner("SETTING UP CORTEX AGENT");
        let model = self.settings.asset(SEMANTIC_MODEL);
        if !model.is_file() {
            return Err(ProvisionError::MissingAsset(model));
        }
        self.ui.warn("Manual step required:");
        self.ui.info(&format!(
            "1. Upload {SEMANTIC_MODEL} to customer_360_semantic_model_stage"
        ));
        self.ui.info(&format!("2. Then run {AGENT_SCRIPT}"));
        if !uploaded && !prompt.confirm("Have you uploaded the semantic model?")? {
            self.ui.warn("Cortex Agent setup skipped");
            return Ok(false);
        }
        self.execute_sql_file(AGENT_SCRIPT, "Cortex Agent setup")
            .await?;
        Ok(true)
    }

    /// Runs the readiness checks.
    pub async fn status(&self) -> Result<StatusReport> {
        status::check_status(
            self.tool,
            self.connection(),
            &self.settings.database,
            &self.settings.schema,
            self.settings.timeouts.query,
        )
        .await
    }

    /// Cleanup, database, search and agent in order, continuing past failures.
    pub async fn complete_setup<P: Prompt>(
        &self,
        prompt: &mut P,
        assume_yes: bool,
        uploaded: bool,
    ) -> CompleteReport {
        self.ui.banner("COMPLETE DEMO SETUP");
        let mut report = CompleteReport::default();

        let cleanup = self.cleanup(prompt, assume_yes).await;
        self.record(&mut report, "Clean up existing demo", cleanup);
        let database = self.setup_database().await.map(|()| true);
        self.record(&mut report, "Set up database", database);
        let search = self.setup_search().await.map(|()| true);
        self.record(&mut report, "Set up Cortex Search", search);
        let agent = self.setup_agent(prompt, uploaded).await;
        self.record(&mut report, "Set up Cortex Agent", agent);

        if report.success() {
            self.ui.success("Complete setup finished successfully!");
            print_next_steps(self.ui);
        } else {
            self.ui
                .list("Some steps failed", report.failed_steps.iter().cloned());
        }
        report
    }

    /// Numbered menu loop. Returns when the operator exits or input ends.
    pub async fn run_menu<P: Prompt>(&self, prompt: &mut P) -> Result<()> {
        loop {
            self.ui.banner("CUSTOMER 360 DEMO MANAGER");
            for (index, (_, label)) in MenuChoice::ENTRIES.iter().enumerate() {
                self.ui.raw(&format!("  {}. {label}", index + 1));
            }
            self.ui.spacer();

            let Some(answer) = prompt.ask("Select option (1-8): ")? else {
                return Ok(());
            };
            let Some(choice) = MenuChoice::parse(&answer) else {
                self.ui.warn("Invalid option. Please select 1-8.");
                continue;
            };
            if choice == MenuChoice::Exit {
                self.ui.info("Goodbye!");
                return Ok(());
            }

            if let Err(err) = self.dispatch(choice, prompt).await {
                warn!(?choice, %err, "manager.menu.failed");
                self.ui.error(&err.to_string());
                if let Some(detail) = err.remote_detail() {
                    self.ui.error(detail);
                }
            }

            if prompt.ask("\nPress Enter to continue...")?.is_none() {
                return Ok(());
            }
        }
    }

    async fn dispatch<P: Prompt>(&self, choice: MenuChoice, prompt: &mut P) -> Result<()> {
        info!(?choice, "manager.menu.selected");
        match choice {
            MenuChoice::Cleanup => self.cleanup(prompt, false).await.map(drop),
            MenuChoice::Database => self.setup_database().await,
            MenuChoice::Search => self.setup_search().await,
            MenuChoice::Agent => self.setup_agent(prompt, false).await.map(drop),
            MenuChoice::Status => {
                let report = self.status().await?;
                status::print_text(self.ui, &report);
                Ok(())
            }
            MenuChoice::Complete => {
                self.complete_setup(prompt, false, false).await;
                Ok(())
            }
            MenuChoice::NextSteps => {
                print_next_steps(self.ui);
                Ok(())
            }
            MenuChoice::Exit => Ok(()),
        }
    }

    fn record(&self, report: &mut CompleteReport, step: &str, result: Result<bool>) {
        match result {
            Ok(true) => {}
            Ok(false) => report.failed_steps.push(step.to_string()),
            Err(err) => {
                warn!(step, %err, "manager.complete.step_failed");
                self.ui.error(&format!("{step}: {err}"));
                report.failed_steps.push(step.to_string());
            }
        }
    }

    async fn execute_sql_file(&self, relative: &str, description: &str) -> Result<()> {
        let path = self.settings.asset(relative);
        if !path.is_file() {
            return Err(ProvisionError::missing_script(&path));
        }
        self.ui.info(&format!("Executing: {description}"));
        self.ui.info(&format!("File: {relative}"));
        let task = self.ui.task(description.to_string());
        let result = remote::run_step(
            self.tool,
            self.connection(),
            &Request::Script(path),
            self.settings.timeouts.script,
            description,
        )
        .await;
        let elapsed = task.finish();
        result?;
        self.ui.success(&format!(
            "{description} completed successfully ({})",
            format_duration(elapsed)
        ));
        Ok(())
    }
}

/// Prints the follow-up checklist.
pub fn print_next_steps(ui: &Ui) {
    ui.banner("NEXT STEPS");
    for (index, (title, items)) in NEXT_STEPS.iter().enumerate() {
        let title = format!("{}. {title}", index + 1);
        if items.is_empty() {
            ui.success(&title);
        } else {
            ui.list(&title, items.iter().map(|item| item.to_string()));
        }
    }
}

/// Resolves the connection for an interactive session.
///
/// A preset connection is probed once and must work. Without one, the
/// operator is asked for a name until the probe succeeds; `Ok(None)` means
/// input ended first.
pub async fn select_connection<R: RemoteTool, P: Prompt>(
    tool: &R,
    ui: &Ui,
    prompt: &mut P,
    preset: Option<String>,
    timeout: Duration,
) -> Result<Option<String>> {
    if let Some(name) = preset {
        ui.info(&format!("Testing connection {}", describe_connection(Some(&name))));
        remote::probe(tool, Some(&name), timeout).await?;
        ui.success("Connection successful!");
        return Ok(Some(name));
    }

    ui.banner("SNOWFLAKE CONNECTION SETUP");
    ui.info("Available connections:");
    match remote::list_connections(tool, timeout).await {
        Some(listing) => ui.raw(&listing),
        None => ui.warn("Could not list connections"),
    }
    loop {
        let Some(answer) = prompt.ask("Enter Snowflake connection name: ")? else {
            return Ok(None);
        };
        let name = answer.trim();
        if name.is_empty() {
            ui.warn("Please enter a valid connection name.");
            continue;
        }
        ui.info(&format!("Testing connection: {name}"));
        match remote::probe(tool, Some(name), timeout).await {
            Ok(()) => {
                ui.success("Connection successful!");
                return Ok(Some(name.to_string()));
            }
            Err(ProvisionError::ConnectionFailed { detail, .. }) => {
                ui.error(&format!("Connection test failed: {detail}"));
                ui.warn("Please try again.");
            }
            Err(err) => return Err(err),
        }
    }
}
