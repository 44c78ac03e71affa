#![forbid(unsafe_code)]

//! Operator-facing terminal plumbing shared by the binaries.
//!
//! This covers styled output ([`Ui`]), operator questions ([`Prompt`]) and
//! the tracing subscriber setup.

mod prompt;
mod ui;

use tracing_subscriber::{fmt, EnvFilter};

#[cfg(test)]
pub(crate) use prompt::ScriptedPrompt;
pub use prompt::{LinePrompt, Prompt};
pub use ui::{format_duration, TaskGuard, Theme, Ui};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "C360_DEMO_LOG";

/// Installs a stderr tracing subscriber filtered by [`LOG_ENV`] (default `warn`).
///
/// Stdout stays reserved for operator text and JSON reports.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
