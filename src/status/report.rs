use std::fmt;

use serde::Serialize;

use crate::cli::Ui;

use super::catalog::CheckKind;

/// Classification of a single check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Table exists but holds no rows.
    Empty,
    /// Table holds some rows, fewer than its threshold.
    Minimal,
    /// Table meets its threshold.
    Good,
    /// Table count could not be read (usually: the table does not exist).
    Unavailable,
    /// Object exists.
    Present,
    /// Object does not exist or could not be looked up.
    Missing,
}

impl CheckState {
    /// Lower-case label used in text output.
    pub fn label(self) -> &'static str {
        match self {
            CheckState::Empty => "empty",
            CheckState::Minimal => "minimal",
            CheckState::Good => "good",
            CheckState::Unavailable => "unavailable",
            CheckState::Present => "present",
            CheckState::Missing => "missing",
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one check.
#[derive(Clone, Debug, Serialize)]
pub struct CheckResult {
    /// Object name.
    pub name: String,
    /// What was checked.
    #[serde(flatten)]
    pub kind: CheckKind,
    /// Count returned by the query, when one was read.
    pub count: Option<u64>,
    /// Classification.
    pub state: CheckState,
    /// Tool error text when the count could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall readiness of the demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every table is good and every object present.
    Ready,
    /// Usable, but some data is thin or some services are missing.
    Partial,
    /// At least one table is empty or unreadable.
    NotReady,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Ready => "ready",
            Verdict::Partial => "partial",
            Verdict::NotReady => "not ready",
        })
    }
}

/// Complete readiness report.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    /// Connection the checks ran on.
    pub connection: String,
    /// `DATABASE.SCHEMA` that was inspected.
    pub schema: String,
    /// Overall verdict.
    pub verdict: Verdict,
    /// Whether the verdict allows a demo run (`ready` or `partial`).
    pub success: bool,
    /// Individual results in check order.
    pub checks: Vec<CheckResult>,
    /// Wall-clock time of the batch in milliseconds.
    pub duration_ms: f64,
}

/// Folds individual results into a verdict.
pub fn verdict(results: &[CheckResult]) -> Verdict {
    let mut partial = false;
    for result in results {
        match result.state {
            CheckState::Empty | CheckState::Unavailable => return Verdict::NotReady,
            CheckState::Minimal | CheckState::Missing => partial = true,
            CheckState::Good | CheckState::Present => {}
        }
    }
    if partial {
        Verdict::Partial
    } else {
        Verdict::Ready
    }
}

/// Prints the report as operator text.
pub fn print_text(ui: &Ui, report: &StatusReport) {
    ui.banner("DEMO STATUS");
    ui.section(
        "Target",
        [
            ("connection", report.connection.clone()),
            ("schema", report.schema.clone()),
        ],
    );

    ui.spacer();
    ui.section(
        "Sample data",
        report
            .checks
            .iter()
            .filter_map(|check| match check.kind {
                CheckKind::Table { good_rows } => Some((
                    check.name.as_str(),
                    format!(
                        "{:<11} rows={} (good at {good_rows})",
                        check.state.label(),
                        check
                            .count
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "?".into())
                    ),
                )),
                _ => None,
            }),
    );

    ui.spacer();
    ui.section(
        "Services",
        report
            .checks
            .iter()
            .filter(|check| !matches!(check.kind, CheckKind::Table { .. }))
            .map(|check| (check.name.as_str(), format!("{} ({})", check.state, kind_label(check.kind)))),
    );

    let problems: Vec<String> = report
        .checks
        .iter()
        .filter_map(|check| check.detail.as_ref().map(|d| format!("{}: {d}", check.name)))
        .collect();
    if !problems.is_empty() {
        ui.spacer();
        ui.list("Query errors", problems);
    }

    ui.spacer();
    let summary = format!("Demo is {} (checked in {:.0} ms)", report.verdict, report.duration_ms);
    match report.verdict {
        Verdict::Ready => ui.success(&summary),
        Verdict::Partial => ui.warn(&summary),
        Verdict::NotReady => ui.error(&summary),
    }
}

fn kind_label(kind: CheckKind) -> &'static str {
    match kind {
        CheckKind::Table { .. } => "table",
        CheckKind::SearchService => "search service",
        CheckKind::Function => "function",
        CheckKind::Stage => "stage",
    }
}
