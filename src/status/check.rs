use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{ProvisionError, Result};
use crate::remote::{describe_connection, RemoteTool, Request, RunError};

use super::catalog::{self, Check, CheckKind};
use super::report::{verdict, CheckResult, CheckState, StatusReport, Verdict};

/// Grades a table row count against its threshold.
///
/// `0` is always `Empty`; anything from `good_rows` up is `Good`; the rest is
/// `Minimal`.
pub fn classify_rows(rows: u64, good_rows: u64) -> CheckState {
    if rows == 0 {
        CheckState::Empty
    } else if rows >= good_rows {
        CheckState::Good
    } else {
        CheckState::Minimal
    }
}

/// Grades a metadata lookup count.
pub fn classify_objects(count: u64) -> CheckState {
    if count > 0 {
        CheckState::Present
    } else {
        CheckState::Missing
    }
}

/// Reads the first field of the first CSV row as a count.
pub fn parse_count(stdout: &str) -> Option<u64> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(stdout.as_bytes());
    let record = reader.records().next()?.ok()?;
    record.get(0)?.parse().ok()
}

/// Runs the status batch for `database.schema`, one query at a time.
///
/// Individual query failures are classified, not propagated. Only a tool that
/// cannot be started at all aborts the batch.
pub async fn check_status<R: RemoteTool>(
    tool: &R,
    connection: Option<&str>,
    database: &str,
    schema: &str,
    timeout: Duration,
) -> Result<StatusReport> {
    let start = Instant::now();
    let mut results = Vec::new();
    for check in catalog::checks(database, schema) {
        let result = run_check(tool, connection, &check, timeout).await?;
        debug!(
            name = %result.name,
            count = ?result.count,
            state = %result.state,
            "status.check.classified"
        );
        results.push(result);
    }
    let overall = verdict(&results);
    let report = StatusReport {
        connection: describe_connection(connection),
        schema: format!("{database}.{schema}"),
        verdict: overall,
        success: overall != Verdict::NotReady,
        checks: results,
        duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
    };
    info!(
        verdict = %report.verdict,
        checks = report.checks.len(),
        duration_ms = report.duration_ms,
        "status.completed"
    );
    Ok(report)
}

async fn run_check<R: RemoteTool>(
    tool: &R,
    connection: Option<&str>,
    check: &Check,
    timeout: Duration,
) -> Result<CheckResult> {
    let request = Request::CsvQuery(check.sql.clone());
    let (count, detail) = match tool.execute(connection, &request, timeout).await {
        Ok(output) if output.success() => match parse_count(&output.stdout) {
            Some(count) => (Some(count), None),
            None => (
                None,
                Some(format!("unexpected output: {}", output.stdout.trim())),
            ),
        },
        Ok(output) => (None, Some(first_line(&output.stderr, output.exit_code))),
        Err(RunError::Timeout { elapsed_ms }) => {
            (None, Some(format!("timed out after {elapsed_ms}ms")))
        }
        Err(RunError::Spawn(err)) => {
            return Err(ProvisionError::MissingTool {
                tool: tool.program().to_string(),
                reason: err.to_string(),
            })
        }
    };

    let state = match (check.kind, count) {
        (CheckKind::Table { good_rows }, Some(rows)) => classify_rows(rows, good_rows),
        (CheckKind::Table { .. }, None) => CheckState::Unavailable,
        (_, Some(found)) => classify_objects(found),
        (_, None) => CheckState::Missing,
    };
    Ok(CheckResult {
        name: check.name.clone(),
        kind: check.kind,
        count,
        state,
        detail,
    })
}

fn first_line(stderr: &str, code: i32) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("query exited with code {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::{exit, ok, FakeTool};
    use crate::status::catalog::{good_rows_for, DEFAULT_GOOD_ROWS};
    use proptest::prelude::*;

    #[test]
    fn documented_thresholds() {
        assert_eq!(classify_rows(0, DEFAULT_GOOD_ROWS), CheckState::Empty);
        for rows in 1..=4 {
            assert_eq!(classify_rows(rows, DEFAULT_GOOD_ROWS), CheckState::Minimal);
        }
        assert_eq!(classify_rows(5, DEFAULT_GOOD_ROWS), CheckState::Good);
        assert_eq!(classify_rows(500, DEFAULT_GOOD_ROWS), CheckState::Good);

        let activities = good_rows_for("CUSTOMER_ACTIVITIES").expect("threshold");
        assert_eq!(classify_rows(4, activities), CheckState::Minimal);
        assert_eq!(classify_rows(5, activities), CheckState::Good);
    }

    #[test]
    fn object_counts() {
        assert_eq!(classify_objects(0), CheckState::Missing);
        assert_eq!(classify_objects(1), CheckState::Present);
    }

    #[test]
    fn counts_parse_from_csv_output() {
        assert_eq!(parse_count("42\n"), Some(42));
        assert_eq!(parse_count("\"7\"\n"), Some(7));
        assert_eq!(parse_count("  3 ,extra\n"), Some(3));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("COUNT(*)\n"), None);
    }

    proptest! {
        #[test]
        fn classification_matches_threshold(rows in 0u64..10_000, good_rows in 1u64..100) {
            let state = classify_rows(rows, good_rows);
            let expected = if rows == 0 {
                CheckState::Empty
            } else if rows < good_rows {
                CheckState::Minimal
            } else {
                CheckState::Good
            };
            prop_assert_eq!(state, expected);
        }
    }

    #[tokio::test]
    async fn healthy_demo_is_ready() {
        let tool = FakeTool::new(|_| Ok(ok("12\n")));
        let report = check_status(&tool, Some("demo"), "DB", "PUBLIC", Duration::from_secs(5))
            .await
            .expect("status");
        assert_eq!(report.verdict, Verdict::Ready);
        assert!(report.success);
        assert_eq!(report.checks.len(), 9);
        assert!(tool
            .calls()
            .iter()
            .all(|call| matches!(call, Request::CsvQuery(_))));
    }

    #[tokio::test]
    async fn thin_data_and_missing_service_is_partial() {
        let tool = FakeTool::new(|request| match request {
            Request::CsvQuery(sql) if sql.contains("PURCHASES") => Ok(ok("2\n")),
            Request::CsvQuery(sql) if sql.contains("CORTEX_SEARCH_SERVICES") => Ok(ok("0\n")),
            _ => Ok(ok("25\n")),
        });
        let report = check_status(&tool, None, "DB", "PUBLIC", Duration::from_secs(5))
            .await
            .expect("status");
        assert_eq!(report.verdict, Verdict::Partial);
        let purchases = report
            .checks
            .iter()
            .find(|c| c.name == "PURCHASES")
            .expect("purchases");
        assert_eq!(purchases.state, CheckState::Minimal);
        assert_eq!(purchases.count, Some(2));
        let search = report
            .checks
            .iter()
            .find(|c| c.name == "CUSTOMER_DOCUMENTS_SEARCH")
            .expect("search");
        assert_eq!(search.state, CheckState::Missing);
    }

    #[tokio::test]
    async fn unreadable_table_is_not_ready() {
        let tool = FakeTool::new(|request| match request {
            Request::CsvQuery(sql) if sql.contains(".CUSTOMERS;") => Ok(exit(
                1,
                "002003 (42S02): SQL compilation error:\nObject 'CUSTOMERS' does not exist",
            )),
            _ => Ok(ok("25\n")),
        });
        let report = check_status(&tool, None, "DB", "PUBLIC", Duration::from_secs(5))
            .await
            .expect("status");
        assert_eq!(report.verdict, Verdict::NotReady);
        assert!(!report.success);
        let customers = &report.checks[0];
        assert_eq!(customers.state, CheckState::Unavailable);
        assert_eq!(
            customers.detail.as_deref(),
            Some("002003 (42S02): SQL compilation error:")
        );
    }

    #[tokio::test]
    async fn unstartable_tool_aborts_batch() {
        let tool = FakeTool::new(|_| {
            Err(RunError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not found",
            )))
        });
        let err = check_status(&tool, None, "DB", "PUBLIC", Duration::from_secs(5))
            .await
            .expect_err("spawn");
        assert!(matches!(err, ProvisionError::MissingTool { .. }));
        assert_eq!(tool.calls().len(), 1);
    }
}
