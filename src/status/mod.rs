#![forbid(unsafe_code)]

//! Demo readiness reporting.
//!
//! A fixed batch of read-only count queries runs against the sample tables
//! and the warehouse metadata views. Each count is graded against a
//! hard-coded threshold, and the grades are folded into a single verdict.

mod catalog;
mod check;
mod report;

/// The fixed batch of checks and their thresholds.
///
/// Also provides the verification query printed at the end of a reset.
pub use catalog::{
    checks, good_rows_for, verification_query, Check, CheckKind, DEFAULT_GOOD_ROWS,
};

/// Running the batch and grading individual counts.
pub use check::{check_status, classify_objects, classify_rows, parse_count};

/// Report types and text rendering.
pub use report::{print_text, verdict, CheckResult, CheckState, StatusReport, Verdict};
