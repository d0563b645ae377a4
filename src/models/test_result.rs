//! Per-file test result models
//!
//! The field names serialize in camelCase and form the contract with
//! reporters, so they must stay stable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::report::{CaseOutcome, Report, ReportCase};
use crate::output::format_failure_message;

/// Start and end of a file run, in epoch milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfStats {
    pub start: i64,
    pub end: i64,
}

impl PerfStats {
    /// Derive `start` from a completion time and a duration in seconds
    pub fn ending_at(end: i64, duration_secs: f64) -> Self {
        let elapsed = i64::try_from(secs_to_ms(duration_secs)).unwrap_or(i64::MAX);
        Self {
            start: end.saturating_sub(elapsed),
            end,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.end - self.start).max(0) as u64
    }
}

/// Snapshot counters; always zero since snapshots are not supported
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub added: u32,
    pub file_deleted: bool,
    pub matched: u32,
    pub unchecked: u32,
    pub unmatched: u32,
    pub updated: u32,
}

/// Result of one case inside a test file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    pub ancestor_titles: Vec<String>,
    /// Milliseconds, when the report carried a duration
    pub duration: Option<u64>,
    pub failure_messages: Vec<String>,
    pub full_name: String,
    pub num_passing_asserts: u32,
    pub status: CaseOutcome,
    pub title: String,
}

impl From<&ReportCase> for AssertionResult {
    fn from(case: &ReportCase) -> Self {
        let failure_messages = if case.call_failed() {
            vec![case.call.longrepr.clone()]
        } else {
            Vec::new()
        };

        Self {
            ancestor_titles: Vec::new(),
            duration: case.duration.map(secs_to_ms),
            failure_messages,
            full_name: case.name.clone(),
            num_passing_asserts: u32::from(case.outcome == CaseOutcome::Passed),
            status: case.outcome.clone(),
            title: case.name.clone(),
        }
    }
}

/// Normalized result for one test file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileResult {
    pub console: Option<serde_json::Value>,
    pub failure_message: Option<String>,
    pub num_failing_tests: u32,
    pub num_passing_tests: u32,
    pub num_pending_tests: u32,
    pub perf_stats: PerfStats,
    pub skipped: bool,
    pub snapshot: SnapshotSummary,
    pub source_maps: HashMap<String, String>,
    pub test_exec_error: Option<String>,
    pub test_file_path: PathBuf,
    pub test_results: Vec<AssertionResult>,
}

impl TestFileResult {
    /// Map a parsed report onto the result schema.
    ///
    /// `end` is the completion time in epoch milliseconds; the output depends
    /// only on the arguments.
    pub fn from_report(path: &Path, report: &Report, end: i64, colorize: bool) -> Self {
        let summary = &report.summary;
        let failure_message = (summary.failed > 0)
            .then(|| format_failure_message(&report.tests, colorize));

        Self {
            console: None,
            failure_message,
            num_failing_tests: summary.failed,
            num_passing_tests: summary.passed,
            num_pending_tests: 0,
            perf_stats: PerfStats::ending_at(end, summary.duration),
            skipped: false,
            snapshot: SnapshotSummary::default(),
            source_maps: HashMap::new(),
            test_exec_error: None,
            test_file_path: path.to_path_buf(),
            test_results: report.tests.iter().map(AssertionResult::from).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.num_failing_tests == 0
    }
}

impl fmt::Display for TestFileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.is_success() { "✓" } else { "✗" };
        write!(
            f,
            "{} {} [{}ms] - {} passed, {} failed",
            symbol,
            self.test_file_path.display(),
            self.perf_stats.duration_ms(),
            self.num_passing_tests,
            self.num_failing_tests
        )
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
