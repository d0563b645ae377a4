//! Output formatters for file results
//!
//! Provides table, JSON, and summary output for the command line.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::error::TestFailure;
use crate::executor::RunSummary;
use crate::models::{TestDescriptor, TestFileResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the result of one file
    pub fn format_result(&self, result: &TestFileResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => result.to_string(),
        }
    }

    fn format_result_table(&self, result: &TestFileResult) -> String {
        let status_str = match (result.is_success(), self.colorize) {
            (true, true) => "\x1b[32m✓ PASS\x1b[0m",
            (false, true) => "\x1b[31m✗ FAIL\x1b[0m",
            (true, false) => "✓ PASS",
            (false, false) => "✗ FAIL",
        };

        let mut output = format!(
            "{} {:40} {:3} passed {:3} failed [{:>6}ms]",
            status_str,
            result.test_file_path.display(),
            result.num_passing_tests,
            result.num_failing_tests,
            result.perf_stats.duration_ms()
        );

        if let Some(message) = &result.failure_message {
            output.push_str("\n\n");
            output.push_str(message);
        }
        output
    }

    /// Format a file that produced no result
    pub fn format_failure(&self, test: &TestDescriptor, failure: &TestFailure) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct FailureJson<'a> {
                    test_file_path: &'a Path,
                    kind: &'a str,
                    message: String,
                    #[serde(skip_serializing_if = "Option::is_none")]
                    raw_output: Option<&'a str>,
                }

                let raw_output = match failure {
                    TestFailure::Execution(e) => e.raw_output(),
                    TestFailure::Cancelled => None,
                };
                let json = FailureJson {
                    test_file_path: test.path(),
                    kind: failure.kind(),
                    message: failure.to_string(),
                    raw_output,
                };

                if self.format == OutputFormat::JsonPretty {
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                } else {
                    serde_json::to_string(&json).unwrap_or_default()
                }
            }
            OutputFormat::Table | OutputFormat::Summary => {
                let label = if failure.is_cancelled() { "○ SKIP" } else { "! ERROR" };
                let label = if self.colorize {
                    format!("\x1b[33m{label}\x1b[0m")
                } else {
                    label.to_string()
                };
                format!("{} {} - {}", label, test, failure)
            }
        }
    }

    /// Format totals for a finished run
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct SummaryJson {
                    num_total_test_suites: usize,
                    num_passed_test_suites: usize,
                    num_failed_test_suites: usize,
                    num_runtime_error_test_suites: usize,
                    num_cancelled_test_suites: usize,
                    num_passed_tests: u64,
                    num_failed_tests: u64,
                    duration_ms: u64,
                }

                let json = SummaryJson {
                    num_total_test_suites: summary.total,
                    num_passed_test_suites: summary.passed_files,
                    num_failed_test_suites: summary.failed_files,
                    num_runtime_error_test_suites: summary.errored,
                    num_cancelled_test_suites: summary.cancelled,
                    num_passed_tests: summary.num_passing_tests,
                    num_failed_tests: summary.num_failing_tests,
                    duration_ms: summary.duration_ms,
                };

                if self.format == OutputFormat::JsonPretty {
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                } else {
                    serde_json::to_string(&json).unwrap_or_default()
                }
            }
            OutputFormat::Summary => format!(
                "{}/{} files passed ({:.1}%) in {}ms",
                summary.passed_files,
                summary.total,
                summary.pass_rate(),
                summary.duration_ms
            ),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed_files)
        } else {
            summary.passed_files.to_string()
        };
        let fail_count = summary.failed_files + summary.errored;
        let fail_str = if self.colorize && fail_count > 0 {
            format!("\x1b[31m{fail_count}\x1b[0m")
        } else {
            fail_count.to_string()
        };

        output.push_str(&format!(
            " Files: {:3} | Pass: {} | Fail: {} | Cancelled: {}\n",
            summary.total, pass_str, fail_str, summary.cancelled
        ));
        output.push_str(&format!(
            " Tests: {} passed, {} failed\n",
            summary.num_passing_tests, summary.num_failing_tests
        ));
        output.push_str(&format!(
            " Pass Rate: {:5.1}% | Duration: {}ms\n",
            summary.pass_rate(),
            summary.duration_ms
        ));
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write collected file results as a JSON array
pub fn write_results_to_file(path: impl AsRef<Path>, results: &[TestFileResult]) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(results)?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
