//! Report emitted by `py.test --json`
//!
//! Only the fields the runner reads are modelled. Anything that does not fit
//! this shape is rejected by serde and surfaces as a parse error. Outcome
//! strings are an open set: plugins add their own, which are kept verbatim.

use serde::{Deserialize, Serialize};

/// Top-level document written to the report channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub report: Report,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: ReportSummary,
    #[serde(default)]
    pub tests: Vec<ReportCase>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    /// Wall time of the whole file, in seconds
    pub duration: f64,
}

/// Outcome values written by pytest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaseOutcome {
    Passed,
    Failed,
    Skipped,
    Xfailed,
    Xpassed,
    Error,
    /// Plugin-specific outcome such as `rerun`
    Other(String),
}

impl CaseOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            CaseOutcome::Passed => "passed",
            CaseOutcome::Failed => "failed",
            CaseOutcome::Skipped => "skipped",
            CaseOutcome::Xfailed => "xfailed",
            CaseOutcome::Xpassed => "xpassed",
            CaseOutcome::Error => "error",
            CaseOutcome::Other(raw) => raw,
        }
    }
}

impl From<String> for CaseOutcome {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "passed" => CaseOutcome::Passed,
            "failed" => CaseOutcome::Failed,
            "skipped" => CaseOutcome::Skipped,
            "xfailed" => CaseOutcome::Xfailed,
            "xpassed" => CaseOutcome::Xpassed,
            "error" => CaseOutcome::Error,
            _ => CaseOutcome::Other(raw),
        }
    }
}

impl From<CaseOutcome> for String {
    fn from(outcome: CaseOutcome) -> Self {
        match outcome {
            CaseOutcome::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportCase {
    pub name: String,
    pub outcome: CaseOutcome,
    /// Seconds spent in the case
    #[serde(default)]
    pub duration: Option<f64>,
    pub call: CallPhase,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallPhase {
    pub outcome: CaseOutcome,
    #[serde(default)]
    pub longrepr: String,
}

impl JsonReport {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl ReportCase {
    pub fn is_failed(&self) -> bool {
        self.outcome == CaseOutcome::Failed
    }

    pub fn call_failed(&self) -> bool {
        self.call.outcome == CaseOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let text = r#"{
            "report": {
                "summary": {"passed": 1, "failed": 1, "duration": 0.25},
                "tests": [
                    {"name": "test_ok", "outcome": "passed", "duration": 0.1,
                     "call": {"outcome": "passed"}},
                    {"name": "test_bad", "outcome": "failed",
                     "call": {"outcome": "failed", "longrepr": "assert 1 == 2"}}
                ]
            }
        }"#;

        let parsed = JsonReport::parse(text).unwrap();
        assert_eq!(parsed.report.summary.passed, 1);
        assert_eq!(parsed.report.tests.len(), 2);
        assert!(!parsed.report.tests[0].is_failed());
        assert_eq!(parsed.report.tests[0].call.longrepr, "");
        assert!(parsed.report.tests[1].call_failed());
        assert_eq!(parsed.report.tests[1].duration, None);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let parsed = JsonReport::parse(r#"{"report": {"summary": {"duration": 0}}}"#).unwrap();
        assert_eq!(parsed.report.summary.passed, 0);
        assert_eq!(parsed.report.summary.failed, 0);
        assert!(parsed.report.tests.is_empty());
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(JsonReport::parse("").is_err());
        assert!(JsonReport::parse(r#"{"summary": {"duration": 1}}"#).is_err());
        assert!(JsonReport::parse(r#"{"report": {"summary": {"passed": "3", "duration": 1}}}"#).is_err());
        assert!(JsonReport::parse(
            r#"{"report": {"summary": {"duration": 1}, "tests": [{"name": "t", "outcome": 3, "call": {"outcome": "passed"}}]}}"#
        )
        .is_err());
    }

    #[test]
    fn test_unknown_outcome_kept_verbatim() {
        let text = r#"{"report": {"summary": {"passed": 1, "duration": 1}, "tests": [
            {"name": "test_flaky", "outcome": "rerun", "call": {"outcome": "rerun", "longrepr": "retrying"}}
        ]}}"#;

        let parsed = JsonReport::parse(text).unwrap();
        let case = &parsed.report.tests[0];
        assert_eq!(case.outcome, CaseOutcome::Other("rerun".to_string()));
        assert_eq!(case.outcome.as_str(), "rerun");
        assert!(!case.is_failed());
        assert!(!case.call_failed());

        let value = serde_json::to_value(case).unwrap();
        assert_eq!(value["outcome"], "rerun");
        assert_eq!(value["call"]["outcome"], "rerun");
    }

    #[test]
    fn test_known_outcomes_map_to_variants() {
        assert_eq!(CaseOutcome::from("xfailed".to_string()), CaseOutcome::Xfailed);
        assert_eq!(String::from(CaseOutcome::Error), "error");
    }
}
