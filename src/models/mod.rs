//! Data models for test execution
//!
//! Input descriptors, the consumed pytest report, and the produced results.

pub mod descriptor;
pub mod report;
mod test_result;

pub use descriptor::{ProjectConfig, TestContext, TestDescriptor};
pub use report::{CaseOutcome, JsonReport, Report, ReportCase};
pub use test_result::{AssertionResult, PerfStats, SnapshotSummary, TestFileResult};
