//! Test execution engine
//!
//! Concurrency gate, cancellation, per-file subprocess execution and the run
//! orchestrator tying them together.

mod cancel;
mod gate;
mod process;
mod runner;

pub use cancel::{Admission, CancelSignal};
pub use gate::{ConcurrencyGate, Slot};
pub use process::{parse_report, PytestExecutor, ReportChannel, TestExecutor};
pub use runner::{Outcome, RunConfig, RunObserver, RunSummary, TestRunner};
