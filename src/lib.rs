//! Concurrent pytest file runner
//!
//! Runs each test file as its own `py.test --json` process, bounded by a
//! concurrency gate, and reports a normalized [`models::TestFileResult`] or a
//! typed failure for every file through a [`executor::RunObserver`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use pytest_runner::executor::{PytestExecutor, RunConfig, TestRunner};
//! use pytest_runner::models::{TestContext, TestDescriptor};
//!
//! # async fn demo(observer: Arc<dyn pytest_runner::executor::RunObserver>) -> anyhow::Result<()> {
//! let context = Arc::new(TestContext::default());
//! let tests = TestDescriptor::from_paths(["tests/test_api.py"], context);
//! let runner = TestRunner::new(RunConfig::new(4), Arc::new(PytestExecutor::default()));
//! let summary = runner.run_tests(&tests, observer).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod utils;

pub use error::{ExecutionError, GateError, TestFailure};
