//! Test run orchestration
//!
//! Drives every test file through the concurrency gate and the executor and
//! reports each outcome to a [`RunObserver`] as soon as it is known.

use anyhow::{anyhow, Result};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::cancel::{Admission, CancelSignal};
use super::gate::ConcurrencyGate;
use super::process::TestExecutor;
use crate::error::{ExecutionError, TestFailure};
use crate::models::{TestDescriptor, TestFileResult};

/// Callbacks invoked around each test.
///
/// `on_start` precedes exactly one of `on_result` / `on_failure` for every
/// admitted test. Tests skipped by cancellation only see `on_failure` with
/// [`TestFailure::Cancelled`].
pub trait RunObserver: Send + Sync {
    fn on_start(&self, _test: &TestDescriptor) -> Result<()> {
        Ok(())
    }

    fn on_result(&self, test: &TestDescriptor, result: TestFileResult) -> Result<()>;

    fn on_failure(&self, test: &TestDescriptor, failure: TestFailure) -> Result<()>;
}

/// Terminal state of one test
#[derive(Debug)]
pub enum Outcome {
    Completed(TestFileResult),
    Failed(ExecutionError),
    Cancelled,
}

/// Settings for one run
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub max_workers: usize,
    pub cancel: CancelSignal,
}

impl RunConfig {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            cancel: CancelSignal::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Totals for a finished run; every test is counted exactly once
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    /// Files whose cases all passed
    pub passed_files: usize,
    /// Files with at least one failing case
    pub failed_files: usize,
    /// Files that produced no result
    pub errored: usize,
    pub cancelled: usize,
    pub num_passing_tests: u64,
    pub num_failing_tests: u64,
    pub duration_ms: u64,
}

impl RunSummary {
    fn record(&mut self, tally: Tally) {
        self.total += 1;
        match tally {
            Tally::Completed { passing, failing } => {
                if failing == 0 {
                    self.passed_files += 1;
                } else {
                    self.failed_files += 1;
                }
                self.num_passing_tests += u64::from(passing);
                self.num_failing_tests += u64::from(failing);
            }
            Tally::Errored => self.errored += 1,
            Tally::Cancelled => self.cancelled += 1,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed_files as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed_files == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Files: {} | Pass: {} | Fail: {} | Error: {} | Cancelled: {} | Tests: {} passed, {} failed | {}ms",
            self.total,
            self.passed_files,
            self.failed_files,
            self.errored,
            self.cancelled,
            self.num_passing_tests,
            self.num_failing_tests,
            self.duration_ms
        )
    }
}

#[derive(Clone, Copy, Debug)]
enum Tally {
    Completed { passing: u32, failing: u32 },
    Errored,
    Cancelled,
}

impl Tally {
    fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed(result) => Tally::Completed {
                passing: result.num_passing_tests,
                failing: result.num_failing_tests,
            },
            Outcome::Failed(_) => Tally::Errored,
            Outcome::Cancelled => Tally::Cancelled,
        }
    }
}

/// Runs a batch of test files with bounded concurrency
pub struct TestRunner {
    config: RunConfig,
    gate: ConcurrencyGate,
    executor: Arc<dyn TestExecutor>,
}

impl TestRunner {
    pub fn new(config: RunConfig, executor: Arc<dyn TestExecutor>) -> Self {
        let gate = ConcurrencyGate::new(config.max_workers);
        Self {
            config,
            gate,
            executor,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Run every test and return once each one reached a terminal state.
    ///
    /// Tests are admitted in the given order. A test's failure never stops
    /// its siblings; the returned error only reflects observer errors or a
    /// panicked task, reported after all tests settled.
    pub async fn run_tests(
        &self,
        tests: &[TestDescriptor],
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunSummary> {
        info!(
            "Running {} test files (max {} concurrent)",
            tests.len(),
            self.gate.limit()
        );

        let start = Instant::now();
        let mut handles = Vec::with_capacity(tests.len());

        for test in tests {
            let slot = self.gate.acquire().await?;
            let admission = self.config.cancel.admission();
            if admission == Admission::Cancelled {
                debug!("Run interrupted, skipping {}", test);
            }

            let test = test.clone();
            let executor = Arc::clone(&self.executor);
            let observer = Arc::clone(&observer);

            handles.push(tokio::spawn(async move {
                let _slot = slot;
                settle(admission, executor.as_ref(), &test, observer.as_ref()).await
            }));
        }

        let mut summary = RunSummary::default();
        let mut first_error = None;

        for joined in join_all(handles).await {
            match joined {
                Ok(Ok(tally)) => summary.record(tally),
                Ok(Err(e)) => {
                    error!("Observer failed: {:#}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!("Test task panicked: {}", e);
                    first_error.get_or_insert(anyhow!("Test task panicked: {e}"));
                }
            }
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%), {} errored, {} cancelled",
            summary.duration_ms,
            summary.passed_files,
            summary.total,
            summary.pass_rate(),
            summary.errored,
            summary.cancelled
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

/// Drive one admitted (or cancelled) test to its terminal state
async fn settle(
    admission: Admission,
    executor: &dyn TestExecutor,
    test: &TestDescriptor,
    observer: &dyn RunObserver,
) -> Result<Tally> {
    let outcome = match admission {
        Admission::Cancelled => Outcome::Cancelled,
        Admission::Admitted => {
            observer.on_start(test)?;
            match executor.execute(test).await {
                Ok(result) => Outcome::Completed(result),
                Err(e) => Outcome::Failed(e),
            }
        }
    };

    let tally = Tally::of(&outcome);
    match outcome {
        Outcome::Completed(result) => {
            debug!("{}", result);
            observer.on_result(test, result)?;
        }
        Outcome::Failed(e) => {
            warn!("{} failed to run: {}", test, e);
            observer.on_failure(test, TestFailure::Execution(e))?;
        }
        Outcome::Cancelled => observer.on_failure(test, TestFailure::Cancelled)?,
    }
    Ok(tally)
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::executor::process::parse_report;
    use crate::models::TestContext;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const PASSING: &str = r#"{"report": {"summary": {"passed": 2, "duration": 0.01}, "tests": [
        {"name": "a", "outcome": "passed", "call": {"outcome": "passed"}},
        {"name": "b", "outcome": "passed", "call": {"outcome": "passed"}}]}}"#;

    const FAILING: &str = r#"{"report": {"summary": {"passed": 1, "failed": 1, "duration": 0.01}, "tests": [
        {"name": "a", "outcome": "passed", "call": {"outcome": "passed"}},
        {"name": "b", "outcome": "failed", "call": {"outcome": "failed", "longrepr": "assert 0"}}]}}"#;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Start(String),
        Result(String),
        Failure(String, &'static str),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl RunObserver for Recorder {
        fn on_start(&self, test: &TestDescriptor) -> Result<()> {
            self.push(Event::Start(test.to_string()));
            Ok(())
        }

        fn on_result(&self, test: &TestDescriptor, _result: TestFileResult) -> Result<()> {
            self.push(Event::Result(test.to_string()));
            Ok(())
        }

        fn on_failure(&self, test: &TestDescriptor, failure: TestFailure) -> Result<()> {
            self.push(Event::Failure(test.to_string(), failure.kind()));
            Ok(())
        }
    }

    /// Serves canned report text per path and tracks concurrency
    #[derive(Default)]
    struct FakeExecutor {
        reports: HashMap<String, &'static str>,
        delay: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        cancel_after: Option<(usize, CancelSignal)>,
    }

    impl FakeExecutor {
        fn new(reports: &[(&str, &'static str)]) -> Self {
            Self {
                reports: reports
                    .iter()
                    .map(|(path, text)| (path.to_string(), *text))
                    .collect(),
                ..Default::default()
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn cancel_after(mut self, calls: usize, signal: CancelSignal) -> Self {
            self.cancel_after = Some((calls, signal));
            self
        }
    }

    impl TestExecutor for FakeExecutor {
        fn execute<'a>(
            &'a self,
            test: &'a TestDescriptor,
        ) -> BoxFuture<'a, Result<TestFileResult, ExecutionError>> {
            Box::pin(async move {
                let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some((after, signal)) = &self.cancel_after {
                    if calls >= *after {
                        signal.cancel();
                    }
                }

                let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(running, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.running.fetch_sub(1, Ordering::SeqCst);

                let text = self
                    .reports
                    .get(&test.to_string())
                    .copied()
                    .unwrap_or(PASSING);
                parse_report(test.path(), text, 1_000, false)
            })
        }
    }

    fn descriptors(n: usize) -> Vec<TestDescriptor> {
        let context = Arc::new(TestContext::default());
        TestDescriptor::from_paths((0..n).map(|i| format!("test_{i}.py")), context)
    }

    fn terminal_count(events: &[Event], path: &str) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::Result(p) | Event::Failure(p, _) if p == path))
            .count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_never_exceeds_max_workers() {
        let executor = Arc::new(FakeExecutor::default().with_delay(Duration::from_millis(20)));
        let runner = TestRunner::new(RunConfig::new(3), executor.clone());
        let recorder = Arc::new(Recorder::default());

        let summary = runner.run_tests(&descriptors(12), recorder).await.unwrap();

        assert_eq!(summary.total, 12);
        assert_eq!(summary.passed_files, 12);
        assert!(executor.peak.load(Ordering::SeqCst) <= 3);
        assert!(executor.peak.load(Ordering::SeqCst) >= 2);
        assert_eq!(runner.gate().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_every_test_reaches_one_terminal_state() {
        let executor = Arc::new(FakeExecutor::new(&[
            ("test_1.py", FAILING),
            ("test_3.py", "not json at all"),
        ]));
        let runner = TestRunner::new(RunConfig::new(2), executor);
        let recorder = Arc::new(Recorder::default());
        let tests = descriptors(5);

        let summary = runner.run_tests(&tests, recorder.clone()).await.unwrap();
        let events = recorder.events();

        for test in &tests {
            let path = test.to_string();
            assert_eq!(terminal_count(&events, &path), 1, "{path}");
            let started = events.iter().position(|e| *e == Event::Start(path.clone()));
            let finished = events
                .iter()
                .position(|e| matches!(e, Event::Result(p) | Event::Failure(p, _) if *p == path));
            assert!(started.unwrap() < finished.unwrap());
        }

        assert!(events.contains(&Event::Failure("test_3.py".to_string(), "parse")));
        assert_eq!(summary.passed_files, 3);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.num_passing_tests, 7);
        assert_eq!(summary.num_failing_tests, 1);
    }

    #[tokio::test]
    async fn test_admission_is_fifo() {
        let executor = Arc::new(FakeExecutor::default().with_delay(Duration::from_millis(2)));
        let runner = TestRunner::new(RunConfig::new(1), executor);
        let recorder = Arc::new(Recorder::default());
        let tests = descriptors(6);

        runner.run_tests(&tests, recorder.clone()).await.unwrap();

        let starts: Vec<String> = recorder
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Start(p) => Some(p),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = tests.iter().map(|t| t.to_string()).collect();
        assert_eq!(starts, expected);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let executor = Arc::new(FakeExecutor::default());
        let cancel = CancelSignal::new();
        cancel.cancel();
        let runner = TestRunner::new(RunConfig::new(2).with_cancel(cancel), executor.clone());
        let recorder = Arc::new(Recorder::default());

        let summary = runner.run_tests(&descriptors(4), recorder.clone()).await.unwrap();

        assert_eq!(summary.cancelled, 4);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
        assert!(recorder
            .events()
            .iter()
            .all(|e| matches!(e, Event::Failure(_, "cancelled"))));
    }

    #[tokio::test]
    async fn test_cancel_mid_run_skips_queued_tests() {
        let cancel = CancelSignal::new();
        let executor = Arc::new(FakeExecutor::default().cancel_after(1, cancel.clone()));
        let runner = TestRunner::new(RunConfig::new(1).with_cancel(cancel), executor);
        let recorder = Arc::new(Recorder::default());

        let summary = runner.run_tests(&descriptors(3), recorder.clone()).await.unwrap();

        assert_eq!(summary.passed_files, 1);
        assert_eq!(summary.cancelled, 2);
        let events = recorder.events();
        assert!(events.contains(&Event::Result("test_0.py".to_string())));
        assert!(events.contains(&Event::Failure("test_2.py".to_string(), "cancelled")));
        assert!(!events.contains(&Event::Start("test_1.py".to_string())));
    }

    #[tokio::test]
    async fn test_cancel_after_admission_has_no_effect() {
        let cancel = CancelSignal::new();
        let executor = Arc::new(
            FakeExecutor::default()
                .with_delay(Duration::from_millis(5))
                .cancel_after(3, cancel.clone()),
        );
        let runner = TestRunner::new(RunConfig::new(3).with_cancel(cancel.clone()), executor);
        let recorder = Arc::new(Recorder::default());

        let summary = runner.run_tests(&descriptors(3), recorder).await.unwrap();

        assert!(cancel.is_interrupted());
        assert_eq!(summary.passed_files, 3);
        assert_eq!(summary.cancelled, 0);
    }

    #[tokio::test]
    async fn test_observer_error_surfaces_after_all_tests() {
        struct Failing(AtomicUsize);

        impl RunObserver for Failing {
            fn on_result(&self, test: &TestDescriptor, _result: TestFileResult) -> Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                if test.path() == Path::new("test_0.py") {
                    anyhow::bail!("reporter broke");
                }
                Ok(())
            }

            fn on_failure(&self, _test: &TestDescriptor, _failure: TestFailure) -> Result<()> {
                Ok(())
            }
        }

        let runner = TestRunner::new(RunConfig::new(2), Arc::new(FakeExecutor::default()));
        let observer = Arc::new(Failing(AtomicUsize::new(0)));

        let err = runner
            .run_tests(&descriptors(4), observer.clone())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("reporter broke"));
        assert_eq!(observer.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::default();
        summary.record(Tally::Completed { passing: 2, failing: 0 });
        summary.record(Tally::Cancelled);

        assert_eq!(summary.pass_rate(), 50.0);
        assert!(!summary.is_all_passed());
        assert!(summary.to_string().contains("Cancelled: 1"));
    }
}
