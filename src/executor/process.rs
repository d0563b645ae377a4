//! Subprocess test execution
//!
//! Runs one test file through `py.test --json=<channel>`, captures the report
//! channel and maps the report onto a [`TestFileResult`].

use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::ExecutionError;
use crate::models::{JsonReport, TestDescriptor, TestFileResult};

/// Runs a single test file to completion
pub trait TestExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        test: &'a TestDescriptor,
    ) -> BoxFuture<'a, Result<TestFileResult, ExecutionError>>;
}

/// Stream the child writes its JSON report to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportChannel {
    #[default]
    Stderr,
    Stdout,
}

impl ReportChannel {
    /// Path handed to `--json=`
    pub fn device(&self) -> &'static str {
        match self {
            ReportChannel::Stderr => "/dev/stderr",
            ReportChannel::Stdout => "/dev/stdout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stderr" | "/dev/stderr" => Some(ReportChannel::Stderr),
            "stdout" | "/dev/stdout" => Some(ReportChannel::Stdout),
            _ => None,
        }
    }
}

/// Executor spawning one pytest process per test file
#[derive(Clone, Debug)]
pub struct PytestExecutor {
    program: String,
    extra_args: Vec<String>,
    channel: ReportChannel,
    timeout: Option<Duration>,
    colorize: bool,
}

impl Default for PytestExecutor {
    fn default() -> Self {
        Self::new("py.test")
    }
}

impl PytestExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            channel: ReportChannel::Stderr,
            timeout: None,
            colorize: true,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            program: config.command.clone(),
            extra_args: config.extra_args.clone(),
            channel: config.report_channel,
            timeout: config.timeout_secs.map(Duration::from_secs),
            colorize: config.colorize,
        }
    }

    /// Arguments placed before the report flag
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_channel(mut self, channel: ReportChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Kill the process and fail the test if the report is not complete in time
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one test file
    pub fn build_args(&self, test_path: &Path) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push(format!("--json={}", self.channel.device()));
        args.push(test_path.to_string_lossy().to_string());
        args
    }

    fn build_command(&self, test: &TestDescriptor) -> Command {
        let (stdout, stderr) = match self.channel {
            ReportChannel::Stderr => (Stdio::null(), Stdio::piped()),
            ReportChannel::Stdout => (Stdio::piped(), Stdio::null()),
        };

        let mut command = Command::new(&self.program);
        command
            .args(self.build_args(test.path()))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        if let Some(dir) = &test.context.config.root_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Spawn the test process and turn its report into a result
    pub async fn run_file(&self, test: &TestDescriptor) -> Result<TestFileResult, ExecutionError> {
        debug!("Spawning {} for {}", self.program, test);

        let mut child = self
            .build_command(test)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let captured = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.capture(&mut child))
                .await
                .ok(),
            None => Some(self.capture(&mut child).await),
        };

        let Some(captured) = captured else {
            let limit = self.timeout.unwrap_or_default();
            warn!("{} did not finish within {:?}, killing it", test, limit);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill test process for {}: {}", test, e);
            }
            return Err(ExecutionError::Timeout(limit));
        };

        let end = Utc::now().timestamp_millis();
        let text = String::from_utf8(captured?).map_err(ExecutionError::Decode)?;
        parse_report(test.path(), &text, end, self.colorize)
    }

    /// Read the report channel to EOF, then reap the child
    async fn capture(&self, child: &mut Child) -> Result<Vec<u8>, ExecutionError> {
        let mut buf = Vec::new();
        let read = match self.channel {
            ReportChannel::Stderr => match child.stderr.take() {
                Some(mut stream) => stream.read_to_end(&mut buf).await,
                None => Ok(0),
            },
            ReportChannel::Stdout => match child.stdout.take() {
                Some(mut stream) => stream.read_to_end(&mut buf).await,
                None => Ok(0),
            },
        };
        read.map_err(ExecutionError::Stream)?;

        let status = child.wait().await.map_err(ExecutionError::Stream)?;
        debug!("Test process exited with {} ({} bytes of report)", status, buf.len());
        Ok(buf)
    }
}

impl TestExecutor for PytestExecutor {
    fn execute<'a>(
        &'a self,
        test: &'a TestDescriptor,
    ) -> BoxFuture<'a, Result<TestFileResult, ExecutionError>> {
        Box::pin(self.run_file(test))
    }
}

/// Parse captured report text into a file result.
///
/// `end` is the completion time in epoch milliseconds.
pub fn parse_report(
    path: &Path,
    text: &str,
    end: i64,
    colorize: bool,
) -> Result<TestFileResult, ExecutionError> {
    let parsed = JsonReport::parse(text).map_err(|source| {
        warn!("Unparseable report for {}: {}", path.display(), source);
        ExecutionError::Parse {
            source,
            raw: text.to_string(),
        }
    })?;

    Ok(TestFileResult::from_report(path, &parsed.report, end, colorize))
}
