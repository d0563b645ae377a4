//! Error types for test execution
//!
//! Every variant is contained to the test that produced it.

use std::io;
use std::string::FromUtf8Error;
use std::time::Duration;
use thiserror::Error;

/// Why a single test file could not produce a result
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Report stream failed: {0}")]
    Stream(#[source] io::Error),

    #[error("Report output is not valid UTF-8: {0}")]
    Decode(#[source] FromUtf8Error),

    #[error("Failed to parse test report: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        /// Captured report text, kept for diagnosis
        raw: String,
    },

    #[error("Test process timed out after {0:?}")]
    Timeout(Duration),
}

impl ExecutionError {
    /// Short machine friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Spawn { .. } => "spawn",
            ExecutionError::Stream(_) => "stream",
            ExecutionError::Decode(_) => "decode",
            ExecutionError::Parse { .. } => "parse",
            ExecutionError::Timeout(_) => "timeout",
        }
    }

    /// Raw captured output, when the failure happened while parsing it
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExecutionError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Gate bookkeeping failure; only possible if the gate is torn down mid-run
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("Concurrency gate closed")]
    Closed,
}

/// Failure delivered to the run observer
#[derive(Error, Debug)]
pub enum TestFailure {
    #[error("Test run was cancelled before this test started")]
    Cancelled,

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl TestFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TestFailure::Cancelled)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TestFailure::Cancelled => "cancelled",
            TestFailure::Execution(e) => e.kind(),
        }
    }
}
