//! Cooperative cancellation
//!
//! The signal is only consulted when a test is about to be admitted; running
//! test processes are never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of the admission check for one test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Cancelled,
}

/// Shared interruption flag
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    interrupted: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every test not yet admitted.
    ///
    /// Returns `false` when cancellation had already been requested.
    pub fn cancel(&self) -> bool {
        !self.interrupted.swap(true, Ordering::SeqCst)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn admission(&self) -> Admission {
        if self.is_interrupted() {
            Admission::Cancelled
        } else {
            Admission::Admitted
        }
    }
}
