//! Concurrency gate
//!
//! Bounds how many test files run at once. Waiters are admitted in the order
//! they asked for a slot.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use crate::error::GateError;

/// Admission control for at most `limit` concurrent tasks
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

/// A held slot; dropping it frees the slot for the next waiter
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate. A limit of zero is raised to one.
    pub fn new(max_workers: usize) -> Self {
        let limit = max_workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of slots currently held
    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<Slot, GateError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed)?;
        trace!("Slot acquired ({}/{} in flight)", self.in_flight(), self.limit);
        Ok(Slot { _permit: permit })
    }

    /// Run `task` once a slot is free, releasing the slot when it finishes.
    ///
    /// The task's output is returned untouched, errors included.
    pub async fn admit<F, Fut, T>(&self, task: F) -> Result<T, GateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _slot = self.acquire().await?;
        Ok(task().await)
    }
}
