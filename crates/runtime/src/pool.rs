// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded pool for offloading blocking work from module iterations.
//!
//! Wraps `spawn_blocking` behind a semaphore sized from the pipeline's
//! `execution.max_threads`, so CPU-bound module work cannot swamp the
//! blocking-thread pool. `close` waits for outstanding tasks to drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,

    #[error("blocking task panicked")]
    TaskPanicked,
}

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    closed: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocking tasks currently in flight.
    pub fn outstanding(&self) -> usize {
        self.capacity - self.semaphore.available_permits().min(self.capacity)
    }

    /// Run a blocking function on the pool, awaiting a slot if all are busy.
    pub async fn run_blocking<F, T>(&self, f: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let handle = tokio::task::spawn_blocking(move || {
            let out = f();
            drop(permit);
            out
        });
        handle.await.map_err(|_| PoolError::TaskPanicked)
    }

    /// Stop accepting work and wait for in-flight tasks to finish.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Draining every permit means every outstanding task has returned.
        if let Ok(permits) = self
            .semaphore
            .acquire_many(self.capacity as u32)
            .await
        {
            drop(permits);
        }
        self.semaphore.close();
        debug!(capacity = self.capacity, "worker pool closed");
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
