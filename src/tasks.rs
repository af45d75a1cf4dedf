//! Background task channel
//!
//! Discovery and archive work are blocking, multi-second operations.
//! They run on the blocking pool and hand their result back through a
//! join handle, so a foreground loop (CLI today, anything tomorrow)
//! never blocks on them and never shares mutable state with them.

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

/// Handle to a submitted background task.
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Await the task's result. A panic in the task surfaces as an
    /// error here instead of poisoning the caller.
    pub async fn join(self) -> Result<T> {
        self.inner.await.context("Background task panicked")
    }
}

/// Submit a blocking closure to the background pool.
pub fn submit<T, F>(work: F) -> TaskHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    TaskHandle {
        inner: tokio::task::spawn_blocking(work),
    }
}
