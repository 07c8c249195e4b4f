//! Worker threads
//!
//! A worker owns one OS thread running a pull/execute/report loop against
//! the shared [`TaskQueue`]. It never owns the queue; the pool does.

use super::queue::TaskQueue;
use crate::error::{PcpError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Reports completion when dropped, so a panicking task still decrements
/// the running counter.
struct FinalizeGuard<'a> {
    queue: &'a TaskQueue,
    worker: usize,
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        self.queue.finalize_task(self.worker);
    }
}

/// One pool thread
pub(crate) struct Worker {
    index: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker thread; it immediately blocks on the queue.
    pub(crate) fn spawn(index: usize, queue: Arc<TaskQueue>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("pcp-worker-{}", index))
            .spawn(move || run(index, &queue))
            .map_err(|source| PcpError::ThreadSpawn { index, source })?;

        Ok(Self {
            index,
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit. The pool must have stopped the queue.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Worker {} terminated abnormally", self.index);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join();
    }
}

fn run(index: usize, queue: &TaskQueue) {
    tracing::debug!("Worker {} started", index);

    while let Some(task) = queue.get_task() {
        let _guard = FinalizeGuard {
            queue,
            worker: index,
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!("Task on worker {} panicked: {}", index, reason);
        }
    }

    tracing::debug!("Worker {} shutting down", index);
}
