//! Fixed-size worker pool
//!
//! A FIFO task queue served by a fixed set of OS threads. Submission never
//! blocks, [`WorkerPool::wait_all`] blocks until the queue is empty and no
//! task is running, and dropping the pool stops and joins every worker.
//!
//! ```
//! use pcp::pool::WorkerPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(4).unwrap();
//! let hits = Arc::new(AtomicUsize::new(0));
//! for _ in 0..16 {
//!     let hits = Arc::clone(&hits);
//!     pool.add_task(move || {
//!         hits.fetch_add(1, Ordering::SeqCst);
//!     });
//! }
//! pool.wait_all();
//! assert_eq!(hits.load(Ordering::SeqCst), 16);
//! ```

mod queue;
mod stats;
mod worker;

pub use stats::WorkerStats;

use crate::error::Result;
use queue::TaskQueue;
use std::sync::Arc;
use worker::Worker;

/// Owner of the task queue and its worker threads
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Start `threads` workers; 0 means one per hardware thread.
    ///
    /// If a thread cannot be spawned the workers already running are
    /// stopped and joined before the error is returned.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        let queue = Arc::new(TaskQueue::new(threads));

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(threads),
        };

        for index in 0..threads {
            let worker = Worker::spawn(index, Arc::clone(&pool.queue))?;
            pool.workers.push(worker);
        }

        tracing::debug!("Worker pool started with {} threads", threads);
        Ok(pool)
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task at the tail and wake a worker
    pub fn add_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(task));
    }

    /// Block until every submitted task has finished.
    ///
    /// Returns only once the queue is empty *and* no task is running.
    /// Submitting concurrently with this call is allowed but the caller
    /// then gets no guarantee about the racing tasks.
    pub fn wait_all(&self) {
        self.queue.wait_all();
    }

    /// Completed task counts per worker
    pub fn stats(&self) -> WorkerStats {
        self.queue.stats()
    }

    /// Stop and join all workers. Equivalent to dropping the pool.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let discarded = self.queue.stop();
        if discarded > 0 {
            tracing::debug!("Discarding {} pending tasks on shutdown", discarded);
        }

        for worker in &mut self.workers {
            worker.join();
        }
        tracing::debug!("Worker pool stopped");
    }
}
