//! Shared queue state for the worker pool
//!
//! The pending tasks, the running-task counter, the stop flag and the
//! per-worker completion counts live behind one mutex. Two condition
//! variables hang off it: one wakes workers (task available or stop), the
//! other wakes `wait_all` callers (pool drained).

use super::stats::WorkerStats;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A unit of work: no arguments, no return value, run exactly once
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    pending: VecDeque<Task>,
    running: usize,
    stop: bool,
    completed: Vec<u64>,
}

/// Synchronization core shared by the pool and its workers
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    task_available: Condvar,
    idle: Condvar,
}

impl TaskQueue {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                running: 0,
                stop: false,
                completed: vec![0; workers],
            }),
            task_available: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    // Tasks never run under this lock, so a poisoned guard still holds
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue at the tail and wake one sleeping worker. Never blocks on work.
    pub(crate) fn push(&self, task: Task) {
        self.lock().pending.push_back(task);
        self.task_available.notify_one();
    }

    /// Block until a task is available or stop was requested.
    ///
    /// Returns `None` when the worker should exit. A returned task has
    /// already been counted as running, so `wait_all` cannot observe an idle
    /// pool between the dequeue and the start of execution.
    pub(crate) fn get_task(&self) -> Option<Task> {
        let mut state = self
            .task_available
            .wait_while(self.lock(), |s| !s.stop && s.pending.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if state.stop {
            return None;
        }

        let task = state.pending.pop_front()?;
        state.running += 1;
        Some(task)
    }

    /// Mark one task finished by `worker` and wake `wait_all` if drained.
    pub(crate) fn finalize_task(&self, worker: usize) {
        let mut state = self.lock();
        state.running -= 1;
        if let Some(count) = state.completed.get_mut(worker) {
            *count += 1;
        }
        let drained = state.running == 0 && state.pending.is_empty();
        drop(state);

        if drained {
            self.idle.notify_all();
        }
    }

    /// Block until nothing is pending and nothing is running.
    pub(crate) fn wait_all(&self) {
        let _state = self
            .idle
            .wait_while(self.lock(), |s| s.running != 0 || !s.pending.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Request shutdown and wake every worker. Returns the tasks that will
    /// never run.
    pub(crate) fn stop(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            state.stop = true;
            std::mem::take(&mut state.pending)
        };
        self.task_available.notify_all();
        self.idle.notify_all();
        discarded.len()
    }

    pub(crate) fn stats(&self) -> WorkerStats {
        WorkerStats::new(self.lock().completed.clone())
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> (usize, usize, bool) {
        let state = self.lock();
        (state.pending.len(), state.running, state.stop)
    }
}
