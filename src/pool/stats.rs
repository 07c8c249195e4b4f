//! Per-worker completion counts

use serde::Serialize;

/// Snapshot of how many tasks each worker finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    completed: Vec<u64>,
}

impl WorkerStats {
    pub(crate) fn new(completed: Vec<u64>) -> Self {
        Self { completed }
    }

    /// Completed task count indexed by worker
    pub fn counts(&self) -> &[u64] {
        &self.completed
    }

    /// Number of workers covered
    pub fn workers(&self) -> usize {
        self.completed.len()
    }

    /// Sum over all workers
    pub fn total(&self) -> u64 {
        self.completed.iter().sum()
    }

    /// Render the `Threads | tasks` table
    pub fn table(&self) -> String {
        let mut out = String::from("Threads | tasks\n");
        out.push_str("--------+------\n");
        for (index, count) in self.completed.iter().enumerate() {
            out.push_str(&format!("{:>7} | {}\n", index, count));
        }
        out
    }

    /// Print the table to stdout
    pub fn print_table(&self) {
        print!("{}", self.table());
    }
}
