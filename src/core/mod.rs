//! Core copy engine module
//!
//! Block planning, the per-block copy task and the orchestration that runs
//! them on a [`WorkerPool`](crate::pool::WorkerPool).

mod copier;
mod plan;
mod task;

pub use copier::*;
pub use plan::*;
pub use task::*;
