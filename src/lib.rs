//! # pcp - Parallel single-file copy
//!
//! pcp copies one file by splitting it into disjoint byte ranges and
//! writing each range from a different worker thread straight to its final
//! offset in a pre-sized destination.
//!
//! ## Pieces
//!
//! - [`pool::WorkerPool`]: fixed set of threads over a FIFO task queue, with
//!   a blocking [`wait_all`](pool::WorkerPool::wait_all) and join-on-drop
//! - [`core::BlockPlan`]: exact, gap-free split of `[0, size)`
//! - [`core::CopyEngine`]: sizes the destination, submits one task per
//!   block, collects failures and per-worker stats
//!
//! ## Quick Start
//!
//! ```no_run
//! use pcp::core::parallel_copy;
//! use std::path::Path;
//!
//! let source = Path::new("/data/big.img");
//! let report = parallel_copy(source, Path::new("/backup/big.img"), 8).unwrap();
//! println!("{}", report.took_line());
//! ```
//!
//! ## Fixed block size
//!
//! ```no_run
//! use pcp::config::CopyConfig;
//! use pcp::core::CopyEngine;
//! use std::path::PathBuf;
//!
//! let config = CopyConfig {
//!     source: PathBuf::from("/data/big.img"),
//!     destination: PathBuf::from("/backup/big.img"),
//!     threads: 4,
//!     block_size: Some(64 * 1024 * 1024),
//!     ..Default::default()
//! };
//!
//! let report = CopyEngine::new(config).execute().unwrap();
//! report.print_summary(true);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod hash;
pub mod pool;
pub mod progress;

// Re-export commonly used types
pub use config::{CopyConfig, HashAlgorithm};
pub use core::{BlockPlan, CopyEngine, CopyReport};
pub use error::{PcpError, Result};
pub use pool::WorkerPool;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
