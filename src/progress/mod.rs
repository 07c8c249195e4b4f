//! Progress reporting module
//!
//! Live byte and block progress for a running copy.

mod reporter;

pub use reporter::*;
