//! Hash computation and integrity verification module
//!
//! Used after a copy to confirm the destination matches the source.

mod integrity;

pub use integrity::*;
