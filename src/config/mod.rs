//! Configuration module for pcp
//!
//! Provides the command-line surface and the runtime settings
//! consumed by the copy engine.

mod settings;

pub use settings::*;
