//! Error types for pcp
//!
//! Setup errors abort a copy before any block is submitted. Block errors are
//! recorded per byte range and surfaced once the pool is idle.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pcp operations
#[derive(Error, Debug)]
pub enum PcpError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file does not exist
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Source is a directory, socket or something else we cannot split
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Source and destination resolve to the same file
    #[error("Source and destination are the same: {0}")]
    SameSourceAndDestination(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A worker thread could not be started
    #[error("Failed to spawn worker {index}: {source}")]
    ThreadSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Source ended before a block could be filled
    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    /// Copying one byte range failed
    #[error("Block [{offset}, {end}) failed: {source}", end = .offset + .length)]
    BlockFailed {
        offset: u64,
        length: u64,
        #[source]
        source: Box<PcpError>,
    },

    /// Hash verification failed
    #[error("Integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl PcpError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Wrap an error with the byte range it happened in
    pub fn block(offset: u64, length: u64, source: PcpError) -> Self {
        Self::BlockFailed {
            offset,
            length,
            source: Box::new(source),
        }
    }

    /// Create an integrity mismatch error
    pub fn integrity_mismatch(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::IntegrityMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for pcp operations
pub type Result<T> = std::result::Result<T, PcpError>;

impl From<std::io::Error> for PcpError {
    fn from(err: std::io::Error) -> Self {
        PcpError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| PcpError::io(path, e))
    }
}
