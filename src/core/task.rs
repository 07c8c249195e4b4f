//! Per-block copy task
//!
//! Each task opens its own read handle on the source and its own write
//! handle on the destination, so no file position is ever shared between
//! threads. Ranges handed out by [`BlockPlan`](super::BlockPlan) never
//! overlap, which is what makes the unlocked concurrent writes safe.

use super::plan::Block;
use crate::error::{IoResultExt, PcpError, Result};
use crate::progress::ProgressReporter;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a single block copy needs, captured by value
#[derive(Debug, Clone)]
pub struct BlockCopy {
    /// Source file
    pub source: PathBuf,
    /// Destination file, already sized to the source length
    pub destination: PathBuf,
    /// Range to copy
    pub block: Block,
    /// Bytes per read/write round
    pub buffer_size: usize,
    /// Shared progress bar
    pub progress: Option<Arc<ProgressReporter>>,
}

impl BlockCopy {
    /// Copy the range, returning the bytes written.
    pub fn run(&self) -> Result<u64> {
        copy_block(
            &self.source,
            &self.destination,
            self.block,
            self.buffer_size,
            self.progress.as_deref(),
        )
    }
}

/// Copy `[block.offset, block.end())` from `source` to the same offsets in
/// `destination`.
///
/// The source must hold at least `block.end()` bytes; hitting end of file
/// early is a [`PcpError::ShortRead`].
pub fn copy_block(
    source: &Path,
    destination: &Path,
    block: Block,
    buffer_size: usize,
    progress: Option<&ProgressReporter>,
) -> Result<u64> {
    if block.length == 0 {
        return Ok(0);
    }

    let mut src = File::open(source).with_path(source)?;
    let mut dst = OpenOptions::new()
        .write(true)
        .open(destination)
        .with_path(destination)?;

    src.seek(SeekFrom::Start(block.offset)).with_path(source)?;
    dst.seek(SeekFrom::Start(block.offset))
        .with_path(destination)?;

    let capacity = usize::try_from(block.length)
        .map_or(buffer_size, |len| len.min(buffer_size))
        .max(1);
    let mut buffer = vec![0u8; capacity];
    let mut remaining = block.length;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(capacity, |r| r.min(capacity));
        let got = read_full(&mut src, &mut buffer[..want]).with_path(source)?;

        if got < want {
            return Err(PcpError::ShortRead {
                offset: block.offset,
                expected: block.length,
                actual: block.length - remaining + got as u64,
            });
        }

        dst.write_all(&buffer[..got]).with_path(destination)?;
        remaining -= got as u64;

        if let Some(progress) = progress {
            progress.increment_bytes(got as u64);
        }
    }

    Ok(block.length)
}

/// Read until `buf` is full or the reader is exhausted; returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
