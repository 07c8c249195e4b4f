//! Block splitting
//!
//! Turns a file size into an ordered list of disjoint byte ranges that
//! cover `[0, size)` exactly once. Either one block per worker (the last
//! block absorbs the remainder) or fixed-size blocks (the last block is
//! the remainder, in `(0, block_size]`).

use crate::error::{PcpError, Result};
use serde::Serialize;

/// One contiguous byte range `[offset, offset + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Start of the range
    pub offset: u64,
    /// Number of bytes
    pub length: u64,
}

impl Block {
    /// One past the last byte
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// How the plan was sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// One block per worker thread
    PerThread(usize),
    /// Fixed block size in bytes
    FixedSize(u64),
}

/// Ordered, gap-free, non-overlapping blocks covering a whole file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockPlan {
    file_size: u64,
    mode: SplitMode,
    blocks: Vec<Block>,
}

impl BlockPlan {
    /// Compute the plan for `file_size` bytes.
    ///
    /// With `block_size` set the thread count does not influence the
    /// split. An empty file always yields an empty plan.
    pub fn new(file_size: u64, threads: usize, block_size: Option<u64>) -> Result<Self> {
        match block_size {
            Some(size) => Self::fixed_size(file_size, size),
            None => Self::per_thread(file_size, threads),
        }
    }

    /// `threads` blocks of `file_size / threads` bytes, remainder in the last
    pub fn per_thread(file_size: u64, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(PcpError::config("Thread count must be at least 1"));
        }

        let mode = SplitMode::PerThread(threads);
        if file_size == 0 {
            return Ok(Self::empty(mode));
        }

        let count = threads as u64;
        let base = file_size / count;
        let mut blocks: Vec<Block> = (0..count - 1)
            .map(|i| Block {
                offset: i * base,
                length: base,
            })
            .collect();

        let last_offset = base * (count - 1);
        blocks.push(Block {
            offset: last_offset,
            length: file_size - last_offset,
        });

        Ok(Self {
            file_size,
            mode,
            blocks,
        })
    }

    /// `ceil(file_size / block_size)` blocks of `block_size` bytes, the last
    /// one holding whatever is left
    pub fn fixed_size(file_size: u64, block_size: u64) -> Result<Self> {
        if block_size == 0 {
            return Err(PcpError::config("Block size must be at least 1 byte"));
        }

        let mode = SplitMode::FixedSize(block_size);
        let count = file_size.div_ceil(block_size);
        let blocks = (0..count)
            .map(|i| {
                let offset = i * block_size;
                Block {
                    offset,
                    length: block_size.min(file_size - offset),
                }
            })
            .collect();

        Ok(Self {
            file_size,
            mode,
            blocks,
        })
    }

    fn empty(mode: SplitMode) -> Self {
        Self {
            file_size: 0,
            mode,
            blocks: Vec::new(),
        }
    }

    /// Total bytes covered
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Sizing mode used
    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    /// Blocks in offset order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for an empty file
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl IntoIterator for BlockPlan {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}
