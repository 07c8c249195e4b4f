//! Progress reporter implementation
//!
//! Uses indicatif for a byte progress bar plus a block counter, shared by
//! every copy task through an `Arc`.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;

const BYTES_TEMPLATE: &str =
    "{prefix:.bold.dim} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})";

/// Progress reporter for a block copy
pub struct ProgressReporter {
    /// Multi-progress container
    multi: MultiProgress,
    /// Byte transfer bar
    bytes_bar: ProgressBar,
    /// Finished block counter
    blocks_bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter drawing to stderr
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let blocks_bar = multi.add(ProgressBar::new(0));
        blocks_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        blocks_bar.set_prefix("Blocks");

        let bytes_bar = multi.add(ProgressBar::new(0));
        bytes_bar.set_style(
            ProgressStyle::default_bar()
                .template(BYTES_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bytes_bar.set_prefix("Data  ");

        Self {
            multi,
            bytes_bar,
            blocks_bar,
        }
    }

    /// Create a reporter that tracks positions but draws nothing
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Set total bytes and blocks
    pub fn set_totals(&self, bytes: u64, blocks: u64) {
        self.bytes_bar.set_length(bytes);
        self.blocks_bar.set_length(blocks);
    }

    /// Increment bytes copied
    pub fn increment_bytes(&self, bytes: u64) {
        self.bytes_bar.inc(bytes);
    }

    /// Mark one block as finished, successful or not
    pub fn block_done(&self) {
        self.blocks_bar.inc(1);
    }

    /// Finish progress bars
    pub fn finish(&self) {
        self.blocks_bar.finish();
        self.bytes_bar.finish();
    }

    /// Leave the bars where they stopped
    pub fn abandon(&self) {
        self.blocks_bar.abandon();
        self.bytes_bar.abandon();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("bytes", &self.bytes_bar.position())
            .field("blocks", &self.blocks_bar.position())
            .finish_non_exhaustive()
    }
}
