//! Main copy engine
//!
//! Validates the source, plans the blocks, sizes the destination, feeds one
//! task per block to a [`WorkerPool`] and collects the outcome once the
//! pool is idle.

use super::plan::{Block, BlockPlan, SplitMode};
use super::task::BlockCopy;
use crate::config::CopyConfig;
use crate::error::{IoResultExt, PcpError, Result};
use crate::hash::{verify_files_match, VerificationResult};
use crate::pool::{WorkerPool, WorkerStats};
use crate::progress::ProgressReporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A byte range that could not be copied
#[derive(Debug, Clone, Serialize)]
pub struct BlockFailure {
    /// Start of the failed range
    pub offset: u64,
    /// Length of the failed range
    pub length: u64,
    /// What went wrong
    pub error: String,
}

impl std::fmt::Display for BlockFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bytes [{}, {}): {}",
            self.offset,
            self.offset + self.length,
            self.error
        )
    }
}

/// Copy operation result
#[derive(Debug, Serialize)]
pub struct CopyReport {
    /// Source file
    pub source: PathBuf,
    /// Destination file
    pub destination: PathBuf,
    /// Source size in bytes
    pub file_size: u64,
    /// Number of blocks submitted
    pub blocks: usize,
    /// How the file was split
    pub split: SplitMode,
    /// Worker threads used
    pub threads: usize,
    /// Bytes written by successful blocks
    pub bytes_copied: u64,
    /// When the copy started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Average throughput in bytes/second
    pub throughput: f64,
    /// Completed tasks per worker
    pub stats: WorkerStats,
    /// Blocks that failed, in offset order
    pub failures: Vec<BlockFailure>,
    /// Verification outcome (if requested and all blocks succeeded)
    pub verification: Option<VerificationResult>,
}

fn serialize_secs<S>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(d.as_secs_f64())
}

impl CopyReport {
    /// No failed block and no verification mismatch
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.verification.as_ref().map_or(true, |v| v.matches)
    }

    /// `Took ...` line
    pub fn took_line(&self) -> String {
        let micros = Duration::from_micros(self.elapsed.as_micros() as u64);
        format!(
            "Took {} ({} at {}/s)",
            humantime::format_duration(micros),
            humansize::format_size(self.bytes_copied, humansize::BINARY),
            humansize::format_size(self.throughput as u64, humansize::BINARY)
        )
    }

    /// Print the report to stdout, with the worker table if asked
    pub fn print_summary(&self, print_stats: bool) {
        println!("{}", self.took_line());

        if print_stats {
            self.stats.print_table();
        }

        if let Some(verification) = &self.verification {
            println!(
                "Verify ({}): {}",
                verification.source_hash.algorithm.name(),
                if verification.matches { "OK" } else { "MISMATCH" }
            );
        }
    }

    /// Print one diagnostic line per failed range to stderr
    pub fn print_failures(&self) {
        for failure in &self.failures {
            eprintln!("Failed to copy {}", failure);
        }
    }
}

/// What the pool produced for one plan
#[derive(Debug, Default)]
pub(crate) struct BlockOutcome {
    pub bytes_copied: u64,
    pub failures: Vec<BlockFailure>,
}

/// Submit one task per block, wait for the pool to drain, collect results.
///
/// The destination must already be sized to cover every block.
pub(crate) fn copy_blocks(
    pool: &WorkerPool,
    source: &Path,
    destination: &Path,
    plan: BlockPlan,
    buffer_size: usize,
    progress: Option<Arc<ProgressReporter>>,
) -> BlockOutcome {
    let bytes_copied = Arc::new(AtomicU64::new(0));
    let failures = Arc::new(Mutex::new(Vec::new()));

    for block in plan {
        let job = BlockCopy {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            block,
            buffer_size,
            progress: progress.clone(),
        };
        let bytes_copied = Arc::clone(&bytes_copied);
        let failures = Arc::clone(&failures);

        pool.add_task(move || {
            match job.run() {
                Ok(bytes) => {
                    bytes_copied.fetch_add(bytes, Ordering::Relaxed);
                }
                Err(e) => {
                    let Block { offset, length } = job.block;
                    let error = e.to_string();
                    tracing::warn!("{}", PcpError::block(offset, length, e));
                    failures
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(BlockFailure {
                            offset,
                            length,
                            error,
                        });
                }
            }
            if let Some(progress) = &job.progress {
                progress.block_done();
            }
        });
    }

    pool.wait_all();

    let mut failures =
        std::mem::take(&mut *failures.lock().unwrap_or_else(PoisonError::into_inner));
    failures.sort_by_key(|f| f.offset);

    BlockOutcome {
        bytes_copied: bytes_copied.load(Ordering::Relaxed),
        failures,
    }
}

/// Main copy engine
pub struct CopyEngine {
    /// Configuration
    config: CopyConfig,
    /// Progress reporter
    progress: Option<Arc<ProgressReporter>>,
}

impl CopyEngine {
    /// Create a new copy engine
    pub fn new(config: CopyConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Execute the copy operation.
    ///
    /// Setup problems are returned as `Err` before the destination is
    /// touched. Per-block failures do not abort sibling blocks; they end up
    /// in [`CopyReport::failures`].
    pub fn execute(&self) -> Result<CopyReport> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        self.config.validate()?;
        let source = self.config.source.as_path();
        let destination = self.config.destination.as_path();

        let file_size = inspect_source(source)?;
        ensure_distinct(source, destination)?;

        let threads = self.config.effective_threads();
        let plan = BlockPlan::new(file_size, threads, self.config.block_size)?;
        let split = plan.mode();
        let blocks = plan.len();
        tracing::info!(
            "Copying {} bytes in {} blocks with {} threads",
            file_size,
            blocks,
            threads
        );

        // Threads first: a spawn failure must not leave a sized, empty file behind
        let pool = WorkerPool::new(threads)?;
        prepare_destination(destination, file_size)?;

        if let Some(progress) = &self.progress {
            progress.set_totals(file_size, blocks as u64);
        }

        let outcome = copy_blocks(
            &pool,
            source,
            destination,
            plan,
            self.config.buffer_size,
            self.progress.clone(),
        );
        let stats = pool.stats();
        pool.shutdown();

        if let Some(progress) = &self.progress {
            if outcome.failures.is_empty() {
                progress.finish();
            } else {
                progress.abandon();
            }
        }

        let elapsed = start_time.elapsed();

        let mut verification = None;
        if outcome.failures.is_empty() {
            if self.config.preserve {
                preserve_attributes(source, destination)?;
            }
            if let Some(algorithm) = self.config.verify {
                let result = verify_files_match(source, destination, algorithm)?;
                if !result.matches {
                    tracing::warn!(
                        "Verification failed: {} != {}",
                        result.source_hash,
                        result.dest_hash
                    );
                }
                verification = Some(result);
            }
        }

        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            outcome.bytes_copied as f64 / secs
        } else {
            0.0
        };

        Ok(CopyReport {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            file_size,
            blocks,
            split,
            threads,
            bytes_copied: outcome.bytes_copied,
            started_at,
            elapsed,
            throughput,
            stats,
            failures: outcome.failures,
            verification,
        })
    }
}

/// Size of the source, which must be an existing regular file
fn inspect_source(source: &Path) -> Result<u64> {
    let metadata = match std::fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PcpError::NotFound(source.to_path_buf()))
        }
        Err(e) => return Err(PcpError::io(source, e)),
    };

    if !metadata.is_file() {
        return Err(PcpError::NotAFile(source.to_path_buf()));
    }

    Ok(metadata.len())
}

fn ensure_distinct(source: &Path, destination: &Path) -> Result<()> {
    if !destination.exists() {
        return Ok(());
    }

    let src = source.canonicalize().with_path(source)?;
    let dst = destination.canonicalize().with_path(destination)?;
    if src == dst {
        return Err(PcpError::SameSourceAndDestination(src));
    }
    Ok(())
}

/// Create the destination if needed and size it to exactly `size` bytes.
///
/// Must complete before any block task starts writing at its offset.
fn prepare_destination(destination: &Path, size: u64) -> Result<()> {
    let existed = destination.exists();
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(destination)
        .with_path(destination)?;

    if let Err(e) = file.set_len(size) {
        drop(file);
        if !existed {
            let _ = std::fs::remove_file(destination);
        }
        return Err(PcpError::io(destination, e));
    }

    tracing::debug!("Destination {:?} sized to {} bytes", destination, size);
    Ok(())
}

/// Copy permissions, modification and access time
fn preserve_attributes(source: &Path, destination: &Path) -> Result<()> {
    let metadata = std::fs::metadata(source).with_path(source)?;
    std::fs::set_permissions(destination, metadata.permissions()).with_path(destination)?;

    if let Ok(mtime) = metadata.modified() {
        let _ = filetime::set_file_mtime(destination, filetime::FileTime::from_system_time(mtime));
    }
    if let Ok(atime) = metadata.accessed() {
        let _ = filetime::set_file_atime(destination, filetime::FileTime::from_system_time(atime));
    }

    Ok(())
}

/// Copy `source` to `destination` with `threads` workers and default settings
pub fn parallel_copy(source: &Path, destination: &Path, threads: usize) -> Result<CopyReport> {
    let config = CopyConfig {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        threads,
        ..Default::default()
    };

    CopyEngine::new(config).execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashAlgorithm;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        let content: Vec<u8> = (0..size).map(|i| (i * 31 % 253) as u8).collect();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run(
        source: &Path,
        destination: &Path,
        threads: usize,
        block_size: Option<u64>,
    ) -> CopyReport {
        let config = CopyConfig {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            threads,
            block_size,
            buffer_size: 4096,
            ..Default::default()
        };
        CopyEngine::new(config).execute().unwrap()
    }

    #[test]
    fn test_million_bytes_four_threads() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 1_000_000);
        let dst = dir.path().join("dst.bin");

        let report = run(&src, &dst, 4, None);

        assert!(report.is_success());
        assert_eq!(report.blocks, 4);
        assert_eq!(report.split, SplitMode::PerThread(4));
        assert_eq!(report.bytes_copied, 1_000_000);
        assert_eq!(report.stats.total(), 4);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[test]
    fn test_million_bytes_fixed_blocks() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 1_000_000);
        let dst = dir.path().join("dst.bin");

        let report = run(&src, &dst, 3, Some(300_000));

        assert!(report.is_success());
        assert_eq!(report.blocks, 4);
        assert_eq!(report.stats.total(), 4);
        assert_eq!(report.stats.workers(), 3);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[test]
    fn test_empty_source() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "empty.bin", 0);
        let dst = dir.path().join("dst.bin");

        let report = run(&src, &dst, 4, None);

        assert!(report.is_success());
        assert_eq!(report.blocks, 0);
        assert_eq!(report.stats.total(), 0);
        assert_eq!(std::fs::metadata(&dst).unwrap().len(), 0);
    }

    #[test]
    fn test_byte_identical_for_assorted_shapes() {
        let dir = TempDir::new().unwrap();
        let cases: &[(usize, usize, Option<u64>)] = &[
            (1, 1, None),
            (7, 16, None),
            (4097, 3, None),
            (65_537, 5, Some(1000)),
            (100_000, 2, Some(100_000)),
            (100_001, 8, Some(7)),
        ];

        for (i, &(size, threads, block)) in cases.iter().enumerate() {
            let src = create_test_file(dir.path(), &format!("src{}.bin", i), size);
            let dst = dir.path().join(format!("dst{}.bin", i));

            let report = run(&src, &dst, threads, block);
            assert!(report.is_success(), "case {}", i);
            assert_eq!(
                std::fs::read(&src).unwrap(),
                std::fs::read(&dst).unwrap(),
                "case {}",
                i
            );
        }
    }

    #[test]
    fn test_existing_larger_destination_is_truncated() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 1000);
        let dst = dir.path().join("dst.bin");
        std::fs::write(&dst, vec![0xFFu8; 5000]).unwrap();

        run(&src, &dst, 2, None);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[test]
    fn test_missing_source_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("dst.bin");
        let config = CopyConfig {
            source: dir.path().join("missing.bin"),
            destination: dst.clone(),
            threads: 2,
            ..Default::default()
        };

        let err = CopyEngine::new(config).execute().unwrap_err();
        assert!(matches!(err, PcpError::NotFound(_)));
        assert!(!dst.exists());
    }

    #[test]
    fn test_directory_source_rejected() {
        let dir = TempDir::new().unwrap();
        let config = CopyConfig {
            source: dir.path().to_path_buf(),
            destination: dir.path().join("out"),
            ..Default::default()
        };
        assert!(matches!(
            CopyEngine::new(config).execute(),
            Err(PcpError::NotAFile(_))
        ));
    }

    #[test]
    fn test_same_file_rejected() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 100);
        let config = CopyConfig {
            source: src.clone(),
            destination: dir.path().join(".").join("src.bin"),
            ..Default::default()
        };
        assert!(matches!(
            CopyEngine::new(config).execute(),
            Err(PcpError::SameSourceAndDestination(_))
        ));
        assert_eq!(std::fs::metadata(&src).unwrap().len(), 100);
    }

    #[test]
    fn test_failed_block_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 1000);
        let dst = dir.path().join("dst.bin");

        // Plan for more bytes than the source holds: only the tail block can fail
        let plan = BlockPlan::new(1100, 4, None).unwrap();
        prepare_destination(&dst, 1100).unwrap();
        let pool = WorkerPool::new(4).unwrap();

        let outcome = copy_blocks(&pool, &src, &dst, plan, 64, None);

        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!((failure.offset, failure.length), (825, 275));
        assert!(failure.to_string().starts_with("bytes [825, 1100)"));
        assert_eq!(outcome.bytes_copied, 825);
        assert_eq!(pool.stats().total(), 4);

        let out = std::fs::read(&dst).unwrap();
        assert_eq!(&out[..825], &std::fs::read(&src).unwrap()[..825]);
    }

    #[test]
    fn test_report_failure_marks_unsuccessful() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 10);
        let dst = dir.path().join("dst.bin");

        let mut report = run(&src, &dst, 1, None);
        assert!(report.took_line().starts_with("Took "));

        report.failures.push(BlockFailure {
            offset: 0,
            length: 10,
            error: "boom".to_string(),
        });
        assert!(!report.is_success());
    }

    #[test]
    fn test_took_line_keeps_sub_millisecond_time() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 10);
        let dst = dir.path().join("dst.bin");

        let mut report = run(&src, &dst, 1, None);
        report.elapsed = Duration::from_nanos(1_500_700);
        assert!(report.took_line().starts_with("Took 1ms 500us ("), "{}", report.took_line());

        report.elapsed = Duration::from_nanos(250_900);
        assert!(report.took_line().starts_with("Took 250us ("), "{}", report.took_line());
    }

    #[test]
    fn test_failed_resize_removes_fresh_destination() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("fresh.bin");

        // Lengths past i64::MAX are rejected by set_len on every platform
        let err = prepare_destination(&dst, u64::MAX).unwrap_err();
        assert!(matches!(err, PcpError::Io { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn test_failed_resize_keeps_existing_destination() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("existing.bin");
        std::fs::write(&dst, b"keep me").unwrap();

        assert!(prepare_destination(&dst, u64::MAX).is_err());
        assert_eq!(std::fs::read(&dst).unwrap(), b"keep me");
    }

    #[test]
    fn test_verify_and_preserve() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 50_000);
        let dst = dir.path().join("dst.bin");

        let config = CopyConfig {
            source: src.clone(),
            destination: dst.clone(),
            threads: 4,
            verify: Some(HashAlgorithm::Blake3),
            preserve: true,
            ..Default::default()
        };
        let report = CopyEngine::new(config)
            .with_progress(ProgressReporter::disabled())
            .execute()
            .unwrap();

        assert!(report.is_success());
        assert!(report.verification.as_ref().unwrap().matches);

        let src_meta = std::fs::metadata(&src).unwrap();
        let dst_meta = std::fs::metadata(&dst).unwrap();
        assert_eq!(src_meta.permissions(), dst_meta.permissions());
        assert_eq!(src_meta.modified().unwrap(), dst_meta.modified().unwrap());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", 1000);
        let dst = dir.path().join("dst.bin");

        let report = parallel_copy(&src, &dst, 2).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["file_size"], 1000);
        assert_eq!(json["blocks"], 2);
        assert!(json["elapsed_secs"].is_f64());
        assert_eq!(json["stats"]["completed"].as_array().unwrap().len(), 2);
    }
}
