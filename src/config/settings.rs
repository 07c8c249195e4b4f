//! Configuration settings for pcp
//!
//! Defines the CLI arguments, the runtime configuration derived from them,
//! and size parsing helpers.

use crate::error::{PcpError, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// pcp - copy one file with many threads
#[derive(Parser, Debug, Clone)]
#[command(name = "pcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parallel single-file copy")]
#[command(long_about = r#"
pcp splits a file into byte ranges and copies each range from a separate
worker thread straight into its final position in the destination file.

Examples:
  pcp big.img /mnt/backup/big.img             # one block per hardware thread
  pcp big.img copy.img -t 8 -p                # 8 workers, print per-worker tasks
  pcp big.img copy.img -b 64M --verify xxhash3
"#)]
pub struct CliArgs {
    /// Source file
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Destination file (created or resized to the source size)
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Fixed block size (e.g., 300000, 64K, 16M); overrides thread-derived sizing
    #[arg(short = 'b', long, value_name = "SIZE")]
    pub block_size: Option<String>,

    /// Number of worker threads (0 = hardware concurrency)
    #[arg(short = 't', long, default_value = "0", value_name = "NUM")]
    pub threads: usize,

    /// Print per-worker completed task counts after the copy
    #[arg(short = 'p', long)]
    pub print_stats: bool,

    /// I/O buffer used by each block copy (e.g., 1M, 256K)
    #[arg(long, default_value = "1M", value_name = "SIZE")]
    pub buffer_size: String,

    /// Verify the destination against the source after copying
    #[arg(long, value_enum, value_name = "ALGO")]
    pub verify: Option<HashAlgorithm>,

    /// Preserve permissions and timestamps
    #[arg(long)]
    pub preserve: bool,

    /// Show a live progress bar
    #[arg(long)]
    pub progress: bool,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Verbose logging (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Log filter directive implied by `-v` flags, if any
    pub fn log_directive(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("pcp=info"),
            2 => Some("pcp=debug"),
            _ => Some("pcp=trace"),
        }
    }
}

/// Hash algorithm for integrity verification
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// XXHash3 - Ultra fast, non-cryptographic (128-bit)
    #[default]
    #[value(name = "xxhash3")]
    XXHash3,
    /// BLAKE3 - Fast and cryptographically secure
    #[value(name = "blake3")]
    Blake3,
    /// SHA-256 - Standard cryptographic hash
    #[value(name = "sha256")]
    Sha256,
}

impl HashAlgorithm {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::XXHash3 => "XXHash3",
            Self::Blake3 => "BLAKE3",
            Self::Sha256 => "SHA-256",
        }
    }
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Source file
    pub source: PathBuf,
    /// Destination file
    pub destination: PathBuf,
    /// Worker count, 0 = hardware concurrency
    pub threads: usize,
    /// Fixed block size; `None` splits into one block per worker
    pub block_size: Option<u64>,
    /// Per-task I/O buffer in bytes
    pub buffer_size: usize,
    /// Hash algorithm for verification
    pub verify: Option<HashAlgorithm>,
    /// Preserve attributes
    pub preserve: bool,
    /// Collect and print per-worker stats
    pub print_stats: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            threads: 0,
            block_size: None,
            buffer_size: 1024 * 1024, // 1MB
            verify: None,
            preserve: false,
            print_stats: false,
        }
    }
}

impl CopyConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let block_size = args
            .block_size
            .as_deref()
            .map(parse_size)
            .transpose()
            .map_err(|e| PcpError::config(format!("Invalid block size: {}", e)))?;

        let buffer_size = parse_size(&args.buffer_size)
            .map_err(|e| PcpError::config(format!("Invalid buffer size: {}", e)))?;

        let config = Self {
            source: args.source.clone(),
            destination: args.destination.clone(),
            threads: args.threads,
            block_size,
            buffer_size: usize::try_from(buffer_size)
                .map_err(|_| PcpError::config("Buffer size does not fit in memory"))?,
            verify: args.verify,
            preserve: args.preserve,
            print_stats: args.print_stats,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the block plan or the copy loop degenerate
    pub fn validate(&self) -> Result<()> {
        if self.block_size == Some(0) {
            return Err(PcpError::config("Block size must be at least 1 byte"));
        }
        if self.buffer_size == 0 {
            return Err(PcpError::config("Buffer size must be at least 1 byte"));
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the hardware concurrency
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        let num = size.trim_end_matches(|c| c == 'T' || c == 'B');
        (num, 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        let num = size.trim_end_matches(|c| c == 'G' || c == 'B');
        (num, 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        let num = size.trim_end_matches(|c| c == 'M' || c == 'B');
        (num, 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        let num = size.trim_end_matches(|c| c == 'K' || c == 'B');
        (num, 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        (size.as_str(), 1u64)
    };

    let num_str = num_str.trim();

    // Plain integers stay exact; fractions go through f64
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: {}", size));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Invalid number: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["pcp", "src.bin", "dst.bin"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("300000").unwrap(), 300_000);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1m").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("-1").is_err());
    }

    #[test]
    fn test_from_cli_defaults() {
        let config = CopyConfig::from_cli(&args(&[])).unwrap();
        assert_eq!(config.source, PathBuf::from("src.bin"));
        assert_eq!(config.destination, PathBuf::from("dst.bin"));
        assert_eq!(config.block_size, None);
        assert_eq!(config.threads, 0);
        assert!(config.effective_threads() >= 1);
        assert!(!config.print_stats);
    }

    #[test]
    fn test_from_cli_short_flags() {
        let config = CopyConfig::from_cli(&args(&["-b", "300000", "-t", "4", "-p"])).unwrap();
        assert_eq!(config.block_size, Some(300_000));
        assert_eq!(config.effective_threads(), 4);
        assert!(config.print_stats);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let err = CopyConfig::from_cli(&args(&["-b", "0"])).unwrap_err();
        assert!(matches!(err, PcpError::ConfigError(_)));
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(args(&[]).log_directive(), None);
        assert_eq!(args(&["-vv"]).log_directive(), Some("pcp=debug"));
    }
}
