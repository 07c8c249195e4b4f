//! pcp CLI - copy one file with many threads

use clap::Parser;
use pcp::config::{CliArgs, CopyConfig, OutputFormat};
use pcp::core::CopyEngine;
use pcp::error::{PcpError, Result};
use pcp::progress::ProgressReporter;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // Logs go to stderr; stdout carries only the report
    let filter = match args.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the copy fully succeeded
fn run(args: &CliArgs) -> Result<bool> {
    let config = CopyConfig::from_cli(args)?;

    let progress = if args.progress && !args.quiet {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };

    let report = CopyEngine::new(config.clone())
        .with_progress(progress)
        .execute()?;

    match args.output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| PcpError::config(format!("Cannot encode report: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text if !args.quiet => report.print_summary(config.print_stats),
        OutputFormat::Text => {}
    }

    report.print_failures();

    if let Some(v) = report.verification.as_ref().filter(|v| !v.matches) {
        eprintln!(
            "Error: {}",
            PcpError::integrity_mismatch(
                &report.destination,
                &v.source_hash.hash,
                &v.dest_hash.hash
            )
        );
    }

    Ok(report.is_success())
}
