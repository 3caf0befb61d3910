//! treesum - BLAKE3 checksums for directory trees
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use tracing::info;
use treesum::config::{CliArgs, ScanConfig};
use treesum::hash::{HashUtilityError, ScanEngine};
use treesum::logging::init_logging;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// 2 for configuration-class failures, 1 for everything else
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<HashUtilityError>() {
        Some(e) if e.is_fatal() => 2,
        _ => 1,
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet)?;

    let config = ScanConfig::from_args(args).context("Invalid configuration")?;
    info!(
        targets = config.targets.len(),
        workers = config.workers,
        recursive = config.recursive,
        "starting scan"
    );

    let order = config.column_order;
    let engine = ScanEngine::new(config);
    let report = engine.run().context("Scan failed")?;

    if report.stats.files_failed > 0 {
        info!(failed = report.stats.files_failed, "some files could not be hashed");
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    report
        .write_to(&mut out, order)
        .context("Failed to write report")?;

    Ok(())
}
