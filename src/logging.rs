// Logging setup
// Diagnostics go to stderr through tracing; stdout carries only the report

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable that replaces the computed filter when set
pub const LOG_ENV_VAR: &str = "TREESUM_LOG";

/// Filter directive for the given verbosity flags
pub fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "treesum=error";
    }
    match verbose {
        0 => "treesum=warn",
        1 => "treesum=info",
        _ => "treesum=debug",
    }
}

/// Install the global subscriber
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow!(e))
}
