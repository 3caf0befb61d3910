// Library module for treesum
// Re-exports modules for use in integration tests and the binary

pub mod config;
pub mod hash;
pub mod logging;
