//! Command line interface for the bundler pipeline.
//!
//! This module parses arguments, loads the requested project and dispatches
//! to the `plan`, `resolve` and `publish` commands.

mod args;
pub mod commands;

pub use args::{Args, Command, Target};

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    validate_args(&args).map_err(|reason| CliError::InvalidArguments { reason })?;
    commands::execute(&args).await
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}
