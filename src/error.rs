//! Top-level error types for the command line tool.
//!
//! Bundler errors keep their [`ErrorCategory`](crate::bundler::ErrorCategory),
//! which decides the process exit code.

use crate::bundler::ErrorCategory;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundler errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl BundlerError {
    /// Exit code for this error: 2 for bad input, 3 for connectivity,
    /// 4 for failed verification, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cli(_) => 2,
            Self::Bundler(e) => match e.category() {
                ErrorCategory::Configuration => 2,
                ErrorCategory::Connectivity => 3,
                ErrorCategory::Verification => 4,
                ErrorCategory::Io => 1,
            },
            Self::Io(_) | Self::Json(_) => 1,
        }
    }

    /// Actionable hints printed after the error.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let Self::Bundler(e) = self else {
            return Vec::new();
        };
        match e.category() {
            ErrorCategory::Configuration => {
                vec!["Check the project, component and platform descriptions under the config directory".into()]
            }
            ErrorCategory::Connectivity => vec![
                "Check that the signing host or upstream source is reachable".into(),
                format!(
                    "Unset {} to treat an unreachable signing host as nothing to sign",
                    crate::bundler::settings::FORCE_SIGNING_ENV
                ),
            ],
            ErrorCategory::Verification => {
                vec!["Re-publish the settings snapshot together with its .sha1 file".into()]
            }
            ErrorCategory::Io => Vec::new(),
        }
    }
}
