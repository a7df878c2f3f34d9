//! Error types for resolution, inheritance, signing and planning.
//!
//! Every variant maps onto an [`ErrorCategory`] so callers can tell a bad
//! project description from an unreachable host or a failed verification.

use std::{fmt::Display, io, path::PathBuf};

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad descriptions, unsupported sources, missing required values.
    Configuration,
    /// Unreachable signing host, failed upstream or snapshot fetch.
    Connectivity,
    /// Checksum or signature verification failures. Never recovered.
    Verification,
    /// Local filesystem and process failures.
    Io,
}

/// Errors produced by the bundler core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Free-form error message.
    #[error("{0}")]
    GenericError(String),

    /// Error wrapped with additional context.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// Filesystem operation failed on a specific path.
    #[error("{context} {path}: {error}")]
    Fs {
        /// What was being attempted.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        error: io::Error,
    },

    /// IO error without path information.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// A subprocess could not be spawned or waited on.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command line.
        command: String,
        /// Underlying error.
        error: io::Error,
    },

    /// A subprocess exited unsuccessfully.
    #[error("command `{command}` exited with {status}: {stderr}")]
    CommandStatus {
        /// Command line.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A subprocess did not finish in time.
    #[error("command `{command}` timed out after {seconds}s")]
    CommandTimeout {
        /// Command line.
        command: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// Vendor string lacks an email address in angle brackets.
    #[error(
        "Project vendor field must include email address in angle brackets, e.g. 'Example Inc. <release@example.com>' (got '{0}')"
    )]
    InvalidVendor(String),

    /// An operation needed the project version but none was set.
    #[error("project '{0}' has no version")]
    MissingVersion(String),

    /// Settings snapshot URI uses a scheme that cannot be inherited from.
    #[error("can't inherit settings from '{uri}': {reason}")]
    UnsupportedSettingsSource {
        /// Offending URI.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Network snapshot requested without a checksum URI.
    #[error("a sha1sum URI is required when inheriting settings over http: '{0}'")]
    MissingChecksumUri(String),

    /// A description file could not be understood.
    #[error("invalid description {path}: {reason}")]
    InvalidDescription {
        /// Description file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Platform name does not map to a known OS family.
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    /// Local settings snapshot does not exist.
    #[error("settings file not found: {0}")]
    FileNotFound(PathBuf),

    /// Signing host could not be reached while signing was forced.
    #[error("unable to connect to signing host {target}: {reason}")]
    SigningHostUnreachable {
        /// `user@host`, or `localhost` for local signing.
        target: String,
        /// Probe failure.
        reason: String,
    },

    /// Fetching a remote source failed.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed {
        /// Source URL.
        url: String,
        /// Failure description.
        reason: String,
    },

    /// Checksum file could not be retrieved.
    #[error("unable to retrieve checksum {uri}: {reason}")]
    ChecksumUnavailable {
        /// Checksum URI.
        uri: String,
        /// Failure description.
        reason: String,
    },

    /// Content did not match its published checksum.
    #[error("sha1 mismatch for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Verified URI.
        uri: String,
        /// Digest from the checksum file.
        expected: String,
        /// Digest of the fetched content.
        actual: String,
    },

    /// HTTP client error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// YAML (de)serialization error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classifies this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Context(_, inner) => inner.category(),
            Error::InvalidVendor(_)
            | Error::MissingVersion(_)
            | Error::UnsupportedSettingsSource { .. }
            | Error::MissingChecksumUri(_)
            | Error::InvalidDescription { .. }
            | Error::UnknownPlatform(_)
            | Error::FileNotFound(_)
            | Error::Yaml(_)
            | Error::GenericError(_) => ErrorCategory::Configuration,
            Error::SigningHostUnreachable { .. } | Error::FetchFailed { .. } | Error::Http(_) => {
                ErrorCategory::Connectivity
            }
            Error::ChecksumUnavailable { .. } | Error::ChecksumMismatch { .. } => {
                ErrorCategory::Verification
            }
            Error::Fs { .. }
            | Error::IoError(_)
            | Error::CommandFailed { .. }
            | Error::CommandStatus { .. }
            | Error::CommandTimeout { .. }
            | Error::Json(_) => ErrorCategory::Io,
        }
    }
}

/// Attach context to fallible values.
pub trait Context<T> {
    /// Wraps the error (or `None`) with a static message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error (or `None`) with a lazily built message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach a path to IO errors.
pub trait ErrorExt<T> {
    /// Converts an `io::Error` into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
