//! External tool detection and availability checking.
//!
//! Live upstream inheritance shells out to `git`; this module locates it once
//! and reports a useful error when it is missing.

use crate::bundler::{Error, Result};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Path to `git`, if one is on `PATH`.
///
/// Cached result to avoid repeated lookups while evaluating nested upstreams.
pub static GIT: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("git") {
    Ok(path) => {
        log::debug!("Found git at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("git not found in PATH: {}. Upstream inheritance is unavailable.", e);
        None
    }
});

/// Returns the git binary or an error naming what needed it.
pub fn require_git(purpose: &str) -> Result<PathBuf> {
    GIT.clone().ok_or_else(|| {
        Error::GenericError(format!("git is required for {purpose} but was not found in PATH"))
    })
}
