//! File system helpers shared by description loading and publishing.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Reads a local settings source.
///
/// A missing file is reported as [`Error::FileNotFound`] rather than a bare
/// IO error so callers can tell a bad URI from a broken disk.
pub async fn read_local(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::FileNotFound(path.to_path_buf())),
        Err(e) => Err(e).fs_context("reading settings source", path),
    }
}

/// Reads a description file into a string, or `None` if it does not exist.
pub async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).fs_context("reading description", path),
    }
}

/// Creates `path` and any missing parents. An existing directory is kept as is.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}
