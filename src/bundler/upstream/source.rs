//! Settings source resolution

use crate::bundler::{Error, Result};
use std::path::PathBuf;
use url::Url;

/// Where a settings snapshot comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsSource {
    /// `file://` URI; checksum optional.
    Local(PathBuf),
    /// `http://` or `https://` URI; checksum required.
    Http(Url),
}

impl SettingsSource {
    pub fn parse(uri: &str) -> Result<Self> {
        let unsupported = |reason: &str| Error::UnsupportedSettingsSource {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        // Live repositories need the whole project evaluated, not a snapshot.
        if uri.ends_with(".git") || uri.starts_with("git@") {
            return Err(unsupported(
                "git repositories are not a settings snapshot source, use inherit_settings",
            ));
        }

        let url = Url::parse(uri).map_err(|e| unsupported(&format!("not a valid URI: {e}")))?;
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| unsupported("file URI does not name a local path")),
            "http" | "https" => Ok(Self::Http(url)),
            scheme if scheme == "git" || scheme.starts_with("git+") || scheme == "ssh" => Err(unsupported(
                "git repositories are not a settings snapshot source, use inherit_settings",
            )),
            scheme => Err(unsupported(&format!("unknown source type '{scheme}'"))),
        }
    }

    /// Whether a companion checksum must be fetched and verified.
    pub fn requires_checksum(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
