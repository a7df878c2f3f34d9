//! Settings inherited from other projects.
//!
//! Two ways in, both ending in a bulk merge into the local settings store:
//!
//! - **Live upstream**: check out a ref of the upstream repository, evaluate
//!   its project description in isolation (no components) and take its
//!   settings.
//! - **Published snapshot**: fetch a YAML snapshot from a `file://` or
//!   `http(s)://` URI. Network snapshots must come with a `.sha1` companion and
//!   are verified against it.

mod source;

pub use source::SettingsSource;

use crate::bundler::{
    Error, Result,
    builder::tool_detection::require_git,
    platform::load_platform,
    project::{dsl::ComponentFilter, load_project},
    settings::{SettingValue, SettingsStore, snapshot},
    utils::{fs::read_local, http::download},
};
use std::{collections::BTreeMap, future::Future, path::Path, pin::Pin};

/// Boxed future used to break the upstream evaluation recursion.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetches upstream settings.
#[derive(Clone, Debug, Default)]
pub struct UpstreamLoader {
    client: reqwest::Client,
}

impl UpstreamLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Loads a published settings snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedSettingsSource`] for git or unknown URIs
    /// - [`Error::MissingChecksumUri`] for network sources without `sha1_uri`
    /// - [`Error::ChecksumUnavailable`] / [`Error::ChecksumMismatch`] when verification fails
    /// - [`Error::FileNotFound`] for missing local files
    pub async fn load_yaml_settings(
        &self,
        uri: &str,
        sha1_uri: Option<&str>,
    ) -> Result<BTreeMap<String, SettingValue>> {
        let source = SettingsSource::parse(uri)?;
        if source.requires_checksum() && sha1_uri.is_none() {
            return Err(Error::MissingChecksumUri(uri.to_string()));
        }

        let content = self.fetch(&source).await?;

        if let Some(sha1_uri) = sha1_uri {
            let checksum = self.fetch_checksum(sha1_uri).await?;
            snapshot::verify(uri, &content, &checksum)?;
        }

        let settings = snapshot::parse_yaml(&content)?;
        log::debug!("Loaded {} settings from {}", settings.len(), uri);
        Ok(settings)
    }

    /// Evaluates `project` at `git_ref` of `url` and returns its settings.
    ///
    /// The upstream is evaluated for the platform of the same name, loaded
    /// from the checkout's own `configs/platforms`.
    pub fn load_upstream_settings<'a>(
        &'a self,
        project: &'a str,
        url: &'a str,
        git_ref: &'a str,
        platform: &'a str,
    ) -> BoxFuture<'a, Result<SettingsStore>> {
        Box::pin(async move {
            let checkout = tempfile::tempdir()?;
            self.checkout(url, git_ref, checkout.path()).await?;

            let configdir = checkout.path().join("configs");
            let platform = load_platform(platform, &configdir.join("platforms")).await?;
            let upstream = load_project(project, &configdir, platform, ComponentFilter::none(), self).await?;

            log::info!("Inherited {} settings from {} at {}", upstream.settings.len(), project, git_ref);
            Ok(upstream.settings)
        })
    }

    async fn fetch(&self, source: &SettingsSource) -> Result<Vec<u8>> {
        match source {
            SettingsSource::Local(path) => read_local(path).await,
            SettingsSource::Http(url) => download(&self.client, url.as_str()).await,
        }
    }

    async fn fetch_checksum(&self, sha1_uri: &str) -> Result<String> {
        let unavailable = |e: Error| Error::ChecksumUnavailable {
            uri: sha1_uri.to_string(),
            reason: e.to_string(),
        };
        let source = SettingsSource::parse(sha1_uri).map_err(unavailable)?;
        let bytes = self.fetch(&source).await.map_err(unavailable)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn checkout(&self, url: &str, git_ref: &str, dir: &Path) -> Result<()> {
        let git = require_git("inheriting upstream settings")?;
        log::debug!("Cloning {} into {}", url, dir.display());

        let clone = tokio::process::Command::new(&git)
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(dir)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: format!("git clone {url}"),
                error,
            })?;
        if !clone.status.success() {
            return Err(Error::FetchFailed {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&clone.stderr).trim().to_string(),
            });
        }

        let checkout = tokio::process::Command::new(&git)
            .arg("-C")
            .arg(dir)
            .args(["checkout", "--quiet", git_ref])
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: format!("git checkout {git_ref}"),
                error,
            })?;
        if !checkout.status.success() {
            return Err(Error::FetchFailed {
                url: format!("{url}#{git_ref}"),
                reason: String::from_utf8_lossy(&checkout.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
