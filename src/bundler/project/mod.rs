//! The project aggregate.
//!
//! A [`Project`] owns its settings, its components and everything the packaging
//! plan needs to know: signing configuration, delivery repo, packaging
//! switches. It is built once by evaluating a project description (see
//! [`dsl`]) and is read-only while plans are computed.

mod component;
pub mod dsl;
mod graph;

pub use component::{Component, load_component};
pub use dsl::{Directive, ProjectDsl, load_project};
pub use graph::ComponentGraph;

use crate::bundler::{
    Error, ErrorExt, Result,
    platform::{PackageContext, Platform},
    settings::{SettingsStore, SigningSettings, snapshot},
};
use crate::metadata::DependencyInfo;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// A directory packaged with the project.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Directory {
    pub path: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Directory {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: None,
            owner: None,
            group: None,
        }
    }
}

/// One entry of the binary signing sweep: files matching `pattern` under `path`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BinarySigningPath {
    pub path: String,
    pub pattern: String,
}

impl BinarySigningPath {
    pub fn new(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pattern: pattern.into(),
        }
    }
}

/// A software project and its packaging configuration.
#[derive(Debug)]
pub struct Project {
    pub name: String,
    pub version: Option<String>,
    pub release: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    /// Reverse-DNS prefix for macOS package identifiers.
    pub identifier: Option<String>,
    vendor: Option<String>,

    pub settings: SettingsStore,
    pub components: ComponentGraph,
    pub directories: Vec<Directory>,

    pub signing: SigningSettings,
    pub binary_signing_paths: Vec<BinarySigningPath>,

    /// Delivery subdirectory under the platform output dir.
    pub target_repo: Option<String>,
    /// Explicit bill-of-materials location. Unset keeps the legacy relocation.
    pub bill_of_materials: Option<String>,
    pub noarch: bool,
    pub generate_packages: bool,
    pub generate_archives: bool,
    pub generate_source_artifacts: bool,
    pub publish_yaml_settings: bool,

    platform: Box<dyn Platform>,
}

impl Project {
    /// Creates a project targeting `platform`, starting from the platform's settings.
    pub fn new(name: impl Into<String>, platform: Box<dyn Platform>) -> Self {
        Self {
            name: name.into(),
            version: None,
            release: "1".to_string(),
            description: None,
            homepage: None,
            license: None,
            identifier: None,
            vendor: None,
            settings: platform.descriptor().settings.clone(),
            components: ComponentGraph::new(),
            directories: Vec::new(),
            signing: SigningSettings::default(),
            binary_signing_paths: Vec::new(),
            target_repo: None,
            bill_of_materials: None,
            noarch: false,
            generate_packages: true,
            generate_archives: false,
            generate_source_artifacts: false,
            publish_yaml_settings: false,
            platform,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// The version, or [`Error::MissingVersion`].
    pub fn require_version(&self) -> Result<&str> {
        self.version
            .as_deref()
            .ok_or_else(|| Error::MissingVersion(self.name.clone()))
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// Sets the vendor, which must carry an email address in angle brackets.
    pub fn set_vendor(&mut self, vendor: impl Into<String>) -> Result<()> {
        let vendor = vendor.into();
        if split_vendor(&vendor).is_none() {
            return Err(Error::InvalidVendor(vendor));
        }
        self.vendor = Some(vendor);
        Ok(())
    }

    /// `Example Inc.` from `Example Inc. <release@example.com>`.
    pub fn vendor_name_only(&self) -> Option<&str> {
        self.vendor.as_deref().and_then(split_vendor).map(|(name, _)| name)
    }

    /// `release@example.com` from `Example Inc. <release@example.com>`.
    pub fn vendor_email_only(&self) -> Option<&str> {
        self.vendor.as_deref().and_then(split_vendor).map(|(_, email)| email)
    }

    /// `name` followed by every project component it transitively requires.
    pub fn resolve(&self, name: &str) -> Vec<&Component> {
        self.components.resolve(name)
    }

    /// Project and component directories, without any that sit inside another.
    pub fn root_directories(&self) -> Vec<String> {
        let mut all: Vec<&str> = self
            .directories
            .iter()
            .map(|d| d.path.as_str())
            .chain(self.components.iter().flat_map(|c| c.directories.iter().map(String::as_str)))
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .collect();
        all.sort_unstable();
        all.dedup();

        let mut roots: Vec<String> = Vec::new();
        // Sorted order puts every parent before its children.
        for dir in all {
            let nested = roots
                .iter()
                .any(|root| dir.strip_prefix(root.as_str()).is_some_and(|rest| rest.starts_with('/')));
            if !nested {
                roots.push(dir.to_string());
            }
        }
        roots
    }

    /// Version and ref of every component, keyed by name.
    pub fn dependencies_info(&self) -> BTreeMap<String, DependencyInfo> {
        self.components
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    DependencyInfo {
                        version: c.version.clone(),
                        source_ref: c.source_ref().map(str::to_string),
                    },
                )
            })
            .collect()
    }

    /// Build requirements that are host packages rather than components.
    pub fn build_dependencies(&self) -> Vec<String> {
        self.components.external_requirements()
    }

    /// Command installing [`build_dependencies`](Self::build_dependencies).
    pub fn install_build_dependencies(&self) -> Option<String> {
        self.platform.install_build_dependencies(&self.build_dependencies())
    }

    /// The full packaging plan: the platform package and/or the compiled
    /// archive, depending on the packaging switches.
    pub fn generate_package(&self, context: &PackageContext<'_>) -> Result<Vec<String>> {
        let mut commands = Vec::new();
        if self.generate_packages {
            commands.extend(self.platform.generate_package(self, context)?.into_commands());
        }
        if self.generate_archives {
            commands.extend(self.platform.generate_compiled_archive(self)?.into_commands());
        }
        Ok(commands)
    }

    /// Writes the settings snapshot and its `.sha1` companion into
    /// `output_dir`, which must already exist.
    ///
    /// Does nothing unless publishing is enabled.
    pub async fn publish_yaml_settings(&self, output_dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
        if !self.publish_yaml_settings {
            return Ok(None);
        }
        let version = self.require_version()?;

        let file_name = format!(
            "{}-{}.{}.settings.yaml",
            self.name,
            version,
            self.platform.name()
        );
        let yaml_path = output_dir.join(&file_name);
        let sha1_path = output_dir.join(format!("{file_name}.{}", snapshot::CHECKSUM_EXTENSION));

        let yaml = snapshot::to_yaml(&self.settings)?;
        tokio::fs::write(&yaml_path, &yaml)
            .await
            .fs_context("writing settings snapshot", &yaml_path)?;
        tokio::fs::write(&sha1_path, snapshot::checksum_file_content(&yaml))
            .await
            .fs_context("writing settings checksum", &sha1_path)?;

        log::info!("Published settings to {}", yaml_path.display());
        Ok(Some((yaml_path, sha1_path)))
    }
}

/// Splits `Name <user@host>` into its name and email.
fn split_vendor(vendor: &str) -> Option<(&str, &str)> {
    let open = vendor.find('<')?;
    let close = open + vendor[open..].find('>')?;
    let email = &vendor[open + 1..close];
    let (user, host) = email.split_once('@')?;
    if user.is_empty() || host.is_empty() {
        return None;
    }
    Some((vendor[..open].trim(), email))
}
