//! Project descriptions.
//!
//! A description is an ordered list of [`Directive`]s, stored as a
//! `[[directive]]` array in `projects/<name>.toml`. Directives run strictly in
//! order against one [`Project`], so settings written before an inheritance
//! step are overridden by it and settings written after it win.

use super::{BinarySigningPath, Directory, Project, component::load_component};
use crate::bail;
use crate::bundler::{
    Context, Error, ErrorExt, Result,
    platform::Platform,
    settings::SettingValue,
    upstream::UpstreamLoader,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One statement of a project description.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Directive {
    Name(String),
    Version(String),
    Release(String),
    Description(String),
    Homepage(String),
    License(String),
    Identifier(String),
    Vendor(String),
    Setting {
        name: String,
        value: SettingValue,
    },
    /// Evaluate an upstream project at a ref and merge its settings.
    InheritSettings {
        project: String,
        url: String,
        #[serde(rename = "ref")]
        git_ref: String,
    },
    /// Merge a published settings snapshot.
    InheritYamlSettings {
        uri: String,
        #[serde(default)]
        sha1_uri: Option<String>,
    },
    Component(String),
    Directory(Directory),
    TargetRepo(String),
    BillOfMaterials(String),
    Noarch(bool),
    GeneratePackages(bool),
    GenerateArchives(bool),
    GenerateSourceArtifacts(bool),
    PublishYamlSettings(bool),
    ExtraFileToSign(String),
    SigningHostname(String),
    SigningUsername(String),
    SigningCommand(String),
    UseLocalSigning(bool),
    BinarySigningPath(BinarySigningPath),
}

/// Which `component` directives actually load their description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ComponentFilter {
    #[default]
    All,
    Only(Vec<String>),
}

impl ComponentFilter {
    /// Admits no component. Used when evaluating upstream projects.
    pub fn none() -> Self {
        Self::Only(Vec::new())
    }

    pub fn admits(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    #[serde(default, rename = "directive")]
    directives: Vec<Directive>,
}

/// Parses the contents of a `projects/<name>.toml` file.
pub fn parse_directives(content: &str, path: &Path) -> Result<Vec<Directive>> {
    let file: ProjectFile = toml::from_str(content).map_err(|e| Error::InvalidDescription {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(file.directives)
}

/// Evaluates directives against a project.
#[derive(Debug)]
pub struct ProjectDsl<'a> {
    project: Project,
    components_dir: PathBuf,
    filter: ComponentFilter,
    loader: &'a UpstreamLoader,
}

impl<'a> ProjectDsl<'a> {
    pub fn new(project: Project, configdir: &Path, filter: ComponentFilter, loader: &'a UpstreamLoader) -> Self {
        Self {
            project,
            components_dir: configdir.join("components"),
            filter,
            loader,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Runs every directive in order, stopping at the first failure.
    pub async fn evaluate<I>(&mut self, directives: I) -> Result<()>
    where
        I: IntoIterator<Item = Directive>,
    {
        for directive in directives {
            self.apply(directive).await?;
        }
        Ok(())
    }

    pub async fn apply(&mut self, directive: Directive) -> Result<()> {
        let project = &mut self.project;
        match directive {
            Directive::Name(name) => {
                if name.trim().is_empty() {
                    bail!("project name cannot be empty");
                }
                project.name = name
            }
            Directive::Version(version) => project.version = Some(version),
            Directive::Release(release) => project.release = release,
            Directive::Description(description) => project.description = Some(description),
            Directive::Homepage(homepage) => project.homepage = Some(homepage),
            Directive::License(license) => project.license = Some(license),
            Directive::Identifier(identifier) => project.identifier = Some(identifier),
            Directive::Vendor(vendor) => project.set_vendor(vendor)?,
            Directive::Setting { name, value } => project.settings.set(name, value),
            Directive::InheritSettings { project, url, git_ref } => {
                self.inherit_settings(&project, &url, &git_ref).await
            }
            Directive::InheritYamlSettings { uri, sha1_uri } => {
                let settings = self
                    .loader
                    .load_yaml_settings(&uri, sha1_uri.as_deref())
                    .await
                    .with_context(|| format!("inheriting settings from {uri}"))?;
                self.project.settings.merge(settings);
            }
            Directive::Component(name) => {
                if self.filter.admits(&name) {
                    let component = load_component(&name, &self.components_dir).await?;
                    self.project.components.add(component);
                } else {
                    log::debug!("Skipping component {name}");
                }
            }
            Directive::Directory(directory) => project.directories.push(directory),
            Directive::TargetRepo(repo) => project.target_repo = Some(repo),
            Directive::BillOfMaterials(path) => project.bill_of_materials = Some(path),
            Directive::Noarch(noarch) => project.noarch = noarch,
            Directive::GeneratePackages(on) => project.generate_packages = on,
            Directive::GenerateArchives(on) => project.generate_archives = on,
            Directive::GenerateSourceArtifacts(on) => project.generate_source_artifacts = on,
            Directive::PublishYamlSettings(on) => project.publish_yaml_settings = on,
            Directive::ExtraFileToSign(file) => project.signing.extra_files.push(file),
            Directive::SigningHostname(host) => project.signing.hostname = Some(host),
            Directive::SigningUsername(user) => project.signing.username = Some(user),
            Directive::SigningCommand(command) => project.signing.commands.push(command),
            Directive::UseLocalSigning(on) => project.signing.use_local_signing = on,
            Directive::BinarySigningPath(entry) => project.binary_signing_paths.push(entry),
        }
        Ok(())
    }

    /// Merges the settings of an upstream project. Failures leave the local
    /// settings untouched.
    async fn inherit_settings(&mut self, upstream: &str, url: &str, git_ref: &str) {
        let platform = self.project.platform().name().to_string();
        match self
            .loader
            .load_upstream_settings(upstream, url, git_ref, &platform)
            .await
        {
            Ok(settings) => self.project.settings.merge(settings),
            Err(e) => log::error!(
                "Unable to inherit settings from {upstream} ({url} at {git_ref}): {e}"
            ),
        }
    }

    /// Finishes evaluation.
    pub fn into_project(self) -> Project {
        self.project.components.log_cycles();
        self.project
    }
}

/// Loads and evaluates `<configdir>/projects/<name>.toml` for `platform`.
pub async fn load_project(
    name: &str,
    configdir: &Path,
    platform: Box<dyn Platform>,
    filter: ComponentFilter,
    loader: &UpstreamLoader,
) -> Result<Project> {
    let path = configdir.join("projects").join(format!("{name}.toml"));
    let content = tokio::fs::read_to_string(&path)
        .await
        .fs_context("reading project description", &path)?;
    let directives = parse_directives(&content, &path)?;

    log::debug!(
        "Evaluating {} directives from {} for {}",
        directives.len(),
        path.display(),
        platform.name()
    );

    let mut dsl = ProjectDsl::new(Project::new(name, platform), configdir, filter, loader);
    dsl.evaluate(directives)
        .await
        .with_context(|| format!("evaluating {}", path.display()))?;
    Ok(dsl.into_project())
}
