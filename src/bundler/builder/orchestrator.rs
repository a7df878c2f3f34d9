//! Main bundler orchestration.
//!
//! The [`Bundler`] ties a loaded [`Project`] to the global toggles and the
//! extra-file signer, and hands out the finished command plan. It never runs
//! the plan; execution belongs to whoever consumes the command list.

use super::signing::ExtraFilesSigner;
use crate::{
    bundler::{
        Result,
        platform::PackageContext,
        project::{Component, Project},
        settings::BuildToggles,
        utils::fs::create_dir_all,
    },
    metadata::save_manifest_json,
};
use std::path::{Path, PathBuf};

/// Packaging orchestrator for one project on one platform.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_pipeline::bundler::{Bundler, UpstreamLoader, load_project, settings::BuildToggles};
/// use kodegen_bundler_pipeline::bundler::{platform::load_platform, project::dsl::ComponentFilter};
/// use std::path::Path;
///
/// # async fn example() -> kodegen_bundler_pipeline::bundler::Result<()> {
/// let configdir = Path::new("configs");
/// let platform = load_platform("el-9-x86_64", &configdir.join("platforms")).await?;
/// let loader = UpstreamLoader::new();
/// let project = load_project("agent", configdir, platform, ComponentFilter::All, &loader).await?;
///
/// let bundler = Bundler::new(project, BuildToggles::from_env());
/// for command in bundler.plan()? {
///     println!("{command}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    project: Project,
    toggles: BuildToggles,
    signer: ExtraFilesSigner,
}

impl Bundler {
    /// Creates a bundler that signs over ssh as configured by the environment.
    pub fn new(project: Project, toggles: BuildToggles) -> Self {
        Self::with_signer(project, toggles, ExtraFilesSigner::default())
    }

    pub fn with_signer(project: Project, toggles: BuildToggles, signer: ExtraFilesSigner) -> Self {
        Self {
            project,
            toggles,
            signer,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn toggles(&self) -> BuildToggles {
        self.toggles
    }

    /// The complete, ordered command list for this project.
    pub fn plan(&self) -> Result<Vec<String>> {
        let context = PackageContext {
            toggles: self.toggles,
            signer: &self.signer,
        };
        let commands = self.project.generate_package(&context)?;
        log::info!(
            "Planned {} commands for {} on {}",
            commands.len(),
            self.project.name,
            self.project.platform().name()
        );
        Ok(commands)
    }

    /// Components to build for `root`, root first.
    ///
    /// Without a root, every declared component is resolved in declaration
    /// order and each appears once.
    pub fn resolve(&self, root: Option<&str>) -> Vec<&Component> {
        match root {
            Some(root) => self.project.resolve(root),
            None => {
                let mut seen = std::collections::HashSet::new();
                self.project
                    .components
                    .iter()
                    .flat_map(|c| self.project.resolve(&c.name))
                    .filter(|c| seen.insert(c.name.as_str()))
                    .collect()
            }
        }
    }

    /// Delivery directory of this project's packages, relative to the work dir.
    pub fn output_dir(&self) -> String {
        self.project
            .platform()
            .output_dir(self.project.target_repo.as_deref())
    }

    /// Writes the build manifests and, when enabled, the settings snapshot
    /// into `dir`. Returns every file written.
    pub async fn publish(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        create_dir_all(dir).await?;

        let mut written = save_manifest_json(&self.project, dir).await?;
        if let Some((yaml, sha1)) = self.project.publish_yaml_settings(dir).await? {
            written.push(yaml);
            written.push(sha1);
        }

        log::info!("Published {} files to {}", written.len(), dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        builder::{ShellRunner, SshOptions},
        platform::load_platform_named,
    };

    fn bundler(platform: &str) -> Bundler {
        let mut project = Project::new("agent", load_platform_named(platform).unwrap());
        project.version = Some("7.1.0".into());
        project.components.add(Component::new("ruby").requires(["openssl", "gcc"]));
        project.components.add(Component::new("openssl").requires(["zlib"]));
        project.components.add(Component::new("zlib"));
        project.components.add(Component::new("facter").requires(["ruby"]));
        let signer = ExtraFilesSigner::new(Box::new(ShellRunner::default()), SshOptions::default());
        Bundler::with_signer(project, BuildToggles::default(), signer)
    }

    fn names(components: Vec<&Component>) -> Vec<&str> {
        components.into_iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn resolves_one_root_or_everything() {
        let bundler = bundler("el-9-x86_64");
        assert_eq!(names(bundler.resolve(Some("facter"))), ["facter", "ruby", "openssl", "zlib"]);
        assert_eq!(names(bundler.resolve(None)), ["ruby", "openssl", "zlib", "facter"]);
        assert!(bundler.resolve(Some("missing")).is_empty());
    }

    #[test]
    fn plans_for_the_project_platform() {
        let bundler = bundler("el-9-x86_64");
        let plan = bundler.plan().unwrap();
        assert!(plan.iter().any(|c| c.contains("rpmbuild")));
        assert_eq!(bundler.output_dir(), "el/9/x86_64");
    }

    #[tokio::test]
    async fn publish_writes_manifests_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");

        let mut bundler = bundler("debian-13-amd64");
        assert_eq!(bundler.publish(&out).await.unwrap().len(), 2);

        bundler.project.publish_yaml_settings = true;
        let written = bundler.publish(&out).await.unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));
        assert!(written[3].to_string_lossy().ends_with(".settings.yaml.sha1"));
    }
}
