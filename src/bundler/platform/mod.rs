//! Target platforms and their packaging plans.
//!
//! A platform is selected once, when the project description is loaded, and
//! held by the [`Project`] as a boxed [`Platform`]. Each OS family knows how to
//! name its package, install build dependencies and plan the commands that
//! turn a built source tarball into a distributable artifact.
//!
//! # Platform names
//!
//! Names follow `<os>-<version>-<arch>`, e.g. `osx-15-arm64`,
//! `debian-13-amd64`, `el-9-x86_64` or `windows-2019-x64`. The OS segment picks
//! the [`PlatformFamily`].
//!
//! # Descriptions
//!
//! `<configdir>/platforms/<name>.toml` may refine the defaults:
//!
//! ```toml
//! codename = "trixie"
//! install_build_dependencies_with = "apt-get install -qy --no-install-recommends"
//!
//! [settings]
//! prefix = "/opt/example"
//! ```

pub mod linux;
pub mod macos;
pub mod windows;

use crate::bundler::{
    Error, Result,
    builder::{CommandPlan, ExtraFilesSigner, Stage},
    project::Project,
    settings::{Arch, BuildToggles, SettingValue, SettingsStore},
    utils::fs::read_optional,
};
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, path::Path};

/// `mktemp` invocation used unless a family or description overrides it.
pub const DEFAULT_MKTEMP: &str = "mktemp -d -p /var/tmp";

/// OS families with distinct packaging pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// macOS: pkgbuild, productbuild and a signed, notarized disk image.
    MacOs,
    /// Debian and Ubuntu: debuild.
    Debian,
    /// Enterprise Linux, Fedora, SLES, Amazon Linux: rpmbuild.
    Rpm,
    /// Windows: WiX MSI.
    Windows,
}

impl PlatformFamily {
    /// Maps the OS segment of a platform name onto a family.
    pub fn from_os_name(os: &str) -> Option<Self> {
        match os {
            "osx" | "macos" => Some(Self::MacOs),
            "debian" | "ubuntu" => Some(Self::Debian),
            "el" | "fedora" | "sles" | "amazon" => Some(Self::Rpm),
            os if os.starts_with("redhat") => Some(Self::Rpm),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MacOs => "macos",
            Self::Debian => "debian",
            Self::Rpm => "rpm",
            Self::Windows => "windows",
        })
    }
}

/// Everything known about a platform before a family strategy is chosen.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformDescriptor {
    pub name: String,
    pub os_name: String,
    pub os_version: String,
    pub architecture: String,
    pub family: PlatformFamily,
    pub mktemp: String,
    /// Command prefix for installing build dependencies.
    pub install_build_dependencies_with: Option<String>,
    pub codename: Option<String>,
    /// RPM dist tag, e.g. `el9` or `fc38`.
    pub dist: Option<String>,
    /// Homebrew binary on macOS hosts.
    pub brew: Option<String>,
    /// Settings every project on this platform starts with.
    pub settings: SettingsStore,
}

impl PlatformDescriptor {
    /// Parses `<os>-<version>-<arch>` with family defaults.
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('-').collect();
        if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::UnknownPlatform(name.to_string()));
        }
        let os_name = parts[0];
        let architecture = parts[parts.len() - 1];
        let os_version = parts[1..parts.len() - 1].join("-");
        let family =
            PlatformFamily::from_os_name(os_name).ok_or_else(|| Error::UnknownPlatform(name.to_string()))?;

        let mktemp = match family {
            PlatformFamily::MacOs => macos::MKTEMP,
            _ => DEFAULT_MKTEMP,
        };

        Ok(Self {
            name: name.to_string(),
            os_name: os_name.to_string(),
            os_version,
            architecture: architecture.to_string(),
            family,
            mktemp: mktemp.to_string(),
            install_build_dependencies_with: None,
            codename: None,
            dist: None,
            brew: None,
            settings: SettingsStore::new(),
        })
    }

    /// Normalised architecture, if recognised.
    pub fn arch(&self) -> Option<Arch> {
        Arch::parse(&self.architecture)
    }

    /// Delivery directory under `output/`: `<os>/<version>[/<repo>]/<arch>`.
    pub fn output_dir(&self, target_repo: Option<&str>) -> String {
        let mut parts = vec![self.os_name.as_str(), self.os_version.as_str()];
        if let Some(repo) = target_repo.filter(|r| !r.is_empty()) {
            parts.push(repo);
        }
        parts.push(&self.architecture);
        parts.join("/")
    }

    fn apply(&mut self, file: PlatformFile) {
        if let Some(mktemp) = file.mktemp {
            self.mktemp = mktemp;
        }
        if file.install_build_dependencies_with.is_some() {
            self.install_build_dependencies_with = file.install_build_dependencies_with;
        }
        if file.codename.is_some() {
            self.codename = file.codename;
        }
        if file.dist.is_some() {
            self.dist = file.dist;
        }
        if file.brew.is_some() {
            self.brew = file.brew;
        }
        self.settings.merge(file.settings);
    }
}

/// On-disk platform description.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PlatformFile {
    name: Option<String>,
    settings: BTreeMap<String, SettingValue>,
    install_build_dependencies_with: Option<String>,
    mktemp: Option<String>,
    codename: Option<String>,
    dist: Option<String>,
    brew: Option<String>,
}

/// Inputs to a packaging plan that come from outside the project.
#[derive(Debug)]
pub struct PackageContext<'a> {
    pub toggles: BuildToggles,
    pub signer: &'a ExtraFilesSigner,
}

/// An OS family's packaging capabilities.
pub trait Platform: fmt::Debug + Send + Sync {
    fn descriptor(&self) -> &PlatformDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn family(&self) -> PlatformFamily {
        self.descriptor().family
    }

    /// Command that creates a scratch directory on hosts of this family.
    fn mktemp(&self) -> &str {
        &self.descriptor().mktemp
    }

    /// Delivery directory under `output/`.
    fn output_dir(&self, target_repo: Option<&str>) -> String {
        self.descriptor().output_dir(target_repo)
    }

    /// File name of the package this platform produces for `project`.
    fn package_name(&self, project: &Project) -> Result<String>;

    /// Package-manager invocation installing `dependencies`, or `None` when
    /// there is nothing to install.
    fn install_build_dependencies(&self, dependencies: &[String]) -> Option<String> {
        if dependencies.is_empty() {
            return None;
        }
        let installer = self
            .descriptor()
            .install_build_dependencies_with
            .as_deref()
            .unwrap_or_else(|| self.default_installer());
        Some(format!("{} {}", installer.trim_end(), dependencies.join(" ")))
    }

    /// Package manager used when the description does not name one.
    fn default_installer(&self) -> &str;

    /// The ordered packaging plan for `project`.
    fn generate_package(&self, project: &Project, context: &PackageContext<'_>) -> Result<CommandPlan>;

    /// Plan that repackages the built tarball as a platform-tagged archive.
    fn generate_compiled_archive(&self, project: &Project) -> Result<CommandPlan> {
        let version = project.require_version()?;
        let name_and_version = format!("{}-{}", project.name, version);
        let tagged = format!("{}.{}", name_and_version, self.name());
        let archive_dir = format!("{}-archive", project.name);
        let final_archive = format!("output/{tagged}.tar.gz");

        let mut plan = CommandPlan::new();
        plan.push(
            Stage::Archive,
            [
                "mkdir -p output".to_string(),
                format!("mkdir -p {archive_dir}"),
                format!("gunzip -c {name_and_version}.tar.gz | tar -C {archive_dir} -xf -"),
                format!("cd {archive_dir}/{name_and_version}; tar cf ../../{tagged}.tar *"),
                format!("gzip -9c {tagged}.tar > {tagged}.tar.gz"),
                format!("cp ext/build_metadata.json output/{tagged}.json"),
                format!("cp {tagged}.tar.gz output"),
                format!("sha1sum {final_archive} > {final_archive}.sha1"),
            ],
        );
        Ok(plan)
    }
}

/// Wraps a descriptor in its family's strategy.
pub fn from_descriptor(descriptor: PlatformDescriptor) -> Box<dyn Platform> {
    match descriptor.family {
        PlatformFamily::MacOs => Box::new(macos::MacOs::new(descriptor)),
        PlatformFamily::Debian => Box::new(linux::Debian::new(descriptor)),
        PlatformFamily::Rpm => Box::new(linux::Rpm::new(descriptor)),
        PlatformFamily::Windows => Box::new(windows::Windows::new(descriptor)),
    }
}

/// Platform `name` with family defaults only.
pub fn load_platform_named(name: &str) -> Result<Box<dyn Platform>> {
    Ok(from_descriptor(PlatformDescriptor::parse(name)?))
}

/// Loads platform `name`, refining its defaults with
/// `<platforms_dir>/<name>.toml` when that file exists.
pub async fn load_platform(name: &str, platforms_dir: &Path) -> Result<Box<dyn Platform>> {
    let mut descriptor = PlatformDescriptor::parse(name)?;
    let path = platforms_dir.join(format!("{name}.toml"));

    match read_optional(&path).await? {
        Some(content) => {
            let file: PlatformFile = toml::from_str(&content).map_err(|e| Error::InvalidDescription {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            if let Some(declared) = file.name.as_deref().filter(|n| *n != name) {
                log::warn!(
                    "Platform description {} declares name '{}', using '{}'",
                    path.display(),
                    declared,
                    name
                );
            }
            descriptor.apply(file);
            log::debug!("Loaded platform {} from {}", name, path.display());
        }
        None => {
            log::debug!("No description for platform {}, using defaults", name);
        }
    }

    Ok(from_descriptor(descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_names() {
        let d = PlatformDescriptor::parse("redhatfips-8-x86_64").unwrap();
        assert_eq!(d.family, PlatformFamily::Rpm);
        assert_eq!(d.os_version, "8");
        assert_eq!(d.arch(), Some(Arch::X86_64));

        let d = PlatformDescriptor::parse("macos-all-x86_64").unwrap();
        assert_eq!(d.family, PlatformFamily::MacOs);
        assert_eq!(d.mktemp, "mktemp -d -t 'tmp'");

        assert_eq!(PlatformDescriptor::parse("ubuntu-24.04-aarch64").unwrap().mktemp, DEFAULT_MKTEMP);
        assert!(matches!(
            PlatformDescriptor::parse("solaris-11-sparc"),
            Err(Error::UnknownPlatform(_))
        ));
        assert!(PlatformDescriptor::parse("debian").is_err());
    }

    #[test]
    fn output_dir_nests_target_repo() {
        let d = PlatformDescriptor::parse("osx-15-arm64").unwrap();
        assert_eq!(d.output_dir(None), "osx/15/arm64");
        assert_eq!(d.output_dir(Some("stable")), "osx/15/stable/arm64");
    }

    #[test]
    fn install_build_dependencies_uses_description_prefix() {
        let mut d = PlatformDescriptor::parse("fedora-38-x86_64").unwrap();
        d.install_build_dependencies_with = Some("/usr/bin/dnf install -y --best --allowerasing".into());
        let platform = from_descriptor(d);
        assert_eq!(
            platform.install_build_dependencies(&["gcc".into(), "make".into()]).as_deref(),
            Some("/usr/bin/dnf install -y --best --allowerasing gcc make")
        );
        assert_eq!(platform.install_build_dependencies(&[]), None);
    }

    #[tokio::test]
    async fn loads_description_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("debian-13-amd64.toml"),
            "codename = \"trixie\"\n[settings]\nprefix = \"/opt/x\"\n",
        )
        .await
        .unwrap();

        let platform = load_platform("debian-13-amd64", dir.path()).await.unwrap();
        assert_eq!(platform.descriptor().codename.as_deref(), Some("trixie"));
        assert_eq!(platform.descriptor().settings.get_str("prefix"), Some("/opt/x"));

        let fallback = load_platform("el-9-x86_64", dir.path()).await.unwrap();
        assert_eq!(fallback.family(), PlatformFamily::Rpm);
    }

    #[tokio::test]
    async fn rejects_unknown_description_keys() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("el-9-x86_64.toml"), "bogus = 1\n")
            .await
            .unwrap();
        let err = load_platform("el-9-x86_64", dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDescription { .. }));
    }
}
