//! Debian package (.deb) plans.

use crate::bundler::{
    Context, Result,
    builder::{CommandPlan, Stage},
    platform::{PackageContext, Platform, PlatformDescriptor},
    project::Project,
};

/// Debian and Ubuntu.
#[derive(Debug)]
pub struct Debian {
    descriptor: PlatformDescriptor,
}

impl Debian {
    pub fn new(descriptor: PlatformDescriptor) -> Self {
        Self { descriptor }
    }

    fn codename(&self) -> Result<&str> {
        self.descriptor
            .codename
            .as_deref()
            .with_context(|| format!("platform {} needs a codename", self.descriptor.name))
    }

    /// debuild's `-a` flag. armv7hl is spelled armhf on Debian.
    fn arch_flag(&self, project: &Project) -> String {
        if project.noarch {
            return String::new();
        }
        match self.descriptor.architecture.as_str() {
            "armv7hl" => "-aarmhf".to_string(),
            arch => format!("-a{arch}"),
        }
    }
}

impl Platform for Debian {
    fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    fn default_installer(&self) -> &str {
        "DEBIAN_FRONTEND=noninteractive apt-get install -qy --no-install-recommends"
    }

    /// `deb/<codename>[/<repo>]`
    fn output_dir(&self, target_repo: Option<&str>) -> String {
        let codename = self.descriptor.codename.as_deref().unwrap_or(&self.descriptor.os_version);
        match target_repo.filter(|r| !r.is_empty()) {
            Some(repo) => format!("deb/{codename}/{repo}"),
            None => format!("deb/{codename}"),
        }
    }

    fn package_name(&self, project: &Project) -> Result<String> {
        let arch = if project.noarch {
            "all"
        } else {
            self.descriptor.architecture.as_str()
        };
        Ok(format!(
            "{}_{}-{}{}_{}.deb",
            project.name,
            project.require_version()?,
            project.release,
            self.codename()?,
            arch
        ))
    }

    fn generate_package(&self, project: &Project, _context: &PackageContext<'_>) -> Result<CommandPlan> {
        let name = &project.name;
        let version = project.require_version()?;
        let build_dir = format!("$(tempdir)/{name}-{version}");
        let target_dir = self.output_dir(project.target_repo.as_deref());
        let copy_extensions = if project.generate_source_artifacts {
            "*.{deb,build,changes,debian.tar.gz,orig.tar.gz,dsc}"
        } else {
            "*.{deb,build,changes}"
        };

        let mut plan = CommandPlan::new();
        plan.push(
            Stage::WorkspaceSetup,
            [format!("mkdir -p output/{target_dir}"), format!("mkdir -p {build_dir}")],
        );
        plan.push(
            Stage::Staging,
            [
                format!("cp {name}-{version}.tar.gz $(tempdir)/{name}_{version}.orig.tar.gz"),
                "cat file-list >> debian/install".to_string(),
                format!("cp -pr debian {build_dir}"),
            ],
        );
        plan.push(
            Stage::Unpack,
            [
                format!("gunzip -c {name}-{version}.tar.gz | 'tar' -C '{build_dir}' --strip-components 1 -xf -"),
                // dh_install cannot cope with spaces in paths.
                format!("sed -i 's/ /?/g' {build_dir}/debian/install"),
            ],
        );
        plan.push(
            Stage::PackageBuild,
            [format!(
                "(cd {build_dir}; debuild --no-lintian {} -uc -us)",
                self.arch_flag(project)
            )],
        );
        plan.push(
            Stage::Delivery,
            [format!("cp $(tempdir)/{copy_extensions} ./output/{target_dir}")],
        );
        Ok(plan)
    }
}
