//! RPM package (.rpm) plans.

use crate::bundler::{
    Result,
    builder::{CommandPlan, Stage},
    platform::{PackageContext, Platform, PlatformDescriptor},
    project::Project,
};

/// Enterprise Linux, Fedora, SLES and Amazon Linux.
#[derive(Debug)]
pub struct Rpm {
    descriptor: PlatformDescriptor,
}

impl Rpm {
    pub fn new(descriptor: PlatformDescriptor) -> Self {
        Self { descriptor }
    }

    /// `dist` tag, defaulting to `<os><version>` (`el9`, `sles15`).
    pub fn dist(&self) -> String {
        self.descriptor.dist.clone().unwrap_or_else(|| {
            format!("{}{}", self.descriptor.os_name, self.descriptor.os_version)
        })
    }

    fn rpm_defines(&self) -> String {
        format!("--define '_topdir $(tempdir)/rpmbuild' --define 'dist .{}'", self.dist())
    }

    fn source_output_dir(&self, target_repo: Option<&str>) -> String {
        let mut parts = vec![self.descriptor.os_name.as_str(), self.descriptor.os_version.as_str()];
        if let Some(repo) = target_repo.filter(|r| !r.is_empty()) {
            parts.push(repo);
        }
        parts.push("SRPMS");
        parts.join("/")
    }
}

impl Platform for Rpm {
    fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    fn default_installer(&self) -> &str {
        match self.descriptor.os_name.as_str() {
            "sles" => "zypper -n --no-gpg-checks install -y",
            "fedora" => "/usr/bin/dnf install -y --best --allowerasing",
            _ => "yum install --assumeyes",
        }
    }

    fn package_name(&self, project: &Project) -> Result<String> {
        let arch = if project.noarch {
            "noarch"
        } else {
            self.descriptor.architecture.as_str()
        };
        Ok(format!(
            "{}-{}-{}.{}.rpm",
            project.name,
            project.require_version()?,
            project.release,
            arch
        ))
    }

    fn generate_package(&self, project: &Project, _context: &PackageContext<'_>) -> Result<CommandPlan> {
        let name = &project.name;
        let version = project.require_version()?;
        let repo = project.target_repo.as_deref();
        let target_dir = self.output_dir(repo);
        let arch = if project.noarch {
            "noarch"
        } else {
            self.descriptor.architecture.as_str()
        };

        let (rpmbuild, artifact_copy) = if project.generate_source_artifacts {
            let source_dir = self.source_output_dir(repo);
            (
                "rpmbuild -ba",
                vec![
                    format!("mkdir -p output/{source_dir}"),
                    format!("cp $(tempdir)/rpmbuild/RPMS/**/*.rpm ./output/{target_dir}"),
                    format!("cp $(tempdir)/rpmbuild/SRPMS/*.rpm ./output/{source_dir}"),
                ],
            )
        } else {
            (
                "rpmbuild -bb",
                vec![format!("cp $(tempdir)/rpmbuild/*RPMS/**/*.rpm ./output/{target_dir}")],
            )
        };

        let mut plan = CommandPlan::new();
        plan.push(
            Stage::WorkspaceSetup,
            ["bash -c 'mkdir -p $(tempdir)/rpmbuild/{SOURCES,SPECS,BUILD,RPMS,SRPMS}'"],
        );
        plan.push(
            Stage::Staging,
            [
                format!("cp {name}-{version}.tar.gz $(tempdir)/rpmbuild/SOURCES"),
                "cp file-list-for-rpm $(tempdir)/rpmbuild/SOURCES".to_string(),
                format!("cp {name}.spec $(tempdir)/rpmbuild/SPECS"),
            ],
        );
        plan.push(
            Stage::PackageBuild,
            [format!(
                "PATH=/opt/freeware/bin:$$PATH {rpmbuild} --target {arch} {} $(tempdir)/rpmbuild/SPECS/{name}.spec",
                self.rpm_defines()
            )],
        );
        let mut delivery = vec![format!("mkdir -p output/{target_dir}")];
        delivery.extend(artifact_copy);
        plan.push(Stage::Delivery, delivery);
        Ok(plan)
    }
}
