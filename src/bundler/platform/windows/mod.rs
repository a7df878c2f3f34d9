//! Windows MSI packages built with the WiX toolset.
//!
//! The plan harvests the unpacked tree with `heat`, compiles the project's
//! `.wxs` sources with `candle` and links the MSI with `light`. Extra files
//! are signed before harvesting; an unreachable signing host only skips that
//! step unless signing is forced.

use crate::bundler::{
    Result,
    builder::{CommandPlan, Stage},
    platform::{PackageContext, Platform, PlatformDescriptor},
    project::Project,
};

const WIX_BIN: &str = "C:/Program Files (x86)/WiX Toolset v3.11/bin";
const WIX_EXTENSIONS: &str = "-ext WiXUtilExtension -ext WixUIExtension";

#[derive(Debug)]
pub struct Windows {
    descriptor: PlatformDescriptor,
}

impl Windows {
    pub fn new(descriptor: PlatformDescriptor) -> Self {
        Self { descriptor }
    }

    fn wix_arch(&self) -> &'static str {
        self.descriptor.arch().map(|a| a.wix_arch()).unwrap_or("x64")
    }
}

impl Platform for Windows {
    fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    fn default_installer(&self) -> &str {
        "C:/ProgramData/chocolatey/bin/choco.exe install -y"
    }

    /// `windows[/<repo>]/<arch>`
    fn output_dir(&self, target_repo: Option<&str>) -> String {
        match target_repo.filter(|r| !r.is_empty()) {
            Some(repo) => format!("windows/{repo}/{}", self.descriptor.architecture),
            None => format!("windows/{}", self.descriptor.architecture),
        }
    }

    fn package_name(&self, project: &Project) -> Result<String> {
        Ok(format!(
            "{}-{}-{}.msi",
            project.name,
            project.require_version()?,
            self.descriptor.architecture
        ))
    }

    fn generate_package(&self, project: &Project, context: &PackageContext<'_>) -> Result<CommandPlan> {
        let name = &project.name;
        let version = project.require_version()?;
        let target_dir = self.output_dir(project.target_repo.as_deref());
        let msi = self.package_name(project)?;
        let arch = self.wix_arch();

        let mut plan = CommandPlan::new();
        plan.push(
            Stage::WorkspaceSetup,
            [
                format!("mkdir -p output/{target_dir}"),
                "mkdir -p $(tempdir)/{SourceDir,wix/wixobj}".to_string(),
            ],
        );
        plan.push(Stage::Staging, ["cp -r wix/* $(tempdir)/wix/"]);
        plan.push(
            Stage::Unpack,
            [format!(
                "gunzip -c {name}-{version}.tar.gz | 'tar' -C '$(tempdir)/SourceDir' --strip-components 1 -xf -"
            )],
        );
        plan.push(
            Stage::ExtraFileSigning,
            context.signer.commands(
                project,
                context.toggles.force_signing,
                self.mktemp(),
                "/SourceDir",
            )?,
        );
        plan.push(
            Stage::PackageBuild,
            [
                format!(
                    "cd $(tempdir); \"{WIX_BIN}/heat.exe\" dir SourceDir -v -ke -indent 2 -cg ProductComponentGroup -gg -dr INSTALLDIR -t wix/filter.xslt -sreg -var var.AppSourcePath -out wix/wixobj/{name}-harvest-app.wxs"
                ),
                format!(
                    "cd $(tempdir); \"{WIX_BIN}/candle.exe\" wix/*.wxs wix/wixobj/*.wxs -out wix/wixobj/ {WIX_EXTENSIONS} -arch {arch} -dPlatform={arch} -dProjectDir=$(tempdir)/wix -dAppSourcePath=$(tempdir)/SourceDir"
                ),
            ],
        );
        plan.push(
            Stage::InstallerBuild,
            [format!(
                "cd $(tempdir); \"{WIX_BIN}/light.exe\" -b SourceDir {WIX_EXTENSIONS} -cultures:en-us -loc wix/localization/{name}_en-us.wxl -out $(tempdir)/{msi} wix/wixobj/*.wixobj"
            )],
        );
        plan.push(
            Stage::Delivery,
            [format!("cp $(tempdir)/{msi} ./output/{target_dir}")],
        );
        Ok(plan)
    }
}
