//! macOS installer packages delivered in a disk image.
//!
//! The plan stages the built tree, runs `pkgbuild` and `productbuild`, wraps the
//! installer in a disk image and ships it to `output/`. With forced signing it
//! also signs every binary, the installer and the image, then notarizes the
//! image unless notarization is switched off.
//!
//! Signing stages expect these variables on the build host:
//!
//! - `SIGNING_KEYCHAIN` / `SIGNING_KEYCHAIN_PW`: keychain holding the identities
//! - `APPLICATION_SIGNING_CERT`: identity for code signing
//! - `INSTALLER_SIGNING_CERT`: identity for `productsign`
//! - `NOTARY_PROFILE`: keychain profile for `notarytool`

mod binaries;

pub use binaries::{binary_signing_table, sign_binaries_commands};

use super::{PackageContext, Platform, PlatformDescriptor};
use crate::bundler::{
    Context, Result,
    builder::{CommandPlan, Stage},
    project::Project,
};

/// macOS `mktemp` takes a template prefix instead of a parent directory.
pub const MKTEMP: &str = "mktemp -d -t 'tmp'";

const BUILD_DIR: &str = "$(tempdir)/macos/build";
const UNLOCK_KEYCHAIN: &str = "security unlock-keychain -p $$SIGNING_KEYCHAIN_PW $$SIGNING_KEYCHAIN";

#[derive(Debug)]
pub struct MacOs {
    descriptor: PlatformDescriptor,
    tar: String,
    pkgbuild: String,
    productbuild: String,
    hdiutil: String,
    brew: String,
}

impl MacOs {
    pub fn new(descriptor: PlatformDescriptor) -> Self {
        let brew = descriptor
            .brew
            .clone()
            .unwrap_or_else(|| "/usr/local/bin/brew".to_string());
        Self {
            descriptor,
            tar: "tar".into(),
            pkgbuild: "/usr/bin/pkgbuild".into(),
            productbuild: "/usr/bin/productbuild".into(),
            hdiutil: "/usr/bin/hdiutil".into(),
            brew,
        }
    }
}

impl Platform for MacOs {
    fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    fn default_installer(&self) -> &str {
        &self.brew
    }

    fn install_build_dependencies(&self, dependencies: &[String]) -> Option<String> {
        // Homebrew refuses to run as root, so there is no configurable prefix.
        if dependencies.is_empty() {
            return None;
        }
        Some(format!("{} install {}", self.brew, dependencies.join(" ")))
    }

    fn package_name(&self, project: &Project) -> Result<String> {
        Ok(format!(
            "{}-{}-{}.{}.{}.{}.dmg",
            project.name,
            project.require_version()?,
            project.release,
            self.descriptor.os_name,
            self.descriptor.os_version,
            self.descriptor.architecture
        ))
    }

    fn generate_package(&self, project: &Project, context: &PackageContext<'_>) -> Result<CommandPlan> {
        let name = &project.name;
        let version = project.require_version()?;
        let release = &project.release;
        let identifier = project
            .identifier
            .as_deref()
            .context("macOS packages need a project identifier")?;
        let package_name = self.package_name(project)?;
        let staged_root = format!("root/{name}-{version}");
        let installer = format!("{name}-{version}-{release}-installer.pkg");
        let dmg = format!("{BUILD_DIR}/dmg/{package_name}");
        let target_dir = self.output_dir(project.target_repo.as_deref());
        let force_signing = context.toggles.force_signing;

        let mut plan = CommandPlan::new();

        plan.push(
            Stage::WorkspaceSetup,
            [
                format!("bash -c 'mkdir -p {BUILD_DIR}/{{dmg,pkg,scripts,resources,root,payload,plugins}}'"),
                format!("mkdir -p {BUILD_DIR}/{staged_root}"),
                format!("mkdir -p {BUILD_DIR}/pkg"),
            ],
        );

        plan.push(
            Stage::Staging,
            [
                format!("cp {name}-installer.xml {BUILD_DIR}/"),
                format!("cp {name}-uninstaller.tool {BUILD_DIR}/pkg/"),
                format!("cp scripts/* {BUILD_DIR}/scripts/"),
                format!(
                    "if [ -d resources/macos/productbuild ] ; then cp -r resources/macos/productbuild/* {BUILD_DIR}/; fi"
                ),
            ],
        );

        plan.push(
            Stage::Unpack,
            [format!(
                "gunzip -c {name}-{version}.tar.gz | '{}' -C '{BUILD_DIR}/{staged_root}' --strip-components 1 -xf -",
                self.tar
            )],
        );

        // Older projects relied on the bill of materials being moved into a
        // docdir for them.
        if project.bill_of_materials.is_none() {
            let doc_dir = format!("{BUILD_DIR}/{staged_root}/usr/local/share/doc/{name}");
            plan.push(
                Stage::BillOfMaterials,
                [
                    format!("mkdir -p {doc_dir}"),
                    format!("mv {BUILD_DIR}/{staged_root}/bill-of-materials {doc_dir}/bill-of-materials"),
                ],
            );
        }

        if force_signing {
            plan.push(
                Stage::ExtraFileSigning,
                context.signer.commands(
                    project,
                    true,
                    self.mktemp(),
                    &format!("/macos/build/{staged_root}"),
                )?,
            );
            plan.push(
                Stage::BinarySigning,
                sign_binaries_commands(&binary_signing_table(project, version), BUILD_DIR, UNLOCK_KEYCHAIN),
            );
        }

        plan.push(
            Stage::PackageBuild,
            [format!(
                "(cd {BUILD_DIR}/; {} --root {staged_root} --scripts {BUILD_DIR}/scripts --identifier {identifier}.{name} --version {version} --preserve-xattr --install-location / payload/{name}-{version}-{release}.pkg)",
                self.pkgbuild
            )],
        );

        plan.push(
            Stage::InstallerBuild,
            [format!(
                "(cd {BUILD_DIR}/; {} --distribution {name}-installer.xml --identifier {identifier}.{name}-installer --package-path payload/ --resources {BUILD_DIR}/resources --plugins {BUILD_DIR}/plugins {installer})",
                self.productbuild
            )],
        );

        if force_signing {
            plan.push(
                Stage::InstallerSigning,
                [
                    UNLOCK_KEYCHAIN.to_string(),
                    format!(
                        "productsign --keychain $$SIGNING_KEYCHAIN --sign \"$$INSTALLER_SIGNING_CERT\" {BUILD_DIR}/{installer} {BUILD_DIR}/pkg/{installer}"
                    ),
                    format!("rm {BUILD_DIR}/{installer}"),
                ],
            );
        } else {
            plan.push(
                Stage::InstallerRelocation,
                [format!("mv {BUILD_DIR}/{installer} {BUILD_DIR}/pkg/")],
            );
        }

        plan.push(
            Stage::DiskImage,
            [format!(
                "(cd {BUILD_DIR}; {} create -volname {name}-{version} -fs JHFS+ -format UDBZ -srcfolder pkg dmg/{package_name})",
                self.hdiutil
            )],
        );

        if force_signing {
            plan.push(
                Stage::DiskImageSigning,
                [
                    UNLOCK_KEYCHAIN.to_string(),
                    format!("cd {BUILD_DIR}"),
                    format!(
                        "codesign --timestamp --keychain $$SIGNING_KEYCHAIN --sign \"$$APPLICATION_SIGNING_CERT\" {dmg}"
                    ),
                    format!("codesign --verify --strict --verbose=2 {dmg}"),
                ],
            );
        }

        if context.toggles.notarize() {
            plan.push(
                Stage::Notarization,
                [
                    UNLOCK_KEYCHAIN.to_string(),
                    format!("xcrun notarytool submit {dmg} --keychain-profile \"$$NOTARY_PROFILE\" --wait"),
                    format!("xcrun stapler staple {dmg}"),
                    format!("spctl --assess --type install --verbose {dmg}"),
                ],
            );
        }

        plan.push(
            Stage::Delivery,
            [
                format!("mkdir -p output/{target_dir}"),
                format!("cp {dmg} ./output/{target_dir}"),
            ],
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        builder::{CommandRunner, ExtraFilesSigner, SshOptions},
        platform::load_platform_named,
        settings::BuildToggles,
    };

    struct Unreachable;

    impl CommandRunner for Unreachable {
        fn capture(&self, _command: &str) -> Result<String> {
            Err(crate::bundler::Error::GenericError("no route to host".into()))
        }
    }

    fn project() -> Project {
        let mut project = Project::new("agent", load_platform_named("osx-15-arm64").unwrap());
        project.version = Some("8.1.0".into());
        project.identifier = Some("com.example".into());
        project
    }

    fn plan(project: &Project, toggles: BuildToggles) -> CommandPlan {
        let signer = ExtraFilesSigner::new(Box::new(Unreachable), SshOptions::default());
        let context = PackageContext {
            toggles,
            signer: &signer,
        };
        project.platform().generate_package(project, &context).unwrap()
    }

    #[test]
    fn package_name_includes_platform() {
        let project = project();
        assert_eq!(
            project.platform().package_name(&project).unwrap(),
            "agent-8.1.0-1.osx.15.arm64.dmg"
        );
    }

    #[test]
    fn unsigned_plan_relocates_installer() {
        let plan = plan(&project(), BuildToggles::default());

        for stage in [
            Stage::BinarySigning,
            Stage::ExtraFileSigning,
            Stage::InstallerSigning,
            Stage::DiskImageSigning,
            Stage::Notarization,
        ] {
            assert!(!plan.runs(stage), "{stage} should not run");
        }
        assert!(plan.runs(Stage::InstallerRelocation));
        assert!(plan.runs(Stage::BillOfMaterials));

        let commands = plan.commands();
        assert!(!commands.iter().any(|c| c.contains("notarytool") || c.contains("codesign")));
        assert_eq!(
            commands.last().unwrap(),
            "cp $(tempdir)/macos/build/dmg/agent-8.1.0-1.osx.15.arm64.dmg ./output/osx/15/arm64"
        );
    }

    #[test]
    fn forced_signing_signs_and_notarizes() {
        let plan = plan(
            &project(),
            BuildToggles {
                force_signing: true,
                skip_notarization: false,
            },
        );
        assert!(plan.runs(Stage::BinarySigning));
        assert!(plan.runs(Stage::InstallerSigning));
        assert!(!plan.runs(Stage::InstallerRelocation));
        assert!(plan.runs(Stage::DiskImageSigning));
        assert_eq!(
            plan.stage_commands(Stage::Notarization)[1],
            "xcrun notarytool submit $(tempdir)/macos/build/dmg/agent-8.1.0-1.osx.15.arm64.dmg --keychain-profile \"$$NOTARY_PROFILE\" --wait"
        );
        // No extra files declared, so the signer contributes nothing.
        assert!(!plan.runs(Stage::ExtraFileSigning));
    }

    #[test]
    fn skip_notarization_keeps_signing() {
        let plan = plan(
            &project(),
            BuildToggles {
                force_signing: true,
                skip_notarization: true,
            },
        );
        assert!(plan.runs(Stage::DiskImageSigning));
        assert!(!plan.runs(Stage::Notarization));
    }

    #[test]
    fn explicit_bill_of_materials_disables_shim_and_repo_nests_output() {
        let mut project = project();
        project.bill_of_materials = Some("/usr/local/share/doc/agent".into());
        project.target_repo = Some("agent8".into());
        let plan = plan(&project, BuildToggles::default());
        assert!(!plan.runs(Stage::BillOfMaterials));
        assert_eq!(
            plan.stage_commands(Stage::Delivery)[0],
            "mkdir -p output/osx/15/agent8/arm64"
        );
    }

    #[test]
    fn forced_signing_fails_when_signing_host_is_down() {
        let mut project = project();
        project.signing.hostname = Some("signer".into());
        project.signing.extra_files = vec!["/opt/agent/bin/tool".into()];
        let signer = ExtraFilesSigner::new(Box::new(Unreachable), SshOptions::default());
        let context = PackageContext {
            toggles: BuildToggles {
                force_signing: true,
                skip_notarization: false,
            },
            signer: &signer,
        };
        assert!(project.platform().generate_package(&project, &context).is_err());
    }
}
