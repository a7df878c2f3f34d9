//! End-to-end planning against the fixture config tree.

use kodegen_bundler_pipeline::bundler::{
    Bundler, Project, UpstreamLoader, load_project,
    builder::{ExtraFilesSigner, ShellRunner, SshOptions},
    platform::{Platform, load_platform},
    project::dsl::ComponentFilter,
    settings::BuildToggles,
};
use std::path::{Path, PathBuf};

fn configdir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/configs")
}

async fn load(platform: &str, filter: ComponentFilter) -> Project {
    let configdir = configdir();
    let platform = load_platform(platform, &configdir.join("platforms")).await.unwrap();
    let loader = UpstreamLoader::new();
    load_project("agent", &configdir, platform, filter, &loader).await.unwrap()
}

fn bundler(project: Project, toggles: BuildToggles) -> Bundler {
    let signer = ExtraFilesSigner::new(Box::new(ShellRunner::default()), SshOptions::default());
    Bundler::with_signer(project, toggles, signer)
}

#[tokio::test]
async fn loads_project_with_platform_settings() {
    let project = load("el-9-x86_64", ComponentFilter::All).await;

    assert_eq!(project.version.as_deref(), Some("7.1.0"));
    assert_eq!(project.vendor_name_only(), Some("Example Inc."));
    assert_eq!(project.vendor_email_only(), Some("release@example.com"));
    assert_eq!(project.components.len(), 4);

    // Platform settings seed the store; the project assigns after them.
    assert_eq!(project.settings.get_str("cflags"), Some("-O2 -fstack-protector-strong"));
    assert_eq!(project.settings.get_str("platform_tag"), Some("generic"));
    assert_eq!(project.settings.get_str("prefix"), Some("/opt/example"));
}

#[tokio::test]
async fn resolves_build_order_and_host_requirements() {
    let project = load("el-9-x86_64", ComponentFilter::All).await;

    let order: Vec<&str> = project.resolve("facter").iter().map(|c| c.name.as_str()).collect();
    assert_eq!(order, ["facter", "ruby", "openssl", "zlib"]);
    assert_eq!(
        project.install_build_dependencies().as_deref(),
        Some("dnf install -y cmake gcc perl")
    );

    let mut roots = project.root_directories();
    roots.sort();
    assert_eq!(roots, ["/etc/example", "/opt/example"]);

    let info = project.dependencies_info();
    assert_eq!(info["openssl"].source_ref.as_deref(), Some("openssl-3.0.13"));
    assert_eq!(info["zlib"].version.as_deref(), Some("1.3.1"));
}

#[tokio::test]
async fn component_filter_limits_loading() {
    let project = load("el-9-x86_64", ComponentFilter::Only(vec!["ruby".into()])).await;
    assert_eq!(project.components.len(), 1);
    let order: Vec<&str> = project.resolve("ruby").iter().map(|c| c.name.as_str()).collect();
    assert_eq!(order, ["ruby"]);
    assert_eq!(project.build_dependencies(), ["openssl", "gcc"]);
}

#[tokio::test]
async fn rpm_plan_includes_package_and_archive() {
    let project = load("el-9-x86_64", ComponentFilter::All).await;
    assert_eq!(
        project.platform().package_name(&project).unwrap(),
        "agent-7.1.0-1.x86_64.rpm"
    );

    let plan = bundler(project, BuildToggles::default()).plan().unwrap();
    let rpmbuild = plan.iter().position(|c| c.contains("rpmbuild -bb")).unwrap();
    let archive = plan
        .iter()
        .position(|c| c == "gzip -9c agent-7.1.0.el-9-x86_64.tar > agent-7.1.0.el-9-x86_64.tar.gz")
        .unwrap();
    assert!(rpmbuild < archive);
    assert_eq!(
        plan.last().unwrap(),
        "sha1sum output/agent-7.1.0.el-9-x86_64.tar.gz > output/agent-7.1.0.el-9-x86_64.tar.gz.sha1"
    );
}

#[tokio::test]
async fn debian_uses_described_codename() {
    let project = load("debian-13-amd64", ComponentFilter::All).await;
    assert_eq!(project.settings.get_str("platform_tag"), Some("generic"));
    assert_eq!(
        project.platform().package_name(&project).unwrap(),
        "agent_7.1.0-1trixie_amd64.deb"
    );
    let bundler = bundler(project, BuildToggles::default());
    assert_eq!(bundler.output_dir(), "deb/trixie");
    assert!(bundler.plan().unwrap().iter().any(|c| c.contains("debuild")));
}

#[tokio::test]
async fn macos_without_description_uses_defaults() {
    let project = load("osx-15-arm64", ComponentFilter::All).await;
    assert_eq!(project.platform().mktemp(), "mktemp -d -t 'tmp'");

    let unsigned = bundler(project, BuildToggles::default()).plan().unwrap();
    assert!(unsigned.iter().any(|c| c.contains("--identifier com.example.agent ")));
    assert!(!unsigned.iter().any(|c| c.contains("notarytool")));

    let project = load("osx-15-arm64", ComponentFilter::All).await;
    let toggles = BuildToggles {
        force_signing: true,
        skip_notarization: false,
    };
    let signed = bundler(project, toggles).plan().unwrap();
    assert!(signed.iter().any(|c| c.contains("productsign")));
    assert!(signed.iter().any(|c| c.contains("notarytool submit")));
}

#[tokio::test]
async fn published_snapshot_can_be_inherited() {
    let project = load("el-9-x86_64", ComponentFilter::All).await;
    let dir = tempfile::tempdir().unwrap();
    let written = bundler(project, BuildToggles::default())
        .publish(dir.path())
        .await
        .unwrap();

    assert!(dir.path().join("ext/build_metadata.json").exists());
    assert!(dir.path().join("ext/build_metadata.agent.el-9-x86_64.json").exists());

    let yaml = dir.path().join("agent-7.1.0.el-9-x86_64.settings.yaml");
    assert!(written.contains(&yaml));

    let uri = url::Url::from_file_path(&yaml).unwrap();
    let sha1_uri = format!("{uri}.sha1");
    let settings = UpstreamLoader::new()
        .load_yaml_settings(uri.as_str(), Some(&sha1_uri))
        .await
        .unwrap();
    assert_eq!(settings["prefix"], "/opt/example");
    assert_eq!(settings["cflags"], "-O2 -fstack-protector-strong");
}

#[tokio::test]
async fn missing_project_is_an_error() {
    let configdir = configdir();
    let platform = load_platform("el-9-x86_64", &configdir.join("platforms")).await.unwrap();
    let loader = UpstreamLoader::new();
    let result = load_project("nope", &configdir, platform, ComponentFilter::All, &loader).await;
    assert!(result.is_err());
}
