//! Command line behaviour of the pipeline binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn configdir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/configs")
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_pipeline").unwrap();
    cmd.env_remove("KODEGEN_FORCE_SIGNING")
        .env_remove("KODEGEN_NO_NOTARIZE")
        .env_remove("KODEGEN_PLATFORM")
        .arg("--configdir")
        .arg(configdir());
    cmd
}

#[test]
fn plan_prints_commands() {
    cmd()
        .args(["plan", "--project", "agent", "--platform", "el-9-x86_64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rpmbuild -bb --target x86_64"))
        .stdout(predicate::str::contains("gzip -9c agent-7.1.0.el-9-x86_64.tar"));
}

#[test]
fn forced_signing_adds_notarization() {
    cmd()
        .args(["plan", "-p", "agent", "-P", "osx-15-arm64", "--force-signing", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["))
        .stdout(predicate::str::contains("xcrun notarytool submit"));
}

#[test]
fn resolve_prints_build_order() {
    cmd()
        .args(["resolve", "-p", "agent", "-P", "el-9-x86_64", "--component", "ruby"])
        .assert()
        .success()
        .stdout("ruby 3.2.5\nopenssl 3.0.13\nzlib 1.3.1\n");

    cmd()
        .args(["resolve", "-p", "agent", "-P", "el-9-x86_64", "--build-dependencies"])
        .assert()
        .success()
        .stdout("dnf install -y cmake gcc perl\n");
}

#[test]
fn unknown_component_is_a_usage_error() {
    cmd()
        .args(["resolve", "-p", "agent", "-P", "el-9-x86_64", "--component", "python"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no component 'python'"));
}

#[test]
fn unknown_platform_is_rejected() {
    cmd()
        .args(["plan", "-p", "agent", "-P", "beos-5-x86"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("beos-5-x86"));
}

#[test]
fn publish_writes_into_output_dir() {
    let out = tempfile::tempdir().unwrap();
    cmd()
        .args(["publish", "-p", "agent", "-P", "el-9-x86_64", "--output"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("agent-7.1.0.el-9-x86_64.settings.yaml.sha1"));
    assert!(out.path().join("ext/build_metadata.json").exists());
}
