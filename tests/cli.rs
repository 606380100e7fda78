use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

const CONFIG: &str = r#"
binaries:
  linux-x64: bin/demo
  win-x64: bin/demo.exe
pack:
  dir: dist
npm:
  packageJson:
    name: "@scope/demo"
    version: "${DEMO_VERSION}"
    description: demo cli
  binaryPackages:
    linux-x64: { os: linux, arch: x64 }
    win-x64: { os: win32, arch: x64 }
  binNames: [demo]
pypi:
  metadata:
    Name: demo
    Version: "1.0.0"
  platformTags:
    linux-x64: manylinux_2_17_x86_64
github:
  owner: me
  repo: demo
  token: t
  archives:
    prefix: demo-
    formats:
      linux-x64: tar.gz
      win-x64: zip
  files:
    - install.sh
"#;

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

fn create_project(root: &Path, config: &str) {
    write_file(&root.join("bin/demo"), b"\x7fELF");
    write_file(&root.join("bin/demo.exe"), b"MZ");
    write_file(&root.join("install.sh"), b"#!/bin/sh\n");
    write_file(&root.join("bin-upload.config.yaml"), config.as_bytes());
}

fn bin_upload(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bin-upload").expect("binary");
    cmd.current_dir(root)
        .env("DEMO_VERSION", "1.0.0")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn pack_builds_every_artifact() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .arg("pack")
        .assert()
        .success()
        .stderr(contains("Created"));

    let dist = td.path().join("dist");
    for artifact in [
        "npm/scope-demo-1.0.0.tgz",
        "npm/scope-demo-linux-x64-1.0.0.tgz",
        "npm/scope-demo-win-x64-1.0.0.tgz",
        "pypi/demo-1.0.0-py3-none-manylinux_2_17_x86_64.whl",
        "github/demo-linux-x64.tar.gz",
        "github/demo-win-x64.zip",
        "github/install.sh",
    ] {
        assert!(dist.join(artifact).is_file(), "missing {artifact}");
    }
}

#[test]
fn set_override_wins_over_file() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .args(["pack", "--source", "npm", "-s", "npm.packageJson.version=2.0.0"])
        .assert()
        .success();

    let npm = td.path().join("dist/npm");
    assert!(npm.join("scope-demo-2.0.0.tgz").is_file());
    assert!(!npm.join("scope-demo-1.0.0.tgz").exists());
}

#[test]
fn source_selects_one_family() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .args(["pack", "--source", "github"])
        .assert()
        .success();

    let dist = td.path().join("dist");
    assert!(dist.join("github/demo-linux-x64.tar.gz").is_file());
    assert!(!dist.join("npm").exists());
    assert!(!dist.join("pypi").exists());
}

#[test]
fn custom_config_path() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);
    fs::rename(
        td.path().join("bin-upload.config.yaml"),
        td.path().join("release.yml"),
    )
    .expect("rename");

    bin_upload(td.path())
        .args(["pack", "--config", "release.yml", "--source", "pypi"])
        .assert()
        .success();

    assert!(
        td.path()
            .join("dist/pypi/demo-1.0.0-py3-none-manylinux_2_17_x86_64.whl")
            .is_file()
    );
}

#[test]
fn missing_config_fails() {
    let td = tempdir().expect("tempdir");

    bin_upload(td.path())
        .arg("pack")
        .assert()
        .failure()
        .stderr(contains("Configuration file not found"));
}

#[test]
fn non_yaml_config_fails() {
    let td = tempdir().expect("tempdir");
    write_file(&td.path().join("config.json"), b"{}");

    bin_upload(td.path())
        .args(["pack", "-c", "config.json"])
        .assert()
        .failure()
        .stderr(contains(".yaml or .yml"));
}

#[test]
fn undefined_env_var_fails_before_packing() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .env_remove("DEMO_VERSION")
        .arg("pack")
        .assert()
        .failure()
        .stderr(contains("Environment variable DEMO_VERSION is not defined."));

    assert!(!td.path().join("dist").exists());
}

#[test]
fn invalid_config_names_the_field() {
    let td = tempdir().expect("tempdir");
    create_project(
        td.path(),
        &CONFIG.replace("arch: x64 }\n  binNames", "arch: sparc }\n  binNames"),
    );

    bin_upload(td.path())
        .arg("pack")
        .assert()
        .failure()
        .stderr(contains("npm.binaryPackages.win-x64"));
}

#[test]
fn missing_binary_fails_without_packing() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);
    fs::remove_file(td.path().join("bin/demo.exe")).expect("remove");

    bin_upload(td.path())
        .arg("pack")
        .assert()
        .code(1)
        .stderr(contains("Some binaries are missing").and(contains("win-x64")));

    assert!(!td.path().join("dist").exists());
}

#[test]
fn clear_dir_removes_stale_artifacts() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), &CONFIG.replace("  dir: dist", "  dir: dist\n  clearDir: true"));
    write_file(&td.path().join("dist/github/stale.zip"), b"old");
    write_file(&td.path().join("dist/keep.txt"), b"kept");

    bin_upload(td.path())
        .args(["pack", "--source", "github"])
        .assert()
        .success();

    assert!(!td.path().join("dist/github/stale.zip").exists());
    assert!(td.path().join("dist/github/demo-linux-x64.tar.gz").is_file());
    assert!(td.path().join("dist/keep.txt").is_file());
}

#[cfg(unix)]
#[test]
fn failing_pre_pack_command_aborts_with_its_code() {
    let td = tempdir().expect("tempdir");
    create_project(
        td.path(),
        &CONFIG.replace("  dir: dist", "  dir: dist\n  prePackCommand: exit 3"),
    );

    bin_upload(td.path()).arg("pack").assert().code(3);
    assert!(!td.path().join("dist").exists());
}

#[cfg(unix)]
#[test]
fn pre_pack_command_runs_before_binary_check() {
    let td = tempdir().expect("tempdir");
    create_project(
        td.path(),
        &CONFIG.replace(
            "  dir: dist",
            "  dir: dist\n  prePackCommand: cp bin/demo bin/demo.exe",
        ),
    );
    fs::remove_file(td.path().join("bin/demo.exe")).expect("remove");

    bin_upload(td.path())
        .args(["pack", "--source", "github"])
        .assert()
        .success();
    assert!(td.path().join("dist/github/demo-win-x64.zip").is_file());
}

#[test]
fn verbose_prints_resolved_config() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .args(["pack", "--source", "pypi", "--verbose"])
        .assert()
        .success()
        .stdout(contains("Resolved configuration").and(contains("1.0.0")));
}

#[test]
fn publish_requires_packed_artifacts() {
    let td = tempdir().expect("tempdir");
    create_project(td.path(), CONFIG);

    bin_upload(td.path())
        .args(["publish", "--source", "npm"])
        .assert()
        .code(1)
        .stderr(contains("bin-upload pack"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    let td = tempdir().expect("tempdir");

    bin_upload(td.path()).arg("init").assert().failure();
}
