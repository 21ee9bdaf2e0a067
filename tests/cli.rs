//! End-to-end tests of the pbxgraft binary against a Cordova project layout

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = include_str!("../crates/ir/tests/fixtures/HelloCordova.pbxproj");

/// Get a Command for the pbxgraft binary
#[allow(deprecated)]
fn pbxgraft() -> Command {
    let mut cmd = Command::cargo_bin("pbxgraft").expect("Failed to find pbxgraft binary");
    cmd.env_remove("PBXGRAFT_PROJECT_ROOT").env_remove("RUST_LOG");
    cmd
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn cordova_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let ios = dir.path().join("platforms/ios");
    write(&ios.join("HelloCordova.xcodeproj/project.pbxproj"), FIXTURE);
    write(
        &ios.join("HelloCordova/HelloCordova-Info.plist"),
        "<dict><key>CFBundleIdentifier</key><string>io.cordova.hello</string></dict>",
    );
    write(
        &dir.path().join("config.xml"),
        r#"<widget><preference name="IOS_URL_SCHEME" value="hellocordova" /></widget>"#,
    );

    let template = dir
        .path()
        .join("plugins/cc.fovea.cordova.openwith/src/ios/ShareExtension");
    write(&template.join("ShareViewController.h"), "@interface ShareViewController\n@end\n");
    write(&template.join("ShareViewController.m"), "// __URL_SCHEME__\n");
    write(
        &template.join("ShareExtension-Info.plist"),
        "<string>__BUNDLE_IDENTIFIER__</string>\n",
    );
    write(&template.join("ShareExtension.entitlements"), "<array/>\n");
    write(&template.join("MainInterface.storyboard"), "<document/>\n");
    dir
}

fn project_file(dir: &TempDir) -> PathBuf {
    dir.path()
        .join("platforms/ios/HelloCordova.xcodeproj/project.pbxproj")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    pbxgraft()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_version_flag() {
    pbxgraft()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pbxgraft"));
}

#[test]
fn test_global_options_in_help() {
    pbxgraft()
        .args(["add", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--project-root"))
        .stdout(predicate::str::contains("--ios-dir"))
        .stdout(predicate::str::contains("--parent-group"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--product-type"));
}

#[test]
fn test_unknown_command_fails() {
    pbxgraft().arg("graft").assert().failure();
}

// ============================================================================
// Hook Tests
// ============================================================================

#[test]
fn test_missing_project_fails() {
    let dir = TempDir::new().unwrap();
    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .arg("add")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find an .xcodeproj folder"));
}

#[test]
fn test_copy_add_remove() {
    let dir = cordova_project();
    let project = project_file(&dir);

    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .arg("copy")
        .assert()
        .success();
    let staged = dir.path().join("platforms/ios/ShareExtension");
    assert!(staged.join("ShareViewController.m").is_file());

    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .args(["add", "IOS_GROUP_IDENTIFIER=group.io.cordova.hello"])
        .assert()
        .success();
    let added = std::fs::read_to_string(&project).unwrap();
    assert!(added.contains("/* ShareExtension.appex */"));
    assert!(added.contains("PRODUCT_BUNDLE_IDENTIFIER = io.cordova.hello.shareextension;"));
    assert!(added.contains("CODE_SIGN_ENTITLEMENTS = ShareExtension/ShareExtension.entitlements;"));

    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .arg("remove")
        .assert()
        .success();
    let removed = std::fs::read_to_string(&project).unwrap();
    assert!(!removed.contains("ShareExtension"));
    assert!(removed.contains("/* HelloCordova.app */"));
    assert!(removed.contains("/* Embed App Extensions */"));
}

#[test]
fn test_add_with_backup() {
    let dir = cordova_project();
    let project = project_file(&dir);

    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .arg("copy")
        .assert()
        .success();
    pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .args(["--backup", "add"])
        .assert()
        .success();

    let backup = std::fs::read_to_string(project.with_file_name("project.pbxproj.backup")).unwrap();
    assert_eq!(backup, FIXTURE);
}

#[test]
fn test_inspect_json() {
    let dir = cordova_project();
    let output = pbxgraft()
        .arg("--project-root")
        .arg(dir.path())
        .args(["--quiet", "inspect", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["name"], "HelloCordova");
    assert_eq!(summary["targets"][0]["name"], "HelloCordova");
    assert_eq!(summary["groups"]["name"], "CustomTemplate");
}

#[test]
fn test_ios_dir_flag() {
    let dir = cordova_project();
    pbxgraft()
        .arg("--ios-dir")
        .arg(dir.path().join("platforms/ios"))
        .arg("inspect")
        .assert()
        .success()
        .stdout(predicate::str::contains("HelloCordova.xcodeproj"));
}
