//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("JIGGLE_LOG_DIR", std::env::temp_dir().join("jiggle-tests"))
        .env_remove("RUST_LOG");
    cmd
}

/// `jiggle info --json` run in `dir`, parsed.
fn info(dir: &Path) -> serde_json::Value {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    serde_json::from_str(&stdout).expect("info --json should output valid JSON")
}

/// A temp dir that stops config discovery from reaching the real filesystem.
fn project_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    tmp
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = project_root();
    let json = info(tmp.path());

    assert!(json["config"]["config_file"].is_null());
    assert_eq!(json["config"]["scheme"], "pep440");
    assert_eq!(json["config"]["default_increment"], "patch");
    assert_eq!(json["config"]["digest_file"], ".jiggle_version.config");
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = project_root();
    fs::write(tmp.path().join(".jiggle.toml"), r#"scheme = "semver""#).unwrap();

    let json = info(tmp.path());
    assert_eq!(json["config"]["scheme"], "semver");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".jiggle.toml")
    );
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = project_root();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join("jiggle.toml"), r#"default_increment = "minor""#).unwrap();

    let json = info(&sub_dir);
    assert_eq!(json["config"]["default_increment"], "minor");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = project_root();
    fs::write(tmp.path().join(".jiggle.toml"), r#"scheme = "semver""#).unwrap();
    fs::write(tmp.path().join("jiggle.toml"), r#"scheme = "generic""#).unwrap();

    assert_eq!(info(tmp.path())["config"]["scheme"], "semver");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = project_root();
    fs::write(
        tmp.path().join(".jiggle.yaml"),
        "scheme: generic\nignore:\n  - vendor\n  - docs\n",
    )
    .unwrap();

    let json = info(tmp.path());
    assert_eq!(json["config"]["scheme"], "generic");
    assert_eq!(json["config"]["ignore"], serde_json::json!(["vendor", "docs"]));
}

#[test]
fn parses_json_config() {
    let tmp = project_root();
    fs::write(
        tmp.path().join(".jiggle.json"),
        r#"{"digest_file": "api.digest"}"#,
    )
    .unwrap();

    assert_eq!(info(tmp.path())["config"]["digest_file"], "api.digest");
}

#[test]
fn reads_pyproject_tool_table() {
    let tmp = project_root();
    fs::write(
        tmp.path().join("pyproject.toml"),
        "[project]\nversion = \"1.0.0\"\n\n[tool.jiggle_version]\nscheme = \"semver\"\ndefault_increment = \"auto\"\n",
    )
    .unwrap();

    let json = info(tmp.path());
    assert_eq!(json["config"]["scheme"], "semver");
    assert_eq!(json["config"]["default_increment"], "auto");
}

#[test]
fn project_file_beats_pyproject() {
    let tmp = project_root();
    fs::write(
        tmp.path().join("pyproject.toml"),
        "[tool.jiggle_version]\nscheme = \"semver\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join(".jiggle.toml"), r#"scheme = "generic""#).unwrap();

    assert_eq!(info(tmp.path())["config"]["scheme"], "generic");
}

#[test]
fn explicit_config_flag_wins() {
    let tmp = project_root();
    fs::write(tmp.path().join(".jiggle.toml"), r#"scheme = "generic""#).unwrap();
    let explicit = tmp.path().join("release.toml");
    fs::write(&explicit, r#"scheme = "semver""#).unwrap();

    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
            "info",
            "--json",
        ])
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["config"]["scheme"], "semver");
}

// =============================================================================
// Config drives commands
// =============================================================================

#[test]
fn configured_ignore_applies_to_commands() {
    let tmp = project_root();
    let root = tmp.path();
    fs::write(root.join("version.txt"), "1.0.0\n").unwrap();
    fs::create_dir_all(root.join("third_party")).unwrap();
    fs::write(root.join("third_party/_version.py"), "__version__ = '4.0'\n").unwrap();
    fs::write(root.join(".jiggle.toml"), "ignore = [\"third_party\"]\n").unwrap();

    cmd()
        .args(["-C", root.to_str().unwrap(), "check"])
        .assert()
        .success();
}

#[test]
fn configured_increment_is_the_default() {
    let tmp = project_root();
    let root = tmp.path();
    fs::write(root.join("version.txt"), "1.4.2\n").unwrap();
    fs::write(root.join(".jiggle.toml"), "default_increment = \"major\"\n").unwrap();

    cmd()
        .args(["-C", root.to_str().unwrap(), "bump", "--yes"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(root.join("version.txt")).unwrap(), "2.0.0\n");
}

// =============================================================================
// Invalid Config
// =============================================================================

#[test]
fn invalid_toml_syntax_fails() {
    let tmp = project_root();
    fs::write(tmp.path().join(".jiggle.toml"), "scheme = [unclosed").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn unknown_scheme_fails() {
    let tmp = project_root();
    fs::write(tmp.path().join(".jiggle.toml"), r#"scheme = "calver""#).unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn unknown_keys_are_ignored() {
    let tmp = project_root();
    fs::write(
        tmp.path().join(".jiggle.toml"),
        "scheme = \"semver\"\nfuture_option = true\n",
    )
    .unwrap();

    assert_eq!(info(tmp.path())["config"]["scheme"], "semver");
}
