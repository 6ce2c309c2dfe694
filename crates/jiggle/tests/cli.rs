//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("JIGGLE_LOG_DIR", std::env::temp_dir().join("jiggle-tests"))
        .env_remove("RUST_LOG");
    cmd
}

fn in_dir(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.args(["-C", dir.to_str().unwrap()]);
    cmd
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// A small project that declares 1.2.3 in three places.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "pyproject.toml",
        "[project]\nname = \"demo\"\nversion = \"1.2.3\"\n",
    );
    write(
        root,
        "setup.py",
        "from setuptools import setup\n\nsetup(\n    name=\"demo\",\n    version=\"1.2.3\",\n)\n",
    );
    write(
        root,
        "demo/__init__.py",
        "__all__ = [\"greet\"]\n__version__ = \"1.2.3\"\n",
    );
    tmp
}

fn json_stdout(assert: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("hash-all"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("JIGGLE_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_json_outputs_valid_json() {
    let tmp = TempDir::new().unwrap();
    let assert = in_dir(tmp.path()).args(["info", "--json"]).assert().success();
    let json = json_stdout(&assert);

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["scheme"], "pep440");
}

// =============================================================================
// Print & Check
// =============================================================================

#[test]
fn print_outputs_only_the_version() {
    let tmp = project();
    in_dir(tmp.path())
        .arg("print")
        .assert()
        .success()
        .stdout("1.2.3\n");
}

#[test]
fn print_without_version_fails() {
    let tmp = TempDir::new().unwrap();
    in_dir(tmp.path())
        .arg("print")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no version found"));
}

#[test]
fn print_init_falls_back() {
    let tmp = TempDir::new().unwrap();
    in_dir(tmp.path())
        .args(["print", "--init"])
        .assert()
        .success()
        .stdout("0.1.0\n");
}

#[test]
fn check_passes_when_versions_agree() {
    let tmp = project();
    let assert = in_dir(tmp.path()).args(["check", "--json"]).assert().success();
    let json = json_stdout(&assert);

    assert_eq!(json["canonical"]["raw"], "1.2.3");
    assert_eq!(json["accepted"].as_array().map(Vec::len), Some(3));
}

#[test]
fn check_tolerates_one_patch_straggler() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "setup.cfg", "[metadata]\nversion = 1.2.3\n");
    write(tmp.path(), "version.txt", "1.2.4\n");

    in_dir(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4"));
}

#[test]
fn check_fails_on_disagreement() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "setup.cfg", "[metadata]\nversion = 1.2.3\n");
    write(tmp.path(), "version.txt", "1.3.0\n");

    in_dir(tmp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("setup.cfg=1.2.3"))
        .stderr(predicate::str::contains("version.txt=1.3.0"));
}

#[test]
fn ignore_flag_skips_paths() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "version.txt", "1.2.3\n");
    write(tmp.path(), "vendor/_version.py", "__version__ = '9.9.9'\n");

    in_dir(tmp.path()).arg("check").assert().failure();
    in_dir(tmp.path())
        .args(["--ignore", "vendor", "check"])
        .assert()
        .success();
}

// =============================================================================
// Inspect
// =============================================================================

#[test]
fn inspect_lists_files() {
    let tmp = project();
    let assert = in_dir(tmp.path())
        .args(["inspect", "--json"])
        .assert()
        .success();
    let json = json_stdout(&assert);

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["source_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["demo/__init__.py", "pyproject.toml", "setup.py"]);
    assert_eq!(json[2]["declared_symbol"], "setup(version=)");
}

// =============================================================================
// Bump
// =============================================================================

#[test]
fn bump_patch_rewrites_all_files() {
    let tmp = project();
    in_dir(tmp.path())
        .args(["bump", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4"));

    let root = tmp.path();
    assert!(
        fs::read_to_string(root.join("pyproject.toml"))
            .unwrap()
            .contains("version = \"1.2.4\"")
    );
    assert!(
        fs::read_to_string(root.join("setup.py"))
            .unwrap()
            .contains("version=\"1.2.4\"")
    );
    assert!(
        fs::read_to_string(root.join("demo/__init__.py"))
            .unwrap()
            .contains("__version__ = \"1.2.4\"")
    );
    in_dir(root).arg("print").assert().stdout("1.2.4\n");
}

#[test]
fn bump_dry_run_changes_nothing() {
    let tmp = project();
    let assert = in_dir(tmp.path())
        .args(["bump", "--increment", "minor", "--dry-run", "--json"])
        .assert()
        .success();
    let json = json_stdout(&assert);

    assert_eq!(json["previous"], "1.2.3");
    assert_eq!(json["next"], "1.3.0");
    assert_eq!(json["dry_run"], true);
    in_dir(tmp.path()).arg("print").assert().stdout("1.2.3\n");
}

#[test]
fn bump_set_explicit_version() {
    let tmp = project();
    in_dir(tmp.path())
        .args(["bump", "--set", "2.0.0rc1", "--yes"])
        .assert()
        .success();

    in_dir(tmp.path()).arg("print").assert().stdout("2.0.0rc1\n");
}

#[test]
fn bump_rejects_invalid_explicit_version() {
    let tmp = project();
    in_dir(tmp.path())
        .args(["bump", "--set", "banana", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a version"));
}

#[test]
fn bump_init_requires_a_declaration_to_rewrite() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "pyproject.toml", "[project]\nversion = \"\"\n");

    in_dir(tmp.path())
        .args(["bump", "--init", "--yes"])
        .assert()
        .success();

    in_dir(tmp.path()).arg("print").assert().stdout("0.1.1\n");
}

#[test]
fn bump_rewrites_one_line_setup_call() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "pyproject.toml", "[project]\nversion = \"1.2.3\"\n");
    write(
        root,
        "setup.py",
        "from setuptools import setup\nsetup(name='demo', version='1.2.3')\n",
    );

    in_dir(root).args(["bump", "--yes"]).assert().success();

    assert_eq!(
        fs::read_to_string(root.join("setup.py")).unwrap(),
        "from setuptools import setup\nsetup(name='demo', version='1.2.4')\n"
    );
    in_dir(root).arg("check").assert().success();
}

#[test]
fn bump_refuses_to_leave_a_tuple_behind() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "pyproject.toml", "[project]\nversion = \"1.2.3\"\n");
    write(root, "demo/__init__.py", "__version__ = (1, 2, 3)\n");

    in_dir(root)
        .args(["bump", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("demo/__init__.py"));
    in_dir(root).arg("print").assert().stdout("1.2.3\n");

    let assert = in_dir(root)
        .args(["bump", "--yes", "--force-write", "--json"])
        .assert()
        .success();
    let json = json_stdout(&assert);
    assert_eq!(json["files"], serde_json::json!(["pyproject.toml"]));
    assert_eq!(json["skipped"], serde_json::json!(["demo/__init__.py"]));
}

#[test]
fn init_appends_settings_table_once() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "pyproject.toml", "[project]\nname = \"demo\"\n");

    in_dir(root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added default"));
    let assert = in_dir(root).args(["init", "--json"]).assert().success();
    assert_eq!(json_stdout(&assert)["created"], false);

    let text = fs::read_to_string(root.join("pyproject.toml")).unwrap();
    assert_eq!(text.matches("[tool.jiggle_version]").count(), 1);
    assert!(text.contains("scheme = \"pep440\""));
}

#[test]
fn init_without_pyproject_fails() {
    let tmp = TempDir::new().unwrap();
    in_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pyproject.toml not found"));
}

#[test]
fn hash_all_then_auto_bump() {
    let tmp = project();
    let root = tmp.path();
    in_dir(root).arg("hash-all").assert().success();
    assert!(root.join(".jiggle_version.config").is_file());

    // Unchanged API: patch
    in_dir(root)
        .args(["bump", "--increment", "auto", "--yes"])
        .assert()
        .success();
    in_dir(root).arg("print").assert().stdout("1.2.4\n");

    // New public symbol: minor
    write(
        root,
        "demo/__init__.py",
        "__all__ = [\"greet\", \"wave\"]\n__version__ = \"1.2.4\"\n",
    );
    in_dir(root)
        .args(["bump", "--increment", "auto", "--yes"])
        .assert()
        .success();
    in_dir(root).arg("print").assert().stdout("1.3.0\n");

    // Removed symbol: major
    write(
        root,
        "demo/__init__.py",
        "__all__ = [\"wave\"]\n__version__ = \"1.3.0\"\n",
    );
    in_dir(root)
        .args(["bump", "--increment", "auto", "--yes"])
        .assert()
        .success();
    in_dir(root).arg("print").assert().stdout("2.0.0\n");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_increment_shows_error() {
    let tmp = project();
    in_dir(tmp.path())
        .args(["bump", "--increment", "huge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn set_conflicts_with_increment() {
    let tmp = project();
    in_dir(tmp.path())
        .args(["bump", "--set", "1.0.0", "--increment", "major"])
        .assert()
        .failure();
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
