//! Integration tests: run the lockpin binary and check exit codes and output.

use std::path::Path;
use std::process::Command;

fn lockpin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lockpin"));
    cmd.env("NO_COLOR", "1")
        .env_remove("LOCKPIN_PACKAGE_MANAGER")
        .env_remove("LOCKPIN_LOG_FILE");
    cmd
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, content).expect("write");
}

fn yarn_project() -> tempfile::TempDir {
    let td = tempfile::tempdir().expect("tmp");
    let root = td.path();
    write(
        &root.join("yarn.lock"),
        "# yarn lockfile v1\n\n\
         left-pad@^1.0.0, left-pad@^1.3.0:\n  version \"1.3.0\"\n  resolved \"https://registry.yarnpkg.com/left-pad/-/left-pad-1.3.0.tgz\"\n\n\
         \"local-lib@file:./libs/local-lib\":\n  version \"0.1.0\"\n",
    );
    write(
        &root.join("node_modules/left-pad/package.json"),
        r#"{"name":"left-pad","version":"1.3.0"}"#,
    );
    write(
        &root.join("node_modules/local-lib/package.json"),
        r#"{"name":"local-lib","version":"0.1.0"}"#,
    );
    td
}

#[test]
fn test_help() {
    let out = lockpin().arg("--help").output().unwrap();
    assert!(out.status.success(), "lockpin --help should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("detect"));
}

#[test]
fn test_version() {
    let out = lockpin().arg("--version").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("lockpin"));
}

#[test]
fn test_resolve_yarn_registry_package() {
    let td = yarn_project();
    let out = lockpin()
        .args(["resolve", "left-pad", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "https://registry.yarnpkg.com/left-pad/-/left-pad-1.3.0.tgz"
    );
}

#[test]
fn test_resolve_yarn_local_file_is_absolute() {
    let td = yarn_project();
    let root = std::fs::canonicalize(td.path()).unwrap();
    let out = lockpin()
        .args(["resolve", "local-lib", "--root"])
        .arg(&root)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let expected = format!(
        "file:{}",
        root.join("libs").join("local-lib").to_string_lossy().replace('\\', "/")
    );
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), expected);
}

#[test]
fn test_resolve_npm_json_output() {
    let td = tempfile::tempdir().expect("tmp");
    write(
        &td.path().join("package-lock.json"),
        r#"{
  "lockfileVersion": 1,
  "dependencies": {
    "a": {
      "version": "1.0.0",
      "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz",
      "dependencies": {
        "b": { "version": "2.0.0", "resolved": "https://registry.npmjs.org/b/-/b-2.0.0.tgz" }
      }
    },
    "b": { "version": "1.0.0", "resolved": "https://registry.npmjs.org/b/-/b-1.0.0.tgz" }
  }
}"#,
    );
    let out = lockpin()
        .args(["resolve", "a/b", "--json", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["command"], "resolve");
    assert_eq!(v["packageManager"], "npm");
    assert_eq!(v["resolution"], "https://registry.npmjs.org/b/-/b-2.0.0.tgz");
    assert_eq!(v["exact"], true);
}

#[test]
fn test_detect_prefers_npm_when_both_exist() {
    let td = yarn_project();
    write(&td.path().join("package-lock.json"), "{}");
    let out = lockpin()
        .args(["detect", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "npm");

    let out = lockpin()
        .args(["detect", "--package-manager", "yarn", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "yarn");
}

#[test]
fn test_invalid_specifier_fails() {
    let td = yarn_project();
    let out = lockpin()
        .args(["resolve", "@scope", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Can't find package @scope"));
}

#[test]
fn test_unknown_package_fails() {
    let td = yarn_project();
    write(
        &td.path().join("node_modules/right-pad/package.json"),
        r#"{"name":"right-pad","version":"1.0.0"}"#,
    );
    let out = lockpin()
        .args(["resolve", "right-pad", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("right-pad"));
}

#[test]
fn test_no_lockfile_fails() {
    let td = tempfile::tempdir().expect("tmp");
    let out = lockpin()
        .args(["resolve", "left-pad", "--root"])
        .arg(td.path())
        .output()
        .unwrap();
    assert!(!out.status.success(), "resolve with no lockfile should fail");
}
