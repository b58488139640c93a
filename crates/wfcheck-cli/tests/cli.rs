//! Smoke tests for the wfcheck binary.

#![allow(deprecated)] // Command::cargo_bin

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RELEASE: &str = r#"name: Release
on:
  release:
    types: [published]
  push:
    tags: ["v*.*.*"]
  workflow_dispatch:
env:
  HUSKY: 0
jobs:
  build:
    runs-on: ubuntu-latest
    permissions:
      contents: read
    steps:
      - uses: actions/checkout@v5
      - uses: oven-sh/setup-bun@v2
        with:
          bun-version: latest
      - run: bun ci
      - run: bun run build
      - name: Upload build artifacts
        uses: actions/upload-artifact@v4
        with:
          name: build-output
          path: ./dist
  publish:
    needs: build
    runs-on: ubuntu-latest
    permissions:
      contents: write
      packages: write
    steps:
      - uses: actions/checkout@v5
      - uses: oven-sh/setup-bun@v2
        with:
          bun-version: latest
      - name: Download build artifacts
        uses: actions/download-artifact@v4
        with:
          name: build-output
          path: ./dist
      - name: Publish to npm
        run: bunx npm publish --access public
        env:
          NPM_TOKEN: ${{ secrets.NPM_TOKEN }}
"#;

const CI: &str = r#"name: CI
on:
  push:
    branches: [main]
  pull_request:
concurrency:
  group: ci-${{ github.ref }}
  cancel-in-progress: true
env:
  HUSKY: 0
jobs:
  test:
    runs-on: ubuntu-latest
    permissions:
      contents: read
    steps:
      - uses: actions/checkout@v5
      - uses: oven-sh/setup-bun@v2
      - run: bun ci
      - run: bun test
"#;

fn wfcheck() -> Command {
    Command::cargo_bin("wfcheck").expect("wfcheck binary should exist")
}

/// A temp project with `.github/workflows/{ci,release}.yml`.
fn project(ci: &str, release: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let workflows = dir.path().join(".github/workflows");
    fs::create_dir_all(&workflows).unwrap();
    fs::write(workflows.join("ci.yml"), ci).unwrap();
    fs::write(workflows.join("release.yml"), release).unwrap();
    dir
}

fn in_project(dir: &Path) -> Command {
    let mut cmd = wfcheck();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn help_lists_suites() {
    wfcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("edge-cases"))
        .stdout(predicate::str::contains("--expectations"));
}

#[test]
fn clean_project_passes_all_suites() {
    let dir = project(CI, RELEASE);
    in_project(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub Actions Release Workflow Test Suite"))
        .stdout(predicate::str::contains("GitHub Actions Workflow Schema Validation Suite"))
        .stdout(predicate::str::contains("All checks passed!"))
        .stdout(predicate::str::contains("FAIL:").not());
}

#[test]
fn failing_check_exits_one_and_prints_detail() {
    let dir = project(CI, &RELEASE.replace("HUSKY: 0", "HUSKY: 1"));
    in_project(dir.path())
        .arg("release")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL: HUSKY environment variable is set to 0"))
        .stdout(predicate::str::contains("Expected: 0"))
        .stdout(predicate::str::contains("Actual: 1"));
}

#[test]
fn missing_release_file_reports_error() {
    let dir = TempDir::new().unwrap();
    in_project(dir.path())
        .arg("release")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "ERROR: Could not find .github/workflows/release.yml",
        ))
        .stdout(predicate::str::contains("TEST SUMMARY").not());
}

#[test]
fn invalid_yaml_reports_parse_error() {
    let dir = project("jobs: [unclosed\n", RELEASE);
    in_project(dir.path())
        .arg("schema")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ERROR: Failed to parse YAML"));
}

#[test]
fn explicit_paths_override_defaults() {
    let dir = project(CI, RELEASE);
    let workflows = dir.path().join(".github/workflows");
    wfcheck()
        .arg("--ci")
        .arg(workflows.join("ci.yml"))
        .arg("--release")
        .arg(workflows.join("release.yml"))
        .arg("consistency")
        .assert()
        .success()
        .stdout(predicate::str::contains("Consistency Test Suite"));
}

#[test]
fn version_drift_warns_but_passes() {
    let dir = project(&CI.replace("setup-bun@v2", "setup-bun@v1"), RELEASE);
    in_project(dir.path())
        .arg("consistency")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "WARN: Action 'oven-sh/setup-bun' uses different versions: CI=v1, Release=v2",
        ))
        .stdout(predicate::str::contains("1 warnings:"));
}

#[test]
fn json_format_prints_reports_only() {
    let dir = project(CI, RELEASE);
    let output = in_project(dir.path())
        .args(["--format", "json", "all"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let reports: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be JSON");
    let reports = reports.as_array().expect("array of reports");
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0]["suite"], "release");
    assert_eq!(reports[2]["suite"], "edge-cases");
    for report in reports {
        assert_eq!(report["summary"]["failed"], 0);
        assert!(report["generated_at"].is_string());
    }
}

#[test]
fn json_format_includes_load_error() {
    let dir = TempDir::new().unwrap();
    let output = in_project(dir.path())
        .args(["--format", "json", "release"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let reports: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(reports[0]["error"]["kind"], "not_found");
    assert_eq!(reports[0]["summary"]["total"], 0);
}

#[test]
fn expectations_file_overrides_defaults() {
    let dir = project(CI, &RELEASE.replace("name: Release", "name: Ship"));
    fs::write(dir.path().join("wfcheck.yml"), "workflow_name: Ship\n").unwrap();
    in_project(dir.path())
        .args(["--expectations", "wfcheck.yml", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS: Workflow name is 'Ship'"));
}

#[test]
fn bad_expectations_file_fails() {
    let dir = project(CI, RELEASE);
    fs::write(dir.path().join("wfcheck.yml"), "runner: [unclosed\n").unwrap();
    in_project(dir.path())
        .args(["--expectations", "wfcheck.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load expectations"));
}

#[test]
fn unknown_suite_is_rejected() {
    wfcheck().arg("documentation").assert().failure();
}
