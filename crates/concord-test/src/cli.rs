//! CLI regression tests for the `concord` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats — things the Rust API tests can't catch.
//!
//! Run with: `cargo test -p concord-test`
//! Requires the `concord` binary to be built first (`cargo build -p concord`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `concord` binary.
fn concord() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    Command::cargo_bin("concord")
        .expect("concord binary not found — run `cargo build -p concord` first")
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/concord-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

// ---------------------------------------------------------------------------
// concord validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_document_exits_zero() {
    concord()
        .args(["validate", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stdout(contains("OK"));
}

#[test]
fn validate_parse_error_exits_one() {
    concord()
        .args(["validate", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn validate_missing_file_exits_one() {
    concord()
        .args(["validate", "--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn validate_missing_paths_reports_the_field() {
    concord()
        .args(["validate", "--spec"])
        .arg(fixtures().join("missing-paths.yaml"))
        .assert()
        .failure()
        .code(1)
        .stdout(contains("paths"));
}

#[test]
fn validate_json_format_outputs_valid_json() {
    let output = concord()
        .args(["validate", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let s = String::from_utf8(output).expect("stdout should be valid UTF-8");
    let v: serde_json::Value =
        serde_json::from_str(&s).expect("--format json output should be valid JSON");
    assert_eq!(v["is_valid"], true);
    assert_eq!(v["endpoints"], 3);
}

// ---------------------------------------------------------------------------
// concord rules
// ---------------------------------------------------------------------------

#[test]
fn rules_text_output_lists_operations_and_tokens() {
    concord()
        .args(["rules", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stdout(contains("createUser:"))
        .stdout(contains("name: required|string|min:2|max:120"))
        .stdout(contains("email: required|string|email"))
        .stdout(contains("userId: required|integer|min:1"));
}

#[test]
fn rules_json_format_keys_by_operation_id() {
    let output = concord()
        .args(["rules", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let s = String::from_utf8(output).expect("stdout should be valid UTF-8");
    let v: serde_json::Value =
        serde_json::from_str(&s).expect("--format json output should be valid JSON");
    assert!(v.get("createUser").is_some());
    assert!(v.get("getUser").is_some());
    // No request schema, so no rule map.
    assert!(v.get("listUsers").is_none());
    assert_eq!(v["createUser"]["tags.*"], "string|in:admin,staff,guest");
}

#[test]
fn rules_output_flag_writes_file() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("nested/rules.json");

    concord()
        .args(["rules", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--format", "json", "--output"])
        .arg(&out)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).expect("output file written");
    let v: serde_json::Value = serde_json::from_str(&written).expect("file holds valid JSON");
    assert!(v.get("createUser").is_some());
}

#[test]
fn rules_parse_error_exits_one() {
    concord()
        .args(["rules", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1);
}

// ---------------------------------------------------------------------------
// concord reconcile
// ---------------------------------------------------------------------------

#[test]
fn reconcile_matching_surfaces_exit_zero() {
    concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--routes")
        .arg(fixtures().join("routes-ok.json"))
        .assert()
        .success()
        .stdout(contains("OK"));
}

#[test]
fn reconcile_undocumented_route_exits_one() {
    concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--routes")
        .arg(fixtures().join("routes-extra.json"))
        .assert()
        .failure()
        .code(1)
        .stdout(contains("not documented"))
        .stdout(contains("/api/orders"));
}

#[test]
fn reconcile_include_pattern_suppresses_unrelated_routes() {
    concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--routes")
        .arg(fixtures().join("routes-extra.json"))
        .args(["--include", "api/users*"])
        .assert()
        .success();
}

#[test]
fn reconcile_json_format_carries_statistics() {
    let output = concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--routes")
        .arg(fixtures().join("routes-extra.json"))
        .args(["--format", "json"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let s = String::from_utf8(output).expect("stdout should be valid UTF-8");
    let v: serde_json::Value =
        serde_json::from_str(&s).expect("--format json output should be valid JSON even on error");
    assert_eq!(v["is_valid"], false);
    assert_eq!(v["statistics"]["total_routes"], 4);
    assert_eq!(v["statistics"]["covered_routes"], 3);
    assert_eq!(v["statistics"]["endpoint_coverage"], 100.0);
    let mismatches = v["mismatches"].as_array().expect("mismatches array");
    assert!(mismatches
        .iter()
        .any(|m| m["type"] == "missing_documentation"));
}

#[test]
fn reconcile_missing_routes_file_exits_one() {
    concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--routes", "no-such-routes.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no-such-routes.json"));
}

#[test]
fn reconcile_missing_routes_flag_exits_two() {
    // --routes is required; clap returns exit code 2 for missing required args
    concord()
        .args(["reconcile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .failure()
        .code(2);
}
