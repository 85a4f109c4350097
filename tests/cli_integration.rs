//! CLI integration tests for pkgorder
//!
//! These tests run the binary against snapshot files written to a temporary
//! directory and check the printed sequences.

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a command instance for the pkgorder binary
fn pkgorder_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("pkgorder"));
    // Keep the developer's own configuration out of the way
    cmd.env_remove("PKGORDER_CONFIG");
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/pkgorder-tests");
    cmd
}

const CHAIN: &str = r#"{
    "packages": [
        {"name": "a", "action": "install", "candidate": {"version": "1.0",
            "depends": [{"type": "pre_depends", "target": "b"}]}},
        {"name": "b", "action": "install", "candidate": {"version": "1.0",
            "depends": [{"type": "depends", "target": "c"}]}},
        {"name": "c", "action": "install", "candidate": {"version": "1.0"}}
    ]
}"#;

const CYCLE: &str = "
packages:
  - name: x
    action: install
    candidate:
      version: '1.0'
      depends:
        - { type: pre_depends, target: y }
  - name: y
    action: install
    candidate:
      version: '1.0'
      depends:
        - { type: pre_depends, target: x }
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &assert_cmd::assert::Assert) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    serde_json::from_str(&stdout).unwrap()
}

fn order_names(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// order
// =============================================================================

#[test]
fn test_order_unpack_text() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("order")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("unpack order (3 packages)"))
        .stdout(predicate::str::is_match(r"(?s)1\s+c.*2\s+b.*3\s+a").unwrap());
}

#[test]
fn test_order_unpack_json() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "order"])
        .arg(&snapshot)
        .assert()
        .success();

    let json = stdout_json(&output);
    assert_eq!(json["mode"], "unpack");
    assert_eq!(order_names(&json["order"]), vec!["c", "b", "a"]);
}

#[test]
fn test_order_configure_mode() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["-f", "json", "order", "--mode", "configure"])
        .arg(&snapshot)
        .assert()
        .success();

    assert_eq!(order_names(&stdout_json(&output)["order"]), vec!["c", "b", "a"]);
}

#[test]
fn test_order_cycle_fails_with_edges() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("order")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unresolved dependency cycle (1 detected)"))
        .stderr(predicate::str::contains("y PreDepends x"));
}

#[test]
fn test_order_cycle_json_lists_loops() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "order"])
        .arg(&snapshot)
        .assert()
        .failure();

    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["count"], 1);
    assert_eq!(json["loops"][0]["dependent_name"], "y");
}

#[test]
fn test_order_immediate_breaks_cycle() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "order", "--immediate", "x"])
        .arg(&snapshot)
        .assert()
        .success();

    assert_eq!(order_names(&stdout_json(&output)["order"]), vec!["y", "x"]);
}

#[test]
fn test_order_unknown_immediate_package() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    pkgorder_cmd()
        .current_dir(dir.path())
        .args(["order", "--immediate", "ghost"])
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown package: ghost"));
}

#[test]
fn test_order_with_groups() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(
        &dir,
        "snap.json",
        r#"{"packages": [
            {"name": "a", "action": "install", "candidate": {"version": "1"}},
            {"name": "b", "action": "install", "candidate": {"version": "1"}}
        ]}"#,
    );
    let groups = write(&dir, "groups.yaml", "a: cd2\nb: cd1\n");

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "order", "--groups"])
        .arg(&groups)
        .arg(&snapshot)
        .assert()
        .success();

    assert_eq!(order_names(&stdout_json(&output)["order"]), vec!["b", "a"]);
}

#[test]
fn test_missing_snapshot_fails() {
    let dir = TempDir::new().unwrap();

    pkgorder_cmd()
        .current_dir(dir.path())
        .args(["order", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load snapshot"));
}

// =============================================================================
// plan
// =============================================================================

#[test]
fn test_plan_breaks_loop() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "plan"])
        .arg(&snapshot)
        .assert()
        .success();

    let json = stdout_json(&output);
    assert_eq!(order_names(&json["unpack"]), vec!["y", "x"]);
    assert_eq!(json["loop_breaks"], serde_json::json!(["x"]));
    assert_eq!(json["attempts"], 2);
}

#[test]
fn test_plan_text_sections() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("plan")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical (3):"))
        .stdout(predicate::str::contains("Unpack (3):"))
        .stdout(predicate::str::contains("Configure (3):"));
}

#[test]
fn test_plan_respects_project_config() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);
    write(&dir, "pkgorder.toml", "[planner]\nmax_loop_breaks = 0\n");

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("plan")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unresolved dependency cycle"));
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);
    let config = write(&dir, "strict.toml", "[planner]\nmax_loop_breaks = 0\n");

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("plan")
        .arg(&snapshot)
        .assert()
        .failure();
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);
    write(&dir, "pkgorder.toml", "[order]\nmax_depth = 0\n");

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("plan")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_depth"));
}

// =============================================================================
// check / score
// =============================================================================

#[test]
fn test_check_reports_cycle() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "cycle.yaml", CYCLE);

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("check")
        .arg(&snapshot)
        .assert()
        .failure()
        .stdout(predicate::str::contains("x <-> y"));
}

#[test]
fn test_check_clean_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    pkgorder_cmd()
        .current_dir(dir.path())
        .arg("check")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("No pre-dependency cycles."));
}

#[test]
fn test_score_lists_candidates() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(
        &dir,
        "snap.json",
        r#"{"packages": [
            {"name": "plain", "action": "install", "candidate": {"version": "1"}},
            {"name": "base", "essential": true, "action": "install", "candidate": {"version": "1"}}
        ]}"#,
    );

    let output = pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "score"])
        .arg(&snapshot)
        .assert()
        .success();

    let json = stdout_json(&output);
    assert_eq!(order_names(&json), vec!["base", "plain"]);
    assert_eq!(json[0]["score"]["essential"], true);
    assert_eq!(json[0]["placement"], serde_json::Value::Null);
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "snap.json", CHAIN);

    pkgorder_cmd()
        .current_dir(dir.path())
        .args(["--verbose", "order"])
        .arg(&snapshot)
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:snapshot] Loaded 3 packages"));
}
