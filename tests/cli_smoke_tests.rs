//! CLI smoke tests for the weft binary.
//!
//! Spawns the compiled binary against files in a temp directory and checks
//! both the woven output on disk and the printed report.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn weft_bin() -> String {
    std::env::var("CARGO_BIN_EXE_weft").unwrap_or_else(|_| {
        // Fallback: construct path to debug binary
        let mut path = std::env::current_exe().unwrap();
        path.pop(); // Remove test executable name from deps/
        path.pop(); // Remove deps/ directory
        path.push("weft");
        path.to_str().unwrap().to_string()
    })
}

#[test]
fn test_weave_command_rewrites_file() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("svc.rs");
    let aspects_path = temp_dir.path().join("aspects.json");

    fs::write(
        &source_path,
        "use std::fmt;\n\nfn main() {\n    connect();\n}\n",
    )
    .unwrap();
    fs::write(
        &aspects_path,
        r#"[{"kind": "call", "pattern": "connect", "before": "    audit();", "imports": ["auditlog"]}]"#,
    )
    .unwrap();

    let output = Command::new(weft_bin())
        .arg("weave")
        .arg("--aspects")
        .arg(&aspects_path)
        .arg("--file")
        .arg(&source_path)
        .output()
        .expect("Failed to start weft binary");

    assert!(output.status.success(), "weave should exit cleanly");

    let woven = fs::read_to_string(&source_path).unwrap();
    assert!(woven.contains("    audit();\n    connect();"));
    assert_eq!(woven.matches("use auditlog;").count(), 1);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 match(es)"), "stdout was: {}", stdout);
}

#[test]
fn test_weave_command_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("svc.rs");
    let aspects_path = temp_dir.path().join("aspects.json");

    fs::write(&source_path, "fn main() {\n    connect();\n}\n").unwrap();
    fs::write(
        &aspects_path,
        r#"[{"kind": "call", "pattern": "connect", "before": "    audit();"}]"#,
    )
    .unwrap();

    let output = Command::new(weft_bin())
        .arg("weave")
        .arg("--aspects")
        .arg(&aspects_path)
        .arg("--file")
        .arg(&source_path)
        .arg("--output")
        .arg("json")
        .output()
        .expect("Failed to start weft binary");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["schema_version"], "1.0.0");
    assert_eq!(parsed["data"]["files"][0]["call_matches"], 1);
}

#[test]
fn test_check_command_validates_aspect_file() {
    let temp_dir = TempDir::new().unwrap();
    let aspects_path = temp_dir.path().join("aspects.json");
    fs::write(
        &aspects_path,
        r#"[{"kind": "execution", "pattern": "handle()", "before": "    enter();"}]"#,
    )
    .unwrap();

    let output = Command::new(weft_bin())
        .arg("check")
        .arg("--aspects")
        .arg(&aspects_path)
        .output()
        .expect("Failed to start weft binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 aspect(s) ok"));
}

#[test]
fn test_missing_command_prints_usage() {
    let output = Command::new(weft_bin())
        .output()
        .expect("Failed to start weft binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:"));
}

#[test]
fn test_malformed_aspect_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let aspects_path = temp_dir.path().join("aspects.json");
    fs::write(&aspects_path, "not json at all").unwrap();

    let output = Command::new(weft_bin())
        .arg("check")
        .arg("--aspects")
        .arg(&aspects_path)
        .output()
        .expect("Failed to start weft binary");

    assert!(!output.status.success());
}
