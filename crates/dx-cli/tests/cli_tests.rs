//! Integration tests for the `dx` binary
//!
//! Every command runs in a fresh temporary directory with no API key, so
//! only rule-based conversions can succeed.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Path to the compiled dx binary
fn dx_bin() -> String {
    env!("CARGO_BIN_EXE_dx").to_string()
}

fn dx_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(dx_bin());
    cmd.args(args)
        .current_dir(dir)
        .env_remove("DIALECTIC_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a `dx` command and return (stdout, stderr, exit code).
fn run_dx(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = dx_command(dir, args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute dx with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

#[test]
fn test_dialects_lists_every_engine() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_dx(dir.path(), &["dialects"]);

    assert_eq!(code, 0);
    for name in ["postgres", "oracle", "mysql", "tsql", "snowflake"] {
        assert!(stdout.contains(name), "missing {}: {}", name, stdout);
    }
    assert!(stdout.contains("PL/pgSQL"), "got: {}", stdout);
}

#[test]
fn test_convert_file_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("query.sql"),
        "SELECT id, IFNULL(name, 'n/a') FROM users;\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_dx(
        dir.path(),
        &[
            "convert", "query.sql", "--from", "mysql", "--to", "postgres", "--output", "json",
            "--stats",
        ],
    );

    assert_eq!(code, 0, "stderr: {}", stderr);
    let output = json(&stdout);
    let file = &output["files"][0];
    assert_eq!(file["input"], "query.sql");
    assert_eq!(file["result"]["success"], true);
    assert_eq!(file["result"]["strategy"], "rule_based");
    let text = file["result"]["result_text"].as_str().unwrap();
    assert!(text.contains("COALESCE(name, 'n/a')"), "got: {}", text);
    assert_eq!(output["stats"]["total"], 1);
    assert_eq!(output["stats"]["succeeded"], 1);
}

#[test]
fn test_convert_writes_out_dir() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sql")).unwrap();
    fs::write(dir.path().join("sql/a.sql"), "SELECT NVL(a, 0) FROM t;\n").unwrap();
    fs::write(dir.path().join("sql/b.sql"), "SELECT SYSDATE FROM dual;\n").unwrap();

    let (stdout, stderr, code) = run_dx(
        dir.path(),
        &[
            "convert", "sql/*.sql", "--from", "oracle", "--to", "postgres", "--out-dir", "out",
            "--threads", "2",
        ],
    );

    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Converted 2 of 2 documents"), "got: {}", stdout);
    let a = fs::read_to_string(dir.path().join("out/a.sql")).unwrap();
    assert!(a.contains("COALESCE(a, 0)"), "got: {}", a);
    assert!(dir.path().join("out/b.sql").exists());
}

#[test]
fn test_convert_rejects_colliding_output_names() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a/q.sql"), "SELECT NVL(a, 1) FROM t;\n").unwrap();
    fs::write(dir.path().join("b/q.sql"), "SELECT NVL(b, 2) FROM t;\n").unwrap();

    let (stdout, stderr, code) = run_dx(
        dir.path(),
        &[
            "convert", "a/q.sql", "b/q.sql", "--from", "oracle", "--to", "postgres", "--out-dir",
            "out",
        ],
    );

    assert_eq!(code, 1, "stdout: {}", stdout);
    assert!(stderr.contains("would both be written"), "got: {}", stderr);
    assert!(!stdout.contains("[ok]"), "got: {}", stdout);
    assert!(!dir.path().join("out/q.sql").exists());
}

#[test]
fn test_convert_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = dx_command(dir.path(), &["convert", "-", "--from", "mysql", "--to", "postgres"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"SELECT `id` FROM `users`")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("\"users\""), "got: {}", stdout);
    assert!(stdout.trim_end().ends_with(';'), "got: {}", stdout);
}

#[test]
fn test_convert_unknown_dialect_exits_one() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("q.sql"), "SELECT 1;").unwrap();

    let (stdout, _, code) = run_dx(
        dir.path(),
        &["convert", "q.sql", "--from", "cobol", "--to", "postgres", "--output", "json"],
    );

    assert_eq!(code, 1);
    let result = &json(&stdout)["files"][0]["result"];
    assert_eq!(result["success"], false);
    assert_eq!(result["error"]["category"], "Validation");
    assert!(
        result["error"]["message"].as_str().unwrap().contains("cobol"),
        "got: {}",
        result
    );
}

#[test]
fn test_convert_generative_without_key_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("proc.sql"),
        "CREATE OR REPLACE PROCEDURE p IS\nBEGIN\n  NULL;\nEND p;\n",
    )
    .unwrap();

    let (_, stderr, code) = run_dx(
        dir.path(),
        &["convert", "proc.sql", "--from", "oracle", "--to", "postgres"],
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("[error] proc.sql"), "got: {}", stderr);
    assert!(stderr.contains("no API key configured"), "got: {}", stderr);
}

#[test]
fn test_convert_missing_file_exits_one() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_dx(
        dir.path(),
        &["convert", "absent.sql", "--from", "mysql", "--to", "postgres"],
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("absent.sql"), "got: {}", stderr);
}

#[test]
fn test_segment_json_reports_units() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("doc.sql"),
        "-- header\nSELECT 1;\nZTC_SQLZZ('SELECT 2');\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_dx(dir.path(), &["segment", "doc.sql", "--output", "json"]);

    assert_eq!(code, 0, "stderr: {}", stderr);
    let output = json(&stdout);
    assert_eq!(output["unit_count"], 2);
    let kinds: Vec<&str> = output["pieces"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["plain", "dynamic_call"]);
}

#[test]
fn test_segment_custom_wrappers() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.sql"), "EXEC_SQL('SELECT 2');\n").unwrap();

    let (stdout, _, code) = run_dx(
        dir.path(),
        &["segment", "doc.sql", "--wrappers", "EXEC_SQL", "--output", "json"],
    );

    assert_eq!(code, 0);
    let output = json(&stdout);
    assert_eq!(output["pieces"][0]["kind"], "dynamic_call");
}

#[test]
fn test_analyze_procedure_needs_generative() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("proc.sql"),
        "CREATE OR REPLACE PROCEDURE p IS\nBEGIN\n  NULL;\nEND p;\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_dx(
        dir.path(),
        &["analyze", "proc.sql", "--from", "oracle", "--to", "postgres", "--output", "json"],
    );

    assert_eq!(code, 0, "stderr: {}", stderr);
    let output = json(&stdout);
    assert_eq!(output["hard_pair"], true);
    assert_eq!(output["document"]["has_procedural"], true);
    assert_eq!(output["document_strategy"], "generative");
    assert_eq!(output["units"][0]["kind"], "procedural_block");
}

#[test]
fn test_config_file_in_working_directory_is_used() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dialectic.yml"),
        "conversion:\n  dynamic_wrappers: [EXEC_SQL]\n",
    )
    .unwrap();
    fs::write(dir.path().join("doc.sql"), "EXEC_SQL('SELECT 2');\n").unwrap();

    let (stdout, stderr, code) = run_dx(dir.path(), &["segment", "doc.sql", "--output", "json"]);

    assert_eq!(code, 0, "stderr: {}", stderr);
    let output = json(&stdout);
    assert_eq!(output["wrappers"][0], "EXEC_SQL");
    assert_eq!(output["pieces"][0]["kind"], "dynamic_call");
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dialectic.yml"), "unknown_section: true\n").unwrap();

    let (_, stderr, code) = run_dx(dir.path(), &["segment", "-"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("dialectic.yml"), "got: {}", stderr);
}
