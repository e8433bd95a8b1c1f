//! CLI integration tests
//!
//! Each test runs the built binary inside a fresh temp directory so no
//! stray `codect.toml` is picked up.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn codect_bin() -> String {
    env!("CARGO_BIN_EXE_codect").to_string()
}

fn codect(dir: &Path, args: &[&str]) -> Output {
    Command::new(codect_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("CODECT_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run codect")
}

fn codect_with_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(codect_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("CODECT_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn codect");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for codect")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| panic!("bad JSON {stdout:?}: {e}"))
}

const SNIPPET: &str = "\
def calculate_total(items):
    \"\"\"Return the sum of all item prices.\"\"\"
    total = 0
    for item in items:
        total += item.price
    return total
";

#[test]
fn test_analyze_file_detailed_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("snippet.py");
    std::fs::write(&file, SNIPPET).unwrap();

    let output = codect(dir.path(), &["analyze", "-l", "python", "snippet.py"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    let result = report["result"].as_u64().unwrap();
    assert!(result == 0 || result == 1);
    assert_eq!(report["language"], "python");
    assert!(report["classification"].as_str().unwrap().contains("Code")
        || report["classification"].as_str().unwrap().starts_with("Uncertain"));
    let features = report["features"].as_object().unwrap();
    assert_eq!(features["function_count"], 1);
    assert_eq!(features["has_docstrings"], true);
    assert!(features.contains_key("confidence"));
}

#[test]
fn test_analyze_basic_mode() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.js"), "const total = items.length;\n").unwrap();

    let output = codect(dir.path(), &["analyze", "-l", "javascript", "-m", "basic", "app.js"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    let mut keys: Vec<&str> = report["features"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["comment_ratio", "token_entropy", "total_lines"]);
    assert_eq!(report["features"]["total_lines"], 1);
}

#[test]
fn test_analyze_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect_with_stdin(dir.path(), &["analyze", "--language", "py"], SNIPPET);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["features"]["total_lines"], 6);
}

#[test]
fn test_empty_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect_with_stdin(dir.path(), &["analyze", "-l", "python"], "  \n\t\n");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output), serde_json::json!({"error": "No code provided."}));
}

#[test]
fn test_unsupported_language() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect_with_stdin(dir.path(), &["analyze", "-l", "ruby"], "puts 1\n");
    assert_eq!(output.status.code(), Some(1));
    let error = stdout_json(&output)["error"].as_str().unwrap().to_string();
    assert!(error.contains("Unsupported language"), "{error}");
}

#[test]
fn test_text_errors_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect(dir.path(), &["analyze", "-l", "python", "-f", "text", "missing.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.py"));
}

#[test]
fn test_invalid_mode_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect(dir.path(), &["analyze", "-l", "python", "-m", "verbose"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("verbose"));
}

#[test]
fn test_scan_json_is_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("b.py"), SNIPPET).unwrap();
    std::fs::write(src.join("a.js"), "function f() { return 1; }\n").unwrap();
    std::fs::write(src.join("README.md"), "# docs\n").unwrap();

    let output = codect(dir.path(), &["scan", "src", "--format", "json"]);
    assert!(output.status.success());

    let reports = stdout_json(&output);
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports[0]["path"].as_str().unwrap().ends_with("a.js"));
    assert!(reports[1]["path"].as_str().unwrap().ends_with("b.py"));
    assert_eq!(reports[1]["language"], "python");
}

#[test]
fn test_scan_text_summary() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("one.py"), SNIPPET).unwrap();

    let output = codect(dir.path(), &["scan"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 files:"));
}

#[test]
fn test_scan_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect(dir.path(), &["scan", "nowhere"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Path does not exist"));
}

#[test]
fn test_weights_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = codect(dir.path(), &["weights", "-l", "python"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["language"], "python");
    assert_eq!(report["settings"]["ai_threshold"], 0.7);
    assert_eq!(report["weights"]["has_todo_comments"], -3.0);
}

#[test]
fn test_project_config_overrides_weights() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("codect.toml"),
        "[weights.python]\ntotal_lines = 100.0\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("snippet.py"), SNIPPET).unwrap();

    let weights = stdout_json(&codect(dir.path(), &["weights", "-l", "python"]));
    assert_eq!(weights["weights"]["total_lines"], 100.0);

    let output = codect(dir.path(), &["analyze", "-l", "python", "snippet.py"]);
    let report = stdout_json(&output);
    assert_eq!(report["result"], 1);
    assert_eq!(report["classification"], "AI-Generated Code");
}

#[test]
fn test_explicit_broken_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[classifier]\ntemperature = -1.0\n").unwrap();

    let output = codect(
        dir.path(),
        &["--config", config.to_str().unwrap(), "weights", "-l", "python"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("temperature"));
}

#[test]
fn test_config_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("env.toml");
    std::fs::write(&config, "[weights.javascript]\nuses_jquery = -7.5\n").unwrap();

    let output = Command::new(codect_bin())
        .args(["weights", "-l", "js"])
        .current_dir(dir.path())
        .env("CODECT_CONFIG", &config)
        .output()
        .expect("Failed to run codect");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["weights"]["uses_jquery"], -7.5);
}
