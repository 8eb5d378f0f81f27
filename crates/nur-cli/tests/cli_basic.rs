//! Basic CLI tests.
//!
//! Each test runs the built `nur` binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_nur"))
        .args(args)
        .env("NUR_DATA_DIR", data_dir)
        .env_remove("NUR_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_methods_list() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["methods"]);
    assert!(out.contains("Muslim World League"));
    assert!(out.contains("Umm Al-Qura"));
    // Default method is marked.
    assert!(out.lines().any(|l| l.starts_with("*  3")));
}

#[test]
fn test_methods_recommended_for_country() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["methods", "--country", "eg"]);
    assert!(out.contains("Egyptian General Authority of Survey"));
    let out = run_cli_success(dir.path(), &["methods", "--country", "ZZ"]);
    assert!(out.contains("Muslim World League"));
}

#[test]
fn test_config_path_is_inside_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["config", "path"]);
    assert!(out.trim().starts_with(dir.path().to_str().unwrap()));
    assert!(out.trim().ends_with("config.toml"));
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "calculation_method"]).trim(),
        "3"
    );
    run_cli_success(dir.path(), &["config", "set", "calculation_method", "5"]);
    run_cli_success(dir.path(), &["config", "set", "reminders.lead_minutes.Isha", "15"]);

    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "calculation_method"]).trim(),
        "5"
    );
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "reminders.lead_minutes.Isha"]).trim(),
        "15"
    );

    let list = run_cli_success(dir.path(), &["config", "list"]);
    let json: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(json["calculation_method"], 5);
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "calculation_method", "6"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "clock.utc_offset", "soon"]);
    assert_ne!(code, 0);
}

#[test]
fn test_location_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        dir.path(),
        &["location", "set", "--lat", "21.4225", "--lon", "39.8262", "--city", "Mecca"],
    );
    assert!(out.contains("cleared"));
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "location.city"]).trim(),
        "Mecca"
    );
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "location.is_manual"]).trim(),
        "true"
    );

    let (_, _, code) = run_cli(
        dir.path(),
        &["location", "set", "--lat", "95", "--lon", "0", "--city", "Nowhere"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_cache_commands_on_empty_cache() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_cli_success(dir.path(), &["cache", "clear"]).contains("removed 0"));
    assert!(run_cli_success(dir.path(), &["cache", "evict", "--days", "7"]).contains("removed 0"));
    assert!(run_cli_success(dir.path(), &["cache", "stats"]).contains("0 cached"));
}

#[test]
fn test_today_reports_unreachable_source() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(
        dir.path(),
        &["config", "set", "timing_source.base_url", "http://127.0.0.1:1/v1/timings"],
    );
    run_cli_success(dir.path(), &["config", "set", "timing_source.timeout_secs", "2"]);

    let (_, stderr, code) = run_cli(dir.path(), &["today"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unreachable"), "stderr: {stderr}");
}
