use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::{Value, json};
use tempfile::{Builder, TempDir};

fn write_fixture(rows: &Value) -> (TempDir, PathBuf) {
    let dir = Builder::new().prefix("cadent-feed").tempdir_in("/tmp");
    assert!(dir.is_ok());
    let dir = match dir {
        Ok(value) => value,
        Err(_) => panic!("tempdir creation failed"),
    };
    let path = dir.path().join("rows.json");
    let body = serde_json::to_string_pretty(rows);
    assert!(body.is_ok());
    if let Ok(content) = body {
        assert!(fs::write(&path, content).is_ok());
    }
    (dir, path)
}

fn feed_rows() -> Value {
    json!([
        {"txn_id": "t0", "posted_at": "2025-12-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t1", "posted_at": "2026-01-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t2", "posted_at": "2026-02-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"},
        {"txn_id": "t3", "posted_at": "2026-03-05", "amount": -15.49,
         "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"}
    ])
}

fn run_cli(args: &[&str], input: Option<&str>) -> (bool, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cadent"));
    for arg in args {
        command.arg(arg);
    }
    if input.is_some() {
        command.stdin(Stdio::piped());
    }
    command.stdout(Stdio::piped());
    command.stderr(Stdio::null());

    let spawned = command.spawn();
    assert!(spawned.is_ok());
    let Ok(mut child) = spawned else {
        return (false, String::new());
    };

    if let (Some(body), Some(stdin)) = (input, child.stdin.take()) {
        let mut handle = stdin;
        assert!(handle.write_all(body.as_bytes()).is_ok());
    }

    let output = child.wait_with_output();
    assert!(output.is_ok());
    let Ok(output) = output else {
        return (false, String::new());
    };
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
    )
}

fn parse_json(stdout: &str) -> Value {
    let parsed = serde_json::from_str::<Value>(stdout);
    assert!(parsed.is_ok(), "stdout is not JSON: {stdout}");
    parsed.unwrap_or(Value::Null)
}

#[test]
fn detect_json_reports_the_monthly_pattern() {
    let (_dir, path) = write_fixture(&feed_rows());
    let path_text = path.display().to_string();

    let (ok, stdout) = run_cli(
        &["detect", &path_text, "--as-of", "2026-03-10", "--json"],
        None,
    );
    assert!(ok);

    let payload = parse_json(&stdout);
    assert_eq!(payload["policy_version"], "detection/v1");
    assert_eq!(payload["as_of"], "2026-03-10");
    assert_eq!(payload["feed"]["rows_read"], 4);
    assert_eq!(payload["rows"][0]["merchant_group_id"], "mg_video");
    assert_eq!(payload["rows"][0]["frequency"], "monthly");
    // Median gap is 31 days (two 31-day months of the three intervals).
    assert_eq!(payload["rows"][0]["next_expected_at"], "2026-04-05");
}

#[test]
fn detect_reads_the_feed_from_stdin_with_dash() {
    let body = serde_json::to_string(&feed_rows());
    assert!(body.is_ok());
    let Ok(body) = body else {
        return;
    };

    let (ok, stdout) = run_cli(
        &["detect", "-", "--as-of", "2026-03-10", "--json"],
        Some(&body),
    );
    assert!(ok);
    let payload = parse_json(&stdout);
    assert_eq!(payload["rows"][0]["representative_amount"], 15.49);
}

#[test]
fn detect_text_output_renders_the_pattern_table() {
    let (_dir, path) = write_fixture(&feed_rows());
    let path_text = path.display().to_string();

    let (ok, stdout) = run_cli(&["detect", &path_text, "--as-of", "2026-03-10"], None);
    assert!(ok);
    assert!(stdout.starts_with("1 recurring patterns detected as of 2026-03-10."));
    assert!(stdout.contains("mg_video"));
    assert!(stdout.contains("monthly"));
    assert!(stdout.contains("Rows read:      4"));
}

#[test]
fn trace_json_exposes_stage_decisions() {
    let mut rows = feed_rows();
    if let Some(list) = rows.as_array_mut() {
        list.push(json!({
            "txn_id": "lone", "posted_at": "2026-02-20", "amount": -99.0,
            "direction": "expense", "merchant_group_id": "mg_once", "account_key": "acct"
        }));
    }
    let (_dir, path) = write_fixture(&rows);
    let path_text = path.display().to_string();

    let (ok, stdout) = run_cli(
        &["trace", &path_text, "--as-of", "2026-03-10", "--json"],
        None,
    );
    assert!(ok);

    let payload = parse_json(&stdout);
    assert_eq!(payload["ok"], true);
    let groups = payload["data"]["trace"]["groups"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().any(|group| {
        group["merchant_group_id"] == "mg_once" && group["skip"] == "below_minimum_size"
    }));
    assert!(groups.iter().any(|group| {
        group["merchant_group_id"] == "mg_video"
            && group["clusters"][0]["resolution"]["state"] == "accepted"
    }));
}

#[test]
fn excluded_rows_are_listed_without_failing_the_run() {
    let mut rows = feed_rows();
    if let Some(list) = rows.as_array_mut() {
        list.push(json!({
            "txn_id": "bad", "posted_at": "not a date", "amount": -15.49,
            "direction": "expense", "merchant_group_id": "mg_video", "account_key": "acct"
        }));
    }
    let (_dir, path) = write_fixture(&rows);
    let path_text = path.display().to_string();

    let (ok, stdout) = run_cli(
        &["detect", &path_text, "--as-of", "2026-03-10", "--json"],
        None,
    );
    assert!(ok);
    let payload = parse_json(&stdout);
    assert_eq!(payload["feed"]["rows_read"], 5);
    assert_eq!(payload["feed"]["rows_excluded"], 1);
    assert_eq!(payload["feed_issues"][0]["field"], "posted_at");
    assert_eq!(payload["rows"].as_array().map(Vec::len), Some(1));
}

#[test]
fn missing_feed_file_fails_with_the_error_contract() {
    let (ok, stdout) = run_cli(
        &["detect", "/tmp/cadent-no-such-feed.json", "--json"],
        None,
    );
    assert!(!ok);
    let payload = parse_json(&stdout);
    assert_eq!(payload["error"]["code"], "feed_read_failed");
}

#[test]
fn policy_command_reports_active_thresholds() {
    let (ok, stdout) = run_cli(&["policy"], None);
    assert!(ok);
    assert!(stdout.starts_with("Active detection policy: detection/v1"));
    assert!(stdout.contains("Minimum confidence:"));

    let (ok_json, stdout_json) = run_cli(&["policy", "--json"], None);
    assert!(ok_json);
    let payload = parse_json(&stdout_json);
    assert_eq!(payload["data"]["policy"]["biweekly_recency_floor_days"], 30.0);
}
