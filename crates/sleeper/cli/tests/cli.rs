//! Integration tests for the `sleeper` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PUBLISHED: &str = "2025-03-01T12:00:00Z";

fn sleeper(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sleeper").unwrap();
    // Keep the user's config file and log filter out of the tests
    cmd.env("SLEEPER_CONFIG", dir.join("missing.toml"))
        .env_remove("SLEEPER_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn snapshot_json(checkpoint: &str, captured_at: &str, ctr: f64, vph: f64, retention: f64) -> String {
    format!(
        r#"{{"checkpoint_id":"{checkpoint}","captured_at":"{captured_at}","ctr":{ctr},"vph":{vph},"retention":{retention}}}"#
    )
}

/// 1h through 72h for a sleeper candidate, then an explosion at 7d.
fn sleeper_sequence() -> String {
    let items = [
        snapshot_json("1h", "2025-03-01T13:00:00Z", 0.04, 15.0, 0.6),
        snapshot_json("6h", "2025-03-01T18:00:00Z", 0.04, 15.0, 0.6),
        snapshot_json("24h", "2025-03-02T12:00:00Z", 0.04, 15.0, 0.6),
        snapshot_json("48h", "2025-03-03T12:00:00Z", 0.04, 15.0, 0.6),
        snapshot_json("72h", "2025-03-04T12:00:00Z", 0.042, 18.0, 0.65),
        snapshot_json("7d", "2025-03-08T12:00:00Z", 0.091, 36.0, 0.64),
    ];
    format!("[{}]", items.join(","))
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    sleeper(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("hits"));
}

#[test]
fn test_replay_json_reports_explosion() {
    let dir = TempDir::new().unwrap();
    let snapshots = write(dir.path(), "snapshots.json", &sleeper_sequence());

    let output = sleeper(dir.path())
        .args(["--output", "json", "replay", "--video-id", "abc123"])
        .args(["--published-at", PUBLISHED])
        .arg(&snapshots)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = value["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 6);
    assert_eq!(reports[4]["action"], "extend");
    assert_eq!(
        reports[4]["long_term_reason"],
        "high_retention_65.0%_low_ctr_4.2%"
    );
    assert_eq!(reports[5]["action"], "detect_explosion_continue");
    assert_eq!(reports[5]["growth_percent"], 116.7);
    assert_eq!(reports[0]["health"]["status"], "waiting_indexing");
    assert_eq!(reports[2]["health"]["status"], "monitoring_neutral");
    assert_eq!(reports[2]["health"]["priority"], "info");
    assert!(reports[2]["diagnosis"]["explanation"].is_string());
    assert_eq!(value["record"]["status"], "monitoring");
    assert_eq!(value["record"]["checkpoint"], "15d");
    assert!(value["rejected"].as_array().unwrap().is_empty());
}

#[test]
fn test_replay_table_warns_on_rejections() {
    let dir = TempDir::new().unwrap();
    let items = [
        snapshot_json("1h", "2025-03-01T13:00:00Z", 0.04, 15.0, 0.6),
        snapshot_json("1h", "2025-03-01T13:05:00Z", 0.04, 15.0, 0.6),
        snapshot_json("24h", "2025-03-02T12:00:00Z", 0.04, 15.0, 0.6),
    ];
    let snapshots = write(dir.path(), "snapshots.json", &format!("[{}]", items.join(",")));

    sleeper(dir.path())
        .args(["replay", "--video-id", "abc123", "--published-at", PUBLISHED])
        .arg(&snapshots)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1h"))
        .stdout(predicate::str::contains("Skipped 24h"))
        .stdout(predicate::str::contains("waiting for 6h"));
}

#[test]
fn test_evaluate_write_updates_record() {
    let dir = TempDir::new().unwrap();
    let snapshots = write(dir.path(), "snapshots.json", &sleeper_sequence());
    let record = dir.path().join("record.json");

    // Build a record waiting for 7d
    sleeper(dir.path())
        .args(["--output", "json", "replay", "--video-id", "abc123"])
        .args(["--published-at", PUBLISHED])
        .arg(&snapshots)
        .arg("--save")
        .arg(&record)
        .assert()
        .success();

    let at_15d = write(
        dir.path(),
        "15d.json",
        &snapshot_json("15d", "2025-03-16T12:00:00Z", 0.05, 20.0, 0.6),
    );
    sleeper(dir.path())
        .args(["--output", "json", "evaluate", "--write", "--record"])
        .arg(&record)
        .arg("--snapshot")
        .arg(&at_15d)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"continue\""))
        .stdout(predicate::str::contains("\"explosion_detected\": true"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&record).unwrap()).unwrap();
    assert_eq!(saved["checkpoint"], "30d");
    assert_eq!(saved["snapshots"].as_array().unwrap().len(), 7);
}

#[test]
fn test_evaluate_duplicate_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let snapshots = write(dir.path(), "snapshots.json", &sleeper_sequence());
    let record = dir.path().join("record.json");

    sleeper(dir.path())
        .args(["--output", "json", "replay", "--video-id", "abc123"])
        .args(["--published-at", PUBLISHED])
        .arg(&snapshots)
        .arg("--save")
        .arg(&record)
        .assert()
        .success();
    let before = std::fs::read_to_string(&record).unwrap();

    let again = write(
        dir.path(),
        "72h.json",
        &snapshot_json("72h", "2025-03-04T12:00:00Z", 0.042, 18.0, 0.65),
    );
    sleeper(dir.path())
        .args(["evaluate", "--write", "--record"])
        .arg(&record)
        .arg("--snapshot")
        .arg(&again)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate_checkpoint"));

    assert_eq!(std::fs::read_to_string(&record).unwrap(), before);
}

#[test]
fn test_hits_lists_exploded_records() {
    let dir = TempDir::new().unwrap();
    let snapshots = write(dir.path(), "snapshots.json", &sleeper_sequence());
    let record = dir.path().join("record.json");

    sleeper(dir.path())
        .args(["--output", "json", "replay", "--video-id", "abc123"])
        .args(["--published-at", PUBLISHED])
        .arg(&snapshots)
        .arg("--save")
        .arg(&record)
        .assert()
        .success();

    let saved = std::fs::read_to_string(&record).unwrap();
    let records = write(dir.path(), "records.json", &format!("[{}]", saved));

    sleeper(dir.path())
        .arg("hits")
        .arg(&records)
        .assert()
        .success()
        .stdout(predicate::str::contains("abc123"))
        .stdout(predicate::str::contains("+116.7%"));
}

#[test]
fn test_due_resolves_within_tolerance() {
    let dir = TempDir::new().unwrap();
    sleeper(dir.path())
        .args(["--output", "json", "due", "--published-at", PUBLISHED])
        .args(["--now", "2025-03-04T13:30:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"due\": \"72h\""));

    sleeper(dir.path())
        .args(["due", "--published-at", PUBLISHED])
        .args(["--now", "2025-03-01T15:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No checkpoint due"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "profile = \"viral\"\n\n[thresholds]\ntraction_vph = 75.0\n",
    );

    sleeper(dir.path())
        .env("SLEEPER_CONFIG", &config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("profile = \"viral\""))
        .stdout(predicate::str::contains("traction_vph = 75.0"));
}

#[test]
fn test_profile_in_config_file_matches_profile_flag() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "profile = \"viral\"\n");

    let from_file = sleeper(dir.path())
        .env("SLEEPER_CONFIG", &config)
        .args(["--output", "json", "config"])
        .output()
        .unwrap();
    let from_flag = sleeper(dir.path())
        .args(["--output", "json", "--profile", "viral", "config"])
        .output()
        .unwrap();
    assert!(from_file.status.success());
    assert!(from_flag.status.success());

    let file_value: serde_json::Value = serde_json::from_slice(&from_file.stdout).unwrap();
    let flag_value: serde_json::Value = serde_json::from_slice(&from_flag.stdout).unwrap();
    assert_eq!(file_value["diagnosis"]["impressions_low"], 1000);
    assert_eq!(file_value, flag_value);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "[thresholds]\nexplosion_multiplier = 0.9\n",
    );

    sleeper(dir.path())
        .args(["--config"])
        .arg(&config)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("explosion_multiplier"));
}
