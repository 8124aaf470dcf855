//! Integration tests for the `aut-runner` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn aut_runner(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("aut-runner").expect("aut-runner binary should be built");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn write_script(dir: &TempDir, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join("run.jsonl");
    fs::write(&path, lines.join("\n")).expect("write script");
    path
}

#[test]
fn test_spec_url_prints_resource_path() {
    let dir = TempDir::new().expect("create temp dir");
    aut_runner(dir.path())
        .args([
            "spec-url",
            "src/App.spec.js",
            "--namespace",
            "cypress",
            "--prefix",
            "/__cypress",
        ])
        .assert()
        .success()
        .stdout("/__cypress/cypress/iframes/src/App.spec.js\n");
}

#[test]
fn test_spec_url_empty_input_prints_empty_line() {
    let dir = TempDir::new().expect("create temp dir");
    aut_runner(dir.path())
        .args(["spec-url", ""])
        .assert()
        .success()
        .stdout("\n");
}

#[test]
fn test_replay_prints_summary() {
    let dir = TempDir::new().expect("create temp dir");
    let script = write_script(
        &dir,
        &[
            r#"{"type":"header","schema_version":1,"name":"cli"}"#,
            r#"{"type":"set_spec","absolute":"src/App.spec.js"}"#,
            r#"{"type":"ready"}"#,
            r#"{"type":"emit","event":{"event":"window:load"}}"#,
            r#"{"type":"delay","ms":1}"#,
        ],
    );

    let output = aut_runner(dir.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value =
        serde_json::from_slice(&output).expect("summary should be JSON");
    assert_eq!(summary["phase"], "stable");
    assert_eq!(summary["steps"], 4);
    assert_eq!(summary["live_frames"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(
        summary["navigation"],
        "/__cypress/iframes/src/App.spec.js"
    );

    // First run writes the example config and the log file
    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("logs").join("aut-runner.log").exists());
}

#[test]
fn test_replay_uses_config_file() {
    let dir = TempDir::new().expect("create temp dir");
    let config = dir.path().join("custom.toml");
    fs::write(&config, "namespace = \"cy\"\niframe_prefix = \"/runner\"\n").expect("write config");
    let script = write_script(
        &dir,
        &[
            r#"{"type":"header","schema_version":1}"#,
            r#"{"type":"ready"}"#,
            r#"{"type":"set_spec","absolute":"b.spec.js"}"#,
        ],
    );

    aut_runner(dir.path())
        .arg("replay")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("/runner/cy/iframes/b.spec.js"));
}

#[test]
fn test_replay_rejects_script_without_header() {
    let dir = TempDir::new().expect("create temp dir");
    let script = write_script(&dir, &[r#"{"type":"ready"}"#]);

    aut_runner(dir.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing script header"));
}

#[test]
fn test_replay_missing_script_fails() {
    let dir = TempDir::new().expect("create temp dir");
    aut_runner(dir.path())
        .arg("replay")
        .arg(dir.path().join("nope.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script"));
}
