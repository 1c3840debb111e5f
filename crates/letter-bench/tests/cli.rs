use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const CONFIG: &str = r#"
run_id: "cli"
games:
  seed: 1
  games: 2
agents:
  - name: "heuristic"
    kind: "heuristic"
  - name: "random"
    kind: "random"
outputs:
  jsonl: "OUT/{run_id}/games.jsonl"
  summary_md: "OUT/{run_id}/summary.md"
metrics:
  baseline: "heuristic"
"#;

#[test]
fn validate_only_skips_the_tournament() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("bench.yaml");
    let out = dir.path().join("out");
    fs::write(&config, CONFIG.replace("OUT", &out.display().to_string())).expect("write config");

    Command::cargo_bin("letter-bench")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation-only mode"));

    assert!(!out.join("cli").join("games.jsonl").exists());
}

#[test]
fn overrides_apply_before_the_run() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("bench.yaml");
    let out = dir.path().join("out");
    fs::write(&config, CONFIG.replace("OUT", &out.display().to_string())).expect("write config");

    Command::cargo_bin("letter-bench")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .args(["--games", "1", "--run-id", "override"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 games × 2 rotations → 4 rows"));

    let rows = fs::read_to_string(out.join("override").join("games.jsonl")).expect("rows written");
    assert_eq!(rows.lines().count(), 4);
}

#[test]
fn invalid_config_fails() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("bench.yaml");
    fs::write(&config, CONFIG.replace("baseline: \"heuristic\"", "baseline: \"nobody\"")).expect("write config");

    Command::cargo_bin("letter-bench")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("metrics.baseline"));
}
