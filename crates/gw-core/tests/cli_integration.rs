//! Integration tests for the `gridworld` binary.
//!
//! These run the built binary end to end with an isolated config home, so a
//! per-user config file never leaks into the results.

use std::path::Path;
use std::process::{Command, Output};

fn gridworld(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gridworld"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute gridworld")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn runs_with_no_arguments() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = stdout(&output);
    assert!(out.starts_with("value iteration: converged"), "{out}");
    assert!(out.contains("Policy"));
    assert!(!out.contains('\x1b'), "NO_COLOR should strip escapes");
}

#[test]
fn policy_iteration_matches_value_iteration_in_json() {
    let home = tempfile::tempdir().unwrap();
    let vi = gridworld(home.path(), &["--format", "json", "--epsilon", "1e-6"]);
    let pi = gridworld(
        home.path(),
        &["--format", "json", "--algorithm", "policy", "--epsilon", "1e-6"],
    );
    assert!(vi.status.success() && pi.status.success());

    let vi: serde_json::Value = serde_json::from_str(&stdout(&vi)).unwrap();
    let pi: serde_json::Value = serde_json::from_str(&stdout(&pi)).unwrap();
    assert_eq!(vi["algorithm"], "value");
    assert_eq!(pi["algorithm"], "policy");
    assert_eq!(vi["policy"], pi["policy"]);
}

#[test]
fn negative_step_reward_flag() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--format", "json", "--step-reward", "-2"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["params"]["step_reward"], -2.0);
}

#[test]
fn reads_explicit_config_file() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("corridor.toml");
    std::fs::write(
        &config,
        r#"
[world]
cols = 3
rows = 1
obstacles = []
terminals = [{ cell = [3, 1], reward = 1.0 }]

[mdp]
gamma = 0.5
step_reward = 0.0
noise = 0.0

[output]
format = "json"
"#,
    )
    .unwrap();

    let output = gridworld(home.path(), &["--config", config.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["utilities"][0]["cell"], serde_json::json!([1, 1]));
    assert_eq!(json["utilities"][0]["utility"], 0.25);
    assert_eq!(json["utilities"][1]["utility"], 0.5);
}

#[test]
fn user_config_is_picked_up() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("gridworld");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[solver]\nalgorithm = \"policy\"\n").unwrap();

    let output = gridworld(home.path(), &[]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("policy iteration:"));
}

#[test]
fn malformed_user_config_falls_back_to_defaults() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("gridworld");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[solver\n").unwrap();

    let output = gridworld(home.path(), &[]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("value iteration:"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("using defaults"));
}

#[test]
fn missing_explicit_config_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--config", "/nonexistent/gridworld.toml"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: failed to read"), "{stderr}");
}

#[test]
fn invalid_gamma_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--gamma", "1.5"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("gamma must be within [0, 1]"));
}

#[test]
fn usage_error_exits_two() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--algorithm", "sarsa"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn strict_fails_without_convergence() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--strict", "--max-iterations", "1"]);
    assert_eq!(output.status.code(), Some(3));
    // results are still printed
    assert!(stdout(&output).contains("without converging"));

    let lenient = gridworld(home.path(), &["--max-iterations", "1"]);
    assert!(lenient.status.success());
}

#[test]
fn history_and_q_values_sections() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--history", "--q-values"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("\nHistory\n"));
    assert!(out.contains("\nQ-values\n"));
}

#[test]
fn writes_report_to_output_path() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("out").join("report.json");
    let output = gridworld(home.path(), &["--output", path.to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["world"]["rows"], 3);
}

#[test]
fn strict_fails_when_utilities_overflow() {
    let home = tempfile::tempdir().unwrap();
    let output = gridworld(home.path(), &["--strict", "--step-reward", "1e308"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).contains("without converging"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("diverged"));
}
