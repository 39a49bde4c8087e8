mod support;

use predicates::str::contains;
use support::{parse_envelopes, TestEnv};
use taskflow::config::Config;

#[test]
fn config_init_writes_default_file() {
    let env = TestEnv::new();
    let path = env.home().join("conf").join("taskflow.toml");

    env.command()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("taskflow config init"));

    let config = Config::load(&path).expect("load written config");
    assert!(config.board.seed_samples);
    assert_eq!(config.view.sort, "createdAt");
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let env = TestEnv::new();
    let path = env.write_config("[board]\nseed_samples = false\n");

    env.command()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(contains("already exists"));

    env.command()
        .args(["config", "init", "--force", "--path"])
        .arg(&path)
        .assert()
        .success();
    assert!(Config::load(&path).expect("reload").board.seed_samples);
}

#[test]
fn config_show_reports_source_and_values() {
    let env = TestEnv::new();
    let path = env.write_config("[view]\nsort = \"alphabetical\"\n");

    let output = env
        .command()
        .args(["--json", "config", "show", "--config"])
        .arg(&path)
        .output()
        .expect("run taskflow");
    assert!(output.status.success());

    let envelopes = parse_envelopes(&output.stdout);
    let data = &envelopes[0]["data"];
    assert_eq!(envelopes[0]["command"], "config show");
    assert_eq!(data["source"], path.to_str().expect("utf8 path"));
    assert_eq!(data["config"]["view"]["sort"], "alphabetical");
    assert_eq!(data["config"]["assistant"]["timeout_secs"], 60);
}

#[test]
fn config_show_without_file_uses_defaults() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("taskflow config: defaults"))
        .stdout(contains("assistant.endpoint: (disabled)"));
}

#[test]
fn missing_explicit_config_fails_with_user_error() {
    let env = TestEnv::new();
    let missing = env.home().join("missing.toml");

    let output = env
        .command()
        .arg("--json")
        .arg("--config")
        .arg(&missing)
        .write_stdin("list\n")
        .output()
        .expect("run taskflow");
    assert_eq!(output.status.code(), Some(2));

    let envelopes = parse_envelopes(&output.stdout);
    assert_eq!(envelopes[0]["status"], "error");
    assert_eq!(envelopes[0]["command"], "shell");
    assert_eq!(
        envelopes[0]["next_steps"][0],
        format!("taskflow config init --path {}", missing.display())
    );
}

#[test]
fn invalid_explicit_config_is_rejected() {
    let env = TestEnv::new();
    let path = env.write_config("[view]\nstatus = \"someday\"\n");

    env.command()
        .arg("--config")
        .arg(&path)
        .write_stdin("list\n")
        .assert()
        .code(2)
        .stderr(contains("Invalid configuration"));
}

#[test]
fn config_from_environment_variable() {
    let env = TestEnv::new();
    let path = env.write_config("[board]\nseed_samples = false\n");

    let output = env
        .command()
        .env("TASKFLOW_CONFIG", &path)
        .arg("--json")
        .write_stdin("stats\n")
        .output()
        .expect("run taskflow");
    assert!(output.status.success());
    let envelopes = parse_envelopes(&output.stdout);
    assert_eq!(envelopes[0]["data"]["total"], 0);
}
