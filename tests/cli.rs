use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn flowcheck(config_home: &Path) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("flowcheck");
    let mut cmd = Command::new(bin);
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("FLOWCHECK_FIXTURES", concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
        .env_remove("RUST_LOG")
        .env_remove("FLOWCHECK_BASE_URL");
    cmd
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output")
}

#[test]
fn list_prints_builtins_as_json() {
    let home = tempfile::tempdir().unwrap();
    let assert = flowcheck(home.path())
        .args(["--output", "json", "list"])
        .assert()
        .success();

    let names: Value = serde_json::from_str(&stdout_of(assert)).expect("valid json");
    assert_eq!(
        names,
        serde_json::json!(["authentication/can-log-in", "authentication/can-sign-up"])
    );
}

#[test]
fn show_masks_the_password() {
    let home = tempfile::tempdir().unwrap();
    let assert = flowcheck(home.path())
        .args(["show", "authentication/can-sign-up"])
        .assert()
        .success();

    let out = stdout_of(assert);
    assert!(out.contains("input#password"));
    assert!(out.contains("attach photo.jpg (image/jpeg"));
    assert!(out.contains("expect hash == \"#/log-in\""));
    assert!(!out.contains("pAssw0rd"));
}

#[test]
fn validate_accepts_sample_and_rejects_broken_file() {
    let home = tempfile::tempdir().unwrap();
    let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/authentication.yaml");
    flowcheck(home.path())
        .args(["validate", sample])
        .assert()
        .success();

    let broken = home.path().join("broken.yaml");
    std::fs::write(
        &broken,
        "scenarios:\n  - name: x\n    steps:\n      - action: navigate\n        path: log-in\n    expect:\n      hash: \"#/\"\n",
    )
    .unwrap();
    let assert = flowcheck(home.path())
        .args(["--output", "json", "validate", broken.to_str().unwrap()])
        .assert()
        .failure();

    let results: Value = serde_json::from_str(&stdout_of(assert)).expect("valid json");
    assert_eq!(results[0]["valid"], false);
    assert!(results[0]["error"]
        .as_str()
        .unwrap()
        .contains("must start with `/`"));
}

#[test]
fn unknown_builtin_fails() {
    let home = tempfile::tempdir().unwrap();
    flowcheck(home.path())
        .args(["show", "authentication/can-fly"])
        .assert()
        .code(1);
}

#[test]
fn usage_errors_exit_with_two() {
    let home = tempfile::tempdir().unwrap();
    flowcheck(home.path()).args(["launch"]).assert().code(2);
}

#[test]
fn info_reports_version() {
    let home = tempfile::tempdir().unwrap();
    let assert = flowcheck(home.path()).arg("info").assert().success();
    let out = stdout_of(assert);
    assert!(out.contains(concat!("flowcheck ", env!("CARGO_PKG_VERSION"))));
    assert!(out.contains("base url:   http://localhost:8080"));
}
