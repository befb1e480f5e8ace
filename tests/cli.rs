// ABOUTME: Smoke tests for the stolos binary.
// ABOUTME: Exercises help output, init, and config discovery failures.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("stolos")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_writes_a_template_config() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("stolos")
        .unwrap()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("stolos.yml")).unwrap();
    assert!(written.contains("environments:"));
    assert!(written.contains("foundations:"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stolos.yml"), "environments: []\n").unwrap();

    Command::cargo_bin("stolos")
        .unwrap()
        .arg("init")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    Command::cargo_bin("stolos")
        .unwrap()
        .args(["init", "--force"])
        .current_dir(dir.path())
        .assert()
        .success();
}

#[test]
fn deploy_without_config_points_at_init() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("stolos")
        .unwrap()
        .args([
            "deploy",
            "--environment",
            "sandbox",
            "--artifact",
            "app.zip",
            "--org",
            "platform",
            "--space",
            "dev",
            "--app",
            "myapp",
        ])
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("stolos init"));
}
