//! Smoke tests to verify command wiring

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn pgledger() -> Command {
    let mut cmd = Command::cargo_bin("pgledger").unwrap();
    cmd.env_remove("PGLEDGER_CONFIG")
        .env_remove("PGLEDGER_POSTGRES_PASSWORD")
        .env_remove("PGLEDGER_PORT");
    cmd
}

#[test]
fn test_help_lists_commands() {
    pgledger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_serve_help() {
    pgledger()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Port to listen on"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_migrate_help() {
    pgledger()
        .arg("migrate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("YAML configuration file"));
}

#[test]
fn test_check_config_masks_password() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "postgres_password: hunter2\nport: 9191").unwrap();

    pgledger()
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 9191"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_check_config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();

    pgledger()
        .arg("check-config")
        .arg("--config")
        .arg(dir.path().join("missing.yml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 8080"))
        .stderr(predicate::str::contains("using defaults"));
}

#[test]
fn test_check_config_rejects_bad_level() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "loglevel: loud").unwrap();

    pgledger()
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure();
}
