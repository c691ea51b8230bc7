//! Command line behavior of the `clipsync` binary.
//!
//! Only failure paths are exercised here: a successful `relay` or `peer`
//! runs until interrupted.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn clipsync() -> Command {
    let mut cmd = Command::cargo_bin("clipsync").unwrap();
    cmd.env_remove("CLIPSYNC_SECRET").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    clipsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("relay"))
        .stdout(predicate::str::contains("peer"));
}

#[test]
fn relay_without_secret_fails() {
    clipsync()
        .arg("relay")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CLIPSYNC_SECRET"));
}

#[test]
fn peer_without_secret_fails() {
    clipsync()
        .args(["peer", "ws://127.0.0.1:8765"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No shared secret"));
}

#[test]
fn empty_secret_fails() {
    clipsync()
        .args(["--secret", "", "relay"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No shared secret"));
}

#[test]
fn peer_without_url_fails() {
    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .arg("peer")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn non_websocket_url_fails() {
    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .args(["peer", "http://127.0.0.1:8765"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ws://"));
}

#[test]
fn zero_poll_interval_fails() {
    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .args(["peer", "ws://127.0.0.1:8765", "--poll-ms", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll interval"));
}

#[test]
fn invalid_port_fails() {
    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .args(["relay", "--port", "not-a-port"])
        .assert()
        .failure();
}

#[test]
fn missing_config_file_fails() {
    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .args(["--config", "/nonexistent/clipsync.toml", "relay"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn malformed_config_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[relay\nport = ").unwrap();

    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .arg("--config")
        .arg(file.path())
        .arg("relay")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn invalid_config_value_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[relay]\nmax_message_size = 0").unwrap();

    clipsync()
        .env("CLIPSYNC_SECRET", "k")
        .arg("--config")
        .arg(file.path())
        .arg("relay")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_message_size"));
}
