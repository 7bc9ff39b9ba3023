//! Daemon lifecycle specs
//!
//! Start the real binary, wait for READY, stop it with SIGTERM.

use std::io::{BufRead, BufReader};
use std::process::{Child, Stdio};

use crate::prelude::*;

const DAEMON_CONFIG: &str = r#"
[daemon]
log_path = "logs/dwd.log"
state_path = "state/dw.journal"

[scheduler]
poll_interval = "1s"
"#;

fn spawn_daemon(project: &Project) -> Child {
    let mut child = std::process::Command::new(dwd_bin())
        .arg("dropwatch.toml")
        .current_dir(project.path())
        .env_remove("DW_CONFIG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "READY");
    child
}

fn terminate(child: &mut Child) -> std::process::ExitStatus {
    let status = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    child.wait().unwrap()
}

#[test]
fn daemon_stops_cleanly_on_sigterm() {
    let project = Project::empty();
    project.file("dropwatch.toml", &format!("{DAEMON_CONFIG}{MINIMAL_CONFIG}"));

    let mut child = spawn_daemon(&project);
    let status = terminate(&mut child);

    assert!(status.success());
    let log = project.read("logs/dwd.log");
    assert!(log.contains("--- dwd: starting (pid: "));
    assert!(log.contains("Daemon ready"));
    assert!(log.contains("Daemon stopped"));
    assert!(!project.path().join("state/dw.journal.lock").exists());
}

#[test]
fn second_daemon_on_same_state_fails() {
    let project = Project::empty();
    project.file("dropwatch.toml", DAEMON_CONFIG);

    let mut first = spawn_daemon(&project);

    project
        .dwd()
        .args(&["dropwatch.toml"])
        .fails()
        .stderr_has("is locked");

    assert!(terminate(&mut first).success());
}

#[test]
fn daemon_refuses_invalid_config() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &format!("{DAEMON_CONFIG}{}", MINIMAL_CONFIG.replace("0 2 * * *", "bogus")),
    );

    project
        .dwd()
        .args(&["dropwatch.toml"])
        .fails()
        .stderr_has("invalid configuration");
}
