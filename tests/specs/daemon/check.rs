//! Config check specs
//!
//! Verify `dwd --check` validation output.

use crate::prelude::*;

#[test]
fn check_lists_each_configuration() {
    let project = Project::empty();
    project.file("dropwatch.toml", MINIMAL_CONFIG);

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .passes()
        .stdout_has("acme-daily\tftp\tftp.acme.example\tnext ")
        .stdout_has("ok: 1 configurations, 0 warnings");
}

#[test]
fn check_marks_inactive_configurations() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &MINIMAL_CONFIG.replace("schedule = ", "active = false\nschedule = "),
    );

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .passes()
        .stdout_has("(inactive)");
}

#[test]
fn check_rejects_invalid_schedule() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &MINIMAL_CONFIG.replace("0 2 * * *", "at two every night"),
    );

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .fails()
        .stderr_has("configuration acme-daily: invalid schedule expression");
}

#[test]
fn check_rejects_unknown_time_zone() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &MINIMAL_CONFIG.replace("America/New_York", "Atlantis/Central"),
    );

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .fails()
        .stderr_has("unknown time zone");
}

#[test]
fn check_rejects_duplicate_ids() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &format!("{MINIMAL_CONFIG}\n{MINIMAL_CONFIG}"),
    );

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .fails()
        .stderr_has("duplicate id");
}

#[test]
fn check_rejects_unknown_keys() {
    let project = Project::empty();
    project.file("dropwatch.toml", "[schedular]\npoll_interval = \"5s\"\n");

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .fails()
        .stderr_has("cannot parse");
}

#[test]
fn check_warns_about_unknown_tokens() {
    let project = Project::empty();
    project.file(
        "dropwatch.toml",
        &MINIMAL_CONFIG.replace("data_{yyyymmdd}.csv", "data_{julian}.csv"),
    );

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .passes()
        .stderr_has("warning: configuration acme-daily: {julian} is not a date token")
        .stdout_has("ok: 1 configurations, 1 warnings");
}

#[test]
fn check_accepts_empty_file() {
    let project = Project::empty();
    project.file("dropwatch.toml", "");

    project
        .dwd()
        .args(&["--check", "dropwatch.toml"])
        .passes()
        .stdout_has("ok: 0 configurations");
}
