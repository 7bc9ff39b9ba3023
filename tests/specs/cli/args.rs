//! Command line specs
//!
//! Verify argument handling and exit codes.

use crate::prelude::*;

#[test]
fn version_prints_package_version() {
    Project::empty()
        .dwd()
        .args(&["--version"])
        .passes()
        .stdout_has(concat!("dwd ", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_shows_usage() {
    Project::empty()
        .dwd()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage: dwd [OPTIONS] [CONFIG]")
        .stdout_has("--check")
        .stdout_has("DW_CONFIG");
}

#[test]
fn unknown_flag_exits_with_usage_error() {
    Project::empty()
        .dwd()
        .args(&["--frobnicate"])
        .exits_with(2)
        .stderr_has("unexpected argument '--frobnicate'")
        .stderr_has("Usage: dwd");
}

#[test]
fn extra_positional_exits_with_usage_error() {
    Project::empty()
        .dwd()
        .args(&["--check", "a.toml", "b.toml"])
        .exits_with(2);
}

#[test]
fn missing_config_file_fails() {
    Project::empty()
        .dwd()
        .args(&["--check", "nowhere.toml"])
        .fails()
        .stderr_has("cannot read nowhere.toml");
}

#[test]
fn config_path_defaults_to_environment() {
    let project = Project::empty();
    project.file("conf/dw.toml", MINIMAL_CONFIG);

    project
        .dwd()
        .env("DW_CONFIG", "conf/dw.toml")
        .args(&["--check"])
        .passes()
        .stdout_has("ok: 1 configurations");
}

#[test]
fn config_path_defaults_to_working_directory() {
    let project = Project::empty();
    project.file("dropwatch.toml", MINIMAL_CONFIG);

    project
        .dwd()
        .args(&["--check"])
        .passes()
        .stdout_has("acme-daily");
}
