//! Shared helpers for the behavioral specs

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use predicates::prelude::*;

/// One configuration that validates and never touches the network in `--check`
pub const MINIMAL_CONFIG: &str = r#"
[[configuration]]
id = "acme-daily"
tenant_id = "acme"
protocol = "ftp"
path_pattern = "/files/{yyyy}/{mm}/{dd}"
name_pattern = "data_{yyyymmdd}.csv"
schedule = "0 2 * * *"
timezone = "America/New_York"
connection = { host = "ftp.acme.example", credential = "acme-ftp" }
"#;

/// Path to the dwd binary, building it when the workspace has not been built yet
pub fn dwd_bin() -> PathBuf {
    static BIN: OnceLock<PathBuf> = OnceLock::new();
    BIN.get_or_init(|| {
        let path = assert_cmd::cargo::cargo_bin("dwd");
        if !path.exists() {
            let status = std::process::Command::new(env!("CARGO"))
                .args(["build", "-p", "dw-daemon", "--bin", "dwd"])
                .status()
                .unwrap();
            assert!(status.success(), "building dwd failed");
        }
        path
    })
    .clone()
}

/// A scratch directory holding config files for one spec
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories
    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative)).unwrap_or_default()
    }

    /// The daemon binary, run from the project directory
    pub fn dwd(&self) -> Dwd {
        let mut cmd = assert_cmd::Command::new(dwd_bin());
        cmd.current_dir(self.dir.path()).env_remove("DW_CONFIG");
        Dwd { cmd }
    }
}

pub struct Dwd {
    cmd: assert_cmd::Command,
}

impl Dwd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Outcome {
        Outcome(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> Outcome {
        Outcome(self.cmd.assert().failure())
    }

    pub fn exits_with(mut self, code: i32) -> Outcome {
        Outcome(self.cmd.assert().code(code))
    }
}

pub struct Outcome(assert_cmd::assert::Assert);

impl Outcome {
    pub fn stdout_has(self, needle: &str) -> Self {
        Outcome(self.0.stdout(predicate::str::contains(needle)))
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        Outcome(self.0.stderr(predicate::str::contains(needle)))
    }
}
