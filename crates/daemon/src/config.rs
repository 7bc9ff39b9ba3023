// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! ```toml
//! [daemon]
//! log_path = "dwd.log"
//! state_path = "state/dropwatch.journal"
//!
//! [scheduler]
//! poll_interval = "60s"
//! max_concurrent = 100
//!
//! [notify]
//! kind = "webhook"
//! url = "https://hooks.example.com/dropwatch"
//!
//! [[configuration]]
//! id = "acme-daily"
//! tenant_id = "acme"
//! protocol = "ftp"
//! path_pattern = "/files/{yyyy}/{mm}/{dd}"
//! name_pattern = "data_{yyyymmdd}.csv"
//! schedule = "0 2 * * *"
//! timezone = "UTC"
//! connection = { host = "ftp.acme.example", credential = "acme-ftp" }
//! ```
//!
//! Relative paths are resolved against the directory of the file.

use crate::lifecycle::LifecycleError;
use dw_core::{token, Configuration, ScheduleEvaluator, SchedulerSettings};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file when no path is given
pub const CONFIG_ENV: &str = "DW_CONFIG";

/// Config file used when neither an argument nor `DW_CONFIG` is given
pub const DEFAULT_CONFIG: &str = "dropwatch.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    #[serde(default)]
    pub daemon: DaemonSection,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default, rename = "configuration")]
    pub configurations: Vec<Configuration>,
}

/// Process-level paths and secret lookup
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSection {
    /// Log file; stderr when absent
    pub log_path: Option<PathBuf>,
    /// Journal for configurations, executions and discoveries; in-memory when absent
    pub state_path: Option<PathBuf>,
    /// Prefix of the environment variables holding credentials
    pub secret_prefix: String,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            log_path: None,
            state_path: None,
            secret_prefix: dw_adapters::secret::DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Where notifications go
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum NotifySettings {
    /// Structured log events only
    #[default]
    Log,
    /// JSON POST per notification
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout", with = "humantime_serde")]
        timeout: Duration,
    },
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(10)
}

impl DaemonConfig {
    /// Read and parse the file at `path`
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::Read(path.to_path_buf(), e))?;
        let mut config = Self::parse(&content)
            .map_err(|e| LifecycleError::Parse(path.to_path_buf(), Box::new(e)))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.daemon.log_path, &mut self.daemon.state_path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Check the whole file; returns warnings, or every error found
    pub fn validate(&self) -> Result<Vec<String>, LifecycleError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let settings = &self.scheduler;
        if settings.poll_interval.is_zero() {
            errors.push("scheduler.poll_interval must be greater than zero".to_string());
        }
        if settings.max_concurrent == 0 {
            errors.push("scheduler.max_concurrent must be at least 1".to_string());
        }
        if settings.lease_ttl.is_zero() {
            errors.push("scheduler.lease_ttl must be greater than zero".to_string());
        }

        if let NotifySettings::Webhook { url, .. } = &self.notify {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("notify.url must be an http(s) URL, got {url:?}"));
            }
        }

        let evaluator = ScheduleEvaluator::new();
        let mut seen = HashSet::new();
        for configuration in &self.configurations {
            let id = &configuration.id;
            if !seen.insert(id.clone()) {
                errors.push(format!("configuration {id}: duplicate id"));
            }
            if configuration.connection.host.trim().is_empty() {
                errors.push(format!("configuration {id}: connection.host is empty"));
            }
            if configuration.connection.timeout.is_zero() {
                errors.push(format!(
                    "configuration {id}: connection.timeout must be greater than zero"
                ));
            }
            if let Err(e) = evaluator.validate(configuration) {
                errors.push(format!("configuration {id}: {e}"));
            }
            for template in [&configuration.path_pattern, &configuration.name_pattern] {
                for unknown in token::unrecognized_tokens(template) {
                    warnings.push(format!(
                        "configuration {id}: {unknown} is not a date token and is used literally"
                    ));
                }
            }
            if configuration.connection.timeout > settings.max_adapter_timeout {
                warnings.push(format!(
                    "configuration {id}: timeout capped at {}s",
                    settings.max_adapter_timeout.as_secs()
                ));
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(LifecycleError::Invalid(errors))
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
