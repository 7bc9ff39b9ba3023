// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant-owned check configurations

use crate::id::{ConfigurationId, TenantId};
use crate::schedule::ScheduleError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Remote protocol a configuration is checked over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Ftp,
    Https,
    #[serde(alias = "s3")]
    ObjectStorage,
}

impl Protocol {
    /// URL scheme used for files discovered over this protocol
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Ftp => "ftp",
            Protocol::Https => "https",
            Protocol::ObjectStorage => "s3",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Ftp => write!(f, "ftp"),
            Protocol::Https => write!(f, "https"),
            Protocol::ObjectStorage => write!(f, "object_storage"),
        }
    }
}

/// Reference to a credential held by the secret store
///
/// Only the reference travels with the configuration; the value is looked up
/// when an adapter is about to connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretRef(pub String);

impl SecretRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Host name, or bucket name for object storage
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub credential: Option<SecretRef>,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Object storage region
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible object storage
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            credential: None,
            timeout: default_timeout(),
            region: None,
            endpoint: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_credential(mut self, credential: SecretRef) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// `host` or `host:port`
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

fn default_active() -> bool {
    true
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// A tenant-scoped rule describing where, when and what to check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: ConfigurationId,
    pub tenant_id: TenantId,
    pub protocol: Protocol,
    pub connection: ConnectionSettings,
    /// Directory to look in, may contain date tokens
    pub path_pattern: String,
    /// File name to look for, may contain date tokens and `*`/`?` globs
    pub name_pattern: String,
    #[serde(alias = "schedule")]
    pub schedule_expression: String,
    /// IANA time zone the schedule and tokens are evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_due_at: Option<DateTime<Utc>>,
}

impl Configuration {
    pub fn new(
        id: impl Into<ConfigurationId>,
        tenant_id: impl Into<TenantId>,
        protocol: Protocol,
        connection: ConnectionSettings,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            protocol,
            connection,
            path_pattern: "/".to_string(),
            name_pattern: "*".to_string(),
            schedule_expression: "0 0 * * *".to_string(),
            timezone: default_timezone(),
            is_active: true,
            last_evaluated_at: None,
            next_due_at: None,
        }
    }

    pub fn with_patterns(
        mut self,
        path_pattern: impl Into<String>,
        name_pattern: impl Into<String>,
    ) -> Self {
        self.path_pattern = path_pattern.into();
        self.name_pattern = name_pattern.into();
        self
    }

    pub fn with_schedule(mut self, expression: impl Into<String>, timezone: impl Into<String>) -> Self {
        self.schedule_expression = expression.into();
        self.timezone = timezone.into();
        self
    }

    pub fn with_next_due_at(mut self, next_due_at: DateTime<Utc>) -> Self {
        self.next_due_at = Some(next_due_at);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Parsed time zone of this configuration
    pub fn zone(&self) -> Result<Tz, ScheduleError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone(self.timezone.clone()))
    }
}
