// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovered files and their date-scoped identity

use crate::id::{ConfigurationId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A file reported by a protocol adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub url: String,
    pub size: Option<u64>,
    pub last_modified_remote: Option<DateTime<Utc>>,
}

impl RemoteFile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: None,
            last_modified_remote: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified_remote = Some(at);
        self
    }
}

/// Composite identity of a discovery
///
/// The same URL seen again on the same discovery date is the same discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscoveryKey {
    pub tenant_id: TenantId,
    pub configuration_id: ConfigurationId,
    pub url: String,
    pub discovery_date: NaiveDate,
}

impl DiscoveryKey {
    pub fn new(
        tenant_id: TenantId,
        configuration_id: ConfigurationId,
        url: impl Into<String>,
        discovery_date: NaiveDate,
    ) -> Self {
        Self {
            tenant_id,
            configuration_id,
            url: url.into(),
            discovery_date,
        }
    }

    /// Stable key handed to downstream consumers for their own deduplication
    pub fn idempotency_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tenant_id.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.configuration_id.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.discovery_date.format("%Y-%m-%d").to_string().as_bytes());
        hex_encode(&hasher.finalize())
    }
}

/// Calendar date of `observed_at` in `zone`
pub fn discovery_date(observed_at: DateTime<Utc>, zone: Tz) -> NaiveDate {
    observed_at.with_timezone(&zone).date_naive()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Delivery state of the discovery notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A uniquely observed remote file, deduplicated per discovery date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    pub key: DiscoveryKey,
    pub size: Option<u64>,
    pub last_modified_remote: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
    pub notification_status: NotificationStatus,
}

impl DiscoveredFile {
    pub fn new(key: DiscoveryKey, remote: &RemoteFile, discovered_at: DateTime<Utc>) -> Self {
        Self {
            key,
            size: remote.size,
            last_modified_remote: remote.last_modified_remote,
            discovered_at,
            notification_status: NotificationStatus::Pending,
        }
    }
}
