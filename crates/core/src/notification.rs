// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payloads published to downstream consumers

use crate::discovery::DiscoveredFile;
use crate::execution::{ErrorCategory, Execution, ExecutionStatus};
use crate::id::{ConfigurationId, ExecutionId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sent once per newly created discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryNotification {
    pub tenant_id: TenantId,
    pub configuration_id: ConfigurationId,
    pub file_url: String,
    pub size: Option<u64>,
    pub last_modified_remote: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
    pub idempotency_key: String,
}

impl From<&DiscoveredFile> for DiscoveryNotification {
    fn from(file: &DiscoveredFile) -> Self {
        Self {
            tenant_id: file.key.tenant_id.clone(),
            configuration_id: file.key.configuration_id.clone(),
            file_url: file.key.url.clone(),
            size: file.size,
            last_modified_remote: file.last_modified_remote,
            discovered_at: file.discovered_at,
            idempotency_key: file.key.idempotency_key(),
        }
    }
}

/// Sent once per execution reaching a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeNotification {
    pub configuration_id: ConfigurationId,
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub files_found: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
}

impl From<&Execution> for OutcomeNotification {
    fn from(execution: &Execution) -> Self {
        Self {
            configuration_id: execution.configuration_id.clone(),
            execution_id: execution.id.clone(),
            status: execution.status,
            files_found: execution.files_found,
            error_category: execution.error_category,
        }
    }
}
