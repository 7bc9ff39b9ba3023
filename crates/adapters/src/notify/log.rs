// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier that writes to the structured log

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use dw_core::{DiscoveryNotification, OutcomeNotification};

/// Emits every notification as a tracing event under `dropwatch::notify`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn discovery(&self, n: &DiscoveryNotification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "dropwatch::notify",
            tenant_id = %n.tenant_id,
            configuration_id = %n.configuration_id,
            file_url = %n.file_url,
            size = ?n.size,
            idempotency_key = %n.idempotency_key,
            "file discovered"
        );
        Ok(())
    }

    async fn outcome(&self, n: &OutcomeNotification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "dropwatch::notify",
            configuration_id = %n.configuration_id,
            execution_id = %n.execution_id,
            status = %n.status,
            files_found = n.files_found,
            error_category = ?n.error_category,
            "execution finished"
        );
        Ok(())
    }
}
