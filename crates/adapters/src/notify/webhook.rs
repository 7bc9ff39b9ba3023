// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier that POSTs JSON to an HTTP endpoint

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use dw_core::{DiscoveryNotification, OutcomeNotification};
use serde_json::json;
use std::time::Duration;

const DISCOVERY_EVENT: &str = "file.discovered";
const OUTCOME_EVENT: &str = "execution.finished";

/// POSTs `{"type": ..., "data": ...}` envelopes with an `Idempotency-Key` header
///
/// Discoveries use their date-scoped idempotency key, outcomes use the
/// execution id. Delivery is attempted once.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    async fn post(&self, key: String, body: serde_json::Value) -> Result<(), NotifyError> {
        let body = serde_json::to_string(&body).map_err(|e| NotifyError::Encode(e.to_string()))?;
        let url = self.url.clone();
        let timeout = self.timeout;
        let send = tokio::task::spawn_blocking(move || {
            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .http_status_as_error(false)
                .build();
            let agent = ureq::Agent::new_with_config(config);
            let response = agent
                .post(&url)
                .header("Content-Type", "application/json")
                .header("Idempotency-Key", &key)
                .send(body)
                .map_err(|e| NotifyError::Delivery(e.to_string()))?;
            let status = response.status().as_u16();
            if (200..300).contains(&status) {
                Ok(())
            } else {
                Err(NotifyError::Rejected(status))
            }
        });
        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(NotifyError::Delivery(join.to_string())),
            Err(_) => Err(NotifyError::Delivery(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn discovery(&self, n: &DiscoveryNotification) -> Result<(), NotifyError> {
        let body = json!({ "type": DISCOVERY_EVENT, "data": n });
        self.post(n.idempotency_key.clone(), body).await
    }

    async fn outcome(&self, n: &OutcomeNotification) -> Result<(), NotifyError> {
        let body = json!({ "type": OUTCOME_EVENT, "data": n });
        self.post(n.execution_id.to_string(), body).await
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
