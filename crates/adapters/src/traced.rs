// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{Notifier, NotifyError};
use crate::protocol::{AdapterError, ListRequest, ProtocolAdapter};
use crate::secret::Credential;
use async_trait::async_trait;
use dw_core::{DiscoveryNotification, OutcomeNotification, RemoteFile};
use tracing::Instrument;

/// Wrapper that adds tracing to any ProtocolAdapter
#[derive(Clone)]
pub struct TracedProtocolAdapter<A> {
    inner: A,
}

impl<A> TracedProtocolAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: ProtocolAdapter> ProtocolAdapter for TracedProtocolAdapter<A> {
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError> {
        let span = tracing::info_span!(
            "protocol.list",
            protocol = %request.protocol,
            host = %request.connection.host,
            path = %request.path,
        );

        async {
            tracing::debug!(
                name_pattern = %request.name_pattern,
                timeout_ms = request.timeout.as_millis() as u64,
                authenticated = credential.is_some(),
                "listing"
            );

            let start = std::time::Instant::now();
            let result = self.inner.list_matching(request, credential).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(files) => tracing::info!(
                    count = files.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "listed"
                ),
                Err(e) => tracing::warn!(
                    category = %e.category,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e.detail,
                    "listing failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any Notifier
#[derive(Clone)]
pub struct TracedNotifier<N> {
    inner: N,
}

impl<N> TracedNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for TracedNotifier<N> {
    async fn discovery(&self, n: &DiscoveryNotification) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.discovery",
            configuration_id = %n.configuration_id,
            file_url = %n.file_url,
        );

        let result = self.inner.discovery(n).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(()) => tracing::debug!("delivered"),
            Err(e) => tracing::warn!(error = %e, "delivery failed"),
        });
        result
    }

    async fn outcome(&self, n: &OutcomeNotification) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.outcome",
            execution_id = %n.execution_id,
            status = %n.status,
        );

        let result = self.inner.outcome(n).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(()) => tracing::debug!("delivered"),
            Err(e) => tracing::warn!(error = %e, "delivery failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
