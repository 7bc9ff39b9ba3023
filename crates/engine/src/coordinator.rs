// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution coordinator: one configuration check from start to outcome
//!
//! Adapter, secret and configuration failures are recorded on the
//! execution. Only storage failures that prevent recording escape as
//! [`EngineError`].

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dw_adapters::{AdapterError, ListRequest, Notifier, ProtocolAdapter, SecretResolver};
use dw_core::{
    discovery_date, token, Clock, Configuration, DiscoveredFile, DiscoveryKey,
    DiscoveryNotification, ErrorCategory, Execution, ExecutionEvent, NotificationStatus,
    OutcomeNotification, RemoteFile, SchedulerSettings,
};
use dw_storage::{Repositories, StorageError};
use tracing::Instrument;

/// Why a check stopped before completing
enum CheckError {
    Adapter(AdapterError),
    Storage(StorageError),
}

impl From<AdapterError> for CheckError {
    fn from(e: AdapterError) -> Self {
        CheckError::Adapter(e)
    }
}

impl From<StorageError> for CheckError {
    fn from(e: StorageError) -> Self {
        CheckError::Storage(e)
    }
}

/// Runs admitted executions against an adapter and records the outcome
#[derive(Clone)]
pub struct ExecutionCoordinator<R, A, N, S, C> {
    repos: R,
    adapter: A,
    notifier: N,
    secrets: S,
    clock: C,
    settings: SchedulerSettings,
}

impl<R, A, N, S, C> ExecutionCoordinator<R, A, N, S, C>
where
    R: Repositories,
    A: ProtocolAdapter,
    N: Notifier,
    S: SecretResolver,
    C: Clock,
{
    pub fn new(
        repos: R,
        adapter: A,
        notifier: N,
        secrets: S,
        clock: C,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            repos,
            adapter,
            notifier,
            secrets,
            clock,
            settings,
        }
    }

    /// Drive a persisted `Pending` execution to a terminal state
    ///
    /// Returns the terminal record. The outcome notification is sent after
    /// the record is terminal; its delivery failure is only logged.
    pub async fn run(
        &self,
        configuration: &Configuration,
        execution: Execution,
    ) -> Result<Execution, EngineError> {
        let span = tracing::info_span!(
            "execution",
            execution_id = %execution.id,
            configuration_id = %configuration.id,
            tenant_id = %configuration.tenant_id,
            protocol = %configuration.protocol,
        );
        self.run_inner(configuration, execution).instrument(span).await
    }

    async fn run_inner(
        &self,
        configuration: &Configuration,
        execution: Execution,
    ) -> Result<Execution, EngineError> {
        let running = self
            .repos
            .transition_execution(&execution.id, ExecutionEvent::Start { at: self.clock.now() })
            .await?;

        let event = match self.check(configuration, &running).await {
            Ok(files_found) => ExecutionEvent::Complete {
                at: self.clock.now(),
                files_found,
            },
            Err(CheckError::Adapter(e)) => ExecutionEvent::Fail {
                at: self.clock.now(),
                category: e.category,
                detail: e.detail,
            },
            Err(CheckError::Storage(e)) => {
                tracing::error!(error = %e, "storage failed during check");
                ExecutionEvent::Fail {
                    at: self.clock.now(),
                    category: ErrorCategory::ProtocolError,
                    detail: format!("storage: {e}"),
                }
            }
        };

        let finished = self
            .repos
            .transition_execution(&running.id, event)
            .await?;
        match (&finished.error_category, &finished.error_detail) {
            (Some(category), detail) => tracing::warn!(
                %category,
                detail = detail.as_deref().unwrap_or_default(),
                "execution failed"
            ),
            (None, _) => tracing::info!(files_found = finished.files_found, "execution completed"),
        }

        if let Err(e) = self
            .notifier
            .outcome(&OutcomeNotification::from(&finished))
            .await
        {
            tracing::warn!(error = %e, "outcome notification not delivered");
        }
        Ok(finished)
    }

    /// Resolve, list and record discoveries; returns the count of new files
    async fn check(
        &self,
        configuration: &Configuration,
        execution: &Execution,
    ) -> Result<u32, CheckError> {
        let zone = configuration
            .zone()
            .map_err(|e| AdapterError::protocol(format!("invalid configuration: {e}")))?;
        let request = self.request(configuration, execution.scheduled_for, zone);
        tracing::debug!(
            directory = %request.directory(),
            name = %request.name_pattern,
            "resolved patterns"
        );

        let credential = match &configuration.connection.credential {
            Some(reference) => Some(
                self.secrets
                    .resolve(reference)
                    .await
                    .map_err(|e| AdapterError::authentication(e.to_string()))?,
            ),
            None => None,
        };

        let files = match tokio::time::timeout(
            request.timeout,
            self.adapter.list_matching(&request, credential.as_ref()),
        )
        .await
        {
            Ok(listed) => listed?,
            Err(_) => {
                return Err(AdapterError::timeout(format!(
                    "no answer within {}s",
                    request.timeout.as_secs_f64()
                ))
                .into())
            }
        };

        let mut found = 0u32;
        for remote in &files {
            if self.record(configuration, zone, remote).await? {
                found = found.saturating_add(1);
            }
        }
        tracing::debug!(matched = files.len(), new = found, "listing recorded");
        Ok(found)
    }

    fn request(&self, configuration: &Configuration, at: DateTime<Utc>, zone: Tz) -> ListRequest {
        ListRequest {
            protocol: configuration.protocol,
            path: token::resolve(&configuration.path_pattern, at, zone),
            name_pattern: token::resolve(&configuration.name_pattern, at, zone),
            connection: configuration.connection.clone(),
            timeout: self.settings.adapter_timeout(configuration.connection.timeout),
        }
    }

    /// Record one listed file; true when it was not seen before today
    async fn record(
        &self,
        configuration: &Configuration,
        zone: Tz,
        remote: &RemoteFile,
    ) -> Result<bool, StorageError> {
        let observed_at = self.clock.now();
        let key = DiscoveryKey::new(
            configuration.tenant_id.clone(),
            configuration.id.clone(),
            remote.url.clone(),
            discovery_date(observed_at, zone),
        );
        let file = DiscoveredFile::new(key, remote, observed_at);
        if !self.repos.try_create(&file).await? {
            tracing::trace!(url = %remote.url, "already discovered");
            return Ok(false);
        }

        let status = match self
            .notifier
            .discovery(&DiscoveryNotification::from(&file))
            .await
        {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                tracing::warn!(url = %remote.url, error = %e, "discovery notification not delivered");
                NotificationStatus::Failed
            }
        };
        self.repos.set_notification_status(&file.key, status).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
