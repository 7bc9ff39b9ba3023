// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository and lease store contracts consumed by the scheduler

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dw_core::{
    Configuration, ConfigurationId, DiscoveredFile, DiscoveryKey, Execution, ExecutionEvent,
    ExecutionId, HolderId, NotificationStatus,
};
use std::time::Duration;

/// Tenant configurations
#[async_trait]
pub trait ConfigurationRepository: Clone + Send + Sync + 'static {
    /// Every configuration with `is_active` set
    async fn list_active(&self) -> Result<Vec<Configuration>, StorageError>;

    async fn get_configuration(
        &self,
        id: &ConfigurationId,
    ) -> Result<Option<Configuration>, StorageError>;

    /// Insert or replace, including evaluation timestamps
    async fn save(&self, configuration: &Configuration) -> Result<(), StorageError>;
}

/// Execution records
#[async_trait]
pub trait ExecutionRepository: Clone + Send + Sync + 'static {
    /// Persist a new execution; fails if the id is taken
    async fn create_execution(&self, execution: &Execution) -> Result<(), StorageError>;

    /// Apply `event` to the stored record and return the new record
    async fn transition_execution(
        &self,
        id: &ExecutionId,
        event: ExecutionEvent,
    ) -> Result<Execution, StorageError>;

    async fn get_execution(&self, id: &ExecutionId) -> Result<Option<Execution>, StorageError>;

    /// Executions of one configuration, oldest scheduled first
    async fn executions_for(
        &self,
        id: &ConfigurationId,
    ) -> Result<Vec<Execution>, StorageError>;

    /// Delete terminal executions completed before `before`; returns how many
    async fn prune_terminal_before(&self, before: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// Discovered files, unique on their composite identity
#[async_trait]
pub trait DiscoveryRepository: Clone + Send + Sync + 'static {
    /// Insert unless the identity exists; true when this call created it
    ///
    /// Check and insert happen atomically, so concurrent callers with the
    /// same identity see exactly one `true`.
    async fn try_create(&self, file: &DiscoveredFile) -> Result<bool, StorageError>;

    async fn set_notification_status(
        &self,
        key: &DiscoveryKey,
        status: NotificationStatus,
    ) -> Result<(), StorageError>;

    /// Discoveries of one configuration, in identity order
    async fn discoveries_for(
        &self,
        id: &ConfigurationId,
    ) -> Result<Vec<DiscoveredFile>, StorageError>;

    /// Delete discoveries dated before `before`; returns how many
    async fn prune_discoveries_before(&self, before: NaiveDate) -> Result<usize, StorageError>;
}

/// Housekeeping for stores that keep a durable log
#[async_trait]
pub trait StoreMaintenance: Clone + Send + Sync + 'static {
    /// Rewrite the log from live state when `pruned` records were just
    /// deleted or the log has outgrown its threshold; true when rewritten
    async fn maintain(&self, pruned: usize) -> Result<bool, StorageError>;
}

/// The three repositories behind one handle
pub trait Repositories:
    ConfigurationRepository + ExecutionRepository + DiscoveryRepository + StoreMaintenance
{
}

impl<T> Repositories for T where
    T: ConfigurationRepository + ExecutionRepository + DiscoveryRepository + StoreMaintenance
{
}

/// Time-bound locks shared between scheduler instances
///
/// Any store with conditional writes can back this.
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// Take the lease if free or expired; false when someone else holds it
    async fn acquire(
        &self,
        key: &str,
        holder: &HolderId,
        ttl: Duration,
    ) -> Result<bool, StorageError>;

    /// Extend a lease still held by `holder`; false when it was lost
    async fn renew(&self, key: &str, holder: &HolderId, ttl: Duration)
        -> Result<bool, StorageError>;

    /// Give the lease up; a no-op unless `holder` holds it
    async fn release(&self, key: &str, holder: &HolderId) -> Result<(), StorageError>;
}
