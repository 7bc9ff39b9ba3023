// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process repository backed by [`StoreState`], optionally journaled

use crate::error::StorageError;
use crate::journal::Journal;
use crate::repository::{
    ConfigurationRepository, DiscoveryRepository, ExecutionRepository, StoreMaintenance,
};
use crate::state::{StoreOp, StoreState};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dw_core::{
    Configuration, ConfigurationId, DiscoveredFile, DiscoveryKey, Execution, ExecutionEvent,
    ExecutionId, NotificationStatus,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Journal entries tolerated before a rewrite, unless live records need more
pub const DEFAULT_COMPACTION_THRESHOLD: u64 = 10_000;

struct Inner {
    state: StoreState,
    journal: Option<Journal>,
    compaction_threshold: u64,
}

impl Inner {
    /// Journal first, then apply, so a visible change is always durable
    fn commit(&mut self, op: StoreOp) -> Result<(), StorageError> {
        if let Some(journal) = self.journal.as_mut() {
            journal.append(&op)?;
        }
        self.state.apply(&op);
        Ok(())
    }

    /// Rewrite the journal when records were pruned or it grew past the
    /// threshold; a compacted journal of many live records is left alone
    fn compact_if_due(&mut self, pruned: usize) -> Result<bool, StorageError> {
        let Inner {
            state,
            journal,
            compaction_threshold,
        } = self;
        let Some(journal) = journal.as_mut() else {
            return Ok(false);
        };
        let live = state.record_count() as u64;
        let overgrown = journal.sequence() > (*compaction_threshold).max(live.saturating_mul(2));
        if pruned == 0 && !overgrown {
            return Ok(false);
        }
        let before = journal.sequence();
        journal.compact(state)?;
        tracing::info!(
            pruned,
            entries_before = before,
            entries_after = journal.sequence(),
            "journal compacted"
        );
        Ok(true)
    }
}

/// Shared store implementing every repository contract
///
/// All operations take one lock, which makes `try_create` atomic with
/// respect to concurrent executions.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A volatile store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: StoreState::default(),
                journal: None,
                compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            })),
        }
    }

    /// A store that replays and then appends to the journal at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut state = StoreState::default();
        let ops = Journal::replay(path)?;
        for op in &ops {
            state.apply(op);
        }
        let journal = Journal::open(path)?;
        tracing::info!(
            path = %path.display(),
            replayed = ops.len(),
            configurations = state.configurations.len(),
            discoveries = state.discoveries.len(),
            "store opened"
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                journal: Some(journal),
                compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            })),
        })
    }

    /// Journal length that triggers a rewrite during maintenance
    pub fn with_compaction_threshold(self, entries: u64) -> Self {
        self.lock().compaction_threshold = entries;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rewrite the journal from current state; a no-op for volatile stores
    pub fn compact(&self) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let Inner { state, journal, .. } = &mut *inner;
        if let Some(journal) = journal.as_mut() {
            journal.compact(state)?;
        }
        Ok(())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> StoreState {
        self.lock().state.clone()
    }
}

#[async_trait]
impl ConfigurationRepository for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Configuration>, StorageError> {
        Ok(self
            .lock()
            .state
            .configurations
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn get_configuration(
        &self,
        id: &ConfigurationId,
    ) -> Result<Option<Configuration>, StorageError> {
        Ok(self.lock().state.configurations.get(id).cloned())
    }

    async fn save(&self, configuration: &Configuration) -> Result<(), StorageError> {
        self.lock().commit(StoreOp::ConfigurationSave {
            configuration: configuration.clone(),
        })
    }
}

#[async_trait]
impl ExecutionRepository for MemoryStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.state.executions.contains_key(&execution.id) {
            return Err(StorageError::AlreadyExists(execution.id.to_string()));
        }
        inner.commit(StoreOp::ExecutionPut {
            execution: execution.clone(),
        })
    }

    async fn transition_execution(
        &self,
        id: &ExecutionId,
        event: ExecutionEvent,
    ) -> Result<Execution, StorageError> {
        let mut inner = self.lock();
        let current = inner
            .state
            .executions
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let next = current.transition(event)?;
        inner.commit(StoreOp::ExecutionPut {
            execution: next.clone(),
        })?;
        Ok(next)
    }

    async fn get_execution(&self, id: &ExecutionId) -> Result<Option<Execution>, StorageError> {
        Ok(self.lock().state.executions.get(id).cloned())
    }

    async fn executions_for(&self, id: &ConfigurationId) -> Result<Vec<Execution>, StorageError> {
        let mut executions: Vec<_> = self
            .lock()
            .state
            .executions
            .values()
            .filter(|e| &e.configuration_id == id)
            .cloned()
            .collect();
        executions.sort_by(|a, b| {
            a.scheduled_for
                .cmp(&b.scheduled_for)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(executions)
    }

    async fn prune_terminal_before(&self, before: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut inner = self.lock();
        let count = inner.state.prunable(before);
        if count > 0 {
            inner.commit(StoreOp::ExecutionsPruned { before })?;
        }
        Ok(count)
    }
}

#[async_trait]
impl DiscoveryRepository for MemoryStore {
    async fn try_create(&self, file: &DiscoveredFile) -> Result<bool, StorageError> {
        let mut inner = self.lock();
        if inner.state.has_discovery(&file.key) {
            return Ok(false);
        }
        inner.commit(StoreOp::DiscoveryCreate { file: file.clone() })?;
        Ok(true)
    }

    async fn set_notification_status(
        &self,
        key: &DiscoveryKey,
        status: NotificationStatus,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if !inner.state.has_discovery(key) {
            return Err(StorageError::NotFound(key.url.clone()));
        }
        inner.commit(StoreOp::NotificationStatus {
            key: key.clone(),
            status,
        })
    }

    async fn discoveries_for(
        &self,
        id: &ConfigurationId,
    ) -> Result<Vec<DiscoveredFile>, StorageError> {
        Ok(self
            .lock()
            .state
            .discoveries
            .values()
            .filter(|f| &f.key.configuration_id == id)
            .cloned()
            .collect())
    }

    async fn prune_discoveries_before(&self, before: NaiveDate) -> Result<usize, StorageError> {
        let mut inner = self.lock();
        let count = inner.state.prunable_discoveries(before);
        if count > 0 {
            inner.commit(StoreOp::DiscoveriesPruned { before })?;
        }
        Ok(count)
    }
}

#[async_trait]
impl StoreMaintenance for MemoryStore {
    async fn maintain(&self, pruned: usize) -> Result<bool, StorageError> {
        self.lock().compact_if_due(pruned)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
