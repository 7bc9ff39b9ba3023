// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized store state, rebuilt by replaying journal operations

use chrono::{DateTime, NaiveDate, Utc};
use dw_core::{
    Configuration, ConfigurationId, DiscoveredFile, DiscoveryKey, Execution, ExecutionId,
    NotificationStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A durable mutation of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    ConfigurationSave {
        configuration: Configuration,
    },
    /// Insert or replace an execution record
    ExecutionPut {
        execution: Execution,
    },
    DiscoveryCreate {
        file: DiscoveredFile,
    },
    NotificationStatus {
        key: DiscoveryKey,
        status: NotificationStatus,
    },
    /// Drop terminal executions completed before `before`
    ExecutionsPruned {
        before: DateTime<Utc>,
    },
    /// Drop discoveries dated before `before`
    DiscoveriesPruned {
        before: NaiveDate,
    },
}

/// Materialized state built from store operations
#[derive(Debug, Default, Clone)]
pub struct StoreState {
    pub configurations: BTreeMap<ConfigurationId, Configuration>,
    pub executions: HashMap<ExecutionId, Execution>,
    pub discoveries: BTreeMap<DiscoveryKey, DiscoveredFile>,
}

impl StoreState {
    /// Whether a discovery with this identity exists
    pub fn has_discovery(&self, key: &DiscoveryKey) -> bool {
        self.discoveries.contains_key(key)
    }

    /// Terminal executions whose completion precedes `before`
    pub fn prunable(&self, before: DateTime<Utc>) -> usize {
        self.executions
            .values()
            .filter(|e| is_prunable(e, before))
            .count()
    }

    /// Discoveries dated before `before`
    pub fn prunable_discoveries(&self, before: NaiveDate) -> usize {
        self.discoveries
            .keys()
            .filter(|key| key.discovery_date < before)
            .count()
    }

    /// Records a compacted journal holds
    pub fn record_count(&self) -> usize {
        self.configurations.len() + self.executions.len() + self.discoveries.len()
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::ConfigurationSave { configuration } => {
                self.configurations
                    .insert(configuration.id.clone(), configuration.clone());
            }

            StoreOp::ExecutionPut { execution } => {
                self.executions
                    .insert(execution.id.clone(), execution.clone());
            }

            StoreOp::DiscoveryCreate { file } => {
                // First write wins; a replayed duplicate is ignored
                self.discoveries
                    .entry(file.key.clone())
                    .or_insert_with(|| file.clone());
            }

            StoreOp::NotificationStatus { key, status } => {
                if let Some(file) = self.discoveries.get_mut(key) {
                    file.notification_status = *status;
                }
            }

            StoreOp::ExecutionsPruned { before } => {
                self.executions.retain(|_, e| !is_prunable(e, *before));
            }

            StoreOp::DiscoveriesPruned { before } => {
                self.discoveries.retain(|key, _| key.discovery_date >= *before);
            }
        }
    }
}

fn is_prunable(execution: &Execution, before: DateTime<Utc>) -> bool {
    execution.is_terminal() && execution.completed_at.is_some_and(|at| at < before)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
