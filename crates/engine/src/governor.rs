// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency governor: admission ceiling plus per-configuration leases
//!
//! Admission is checked locally first (ceiling and in-process mutual
//! exclusion), then against the shared lease store so two scheduler
//! instances never run the same configuration at once.

use crate::error::EngineError;
use dw_core::{
    AdmissionCeiling, AdmissionInput, Clock, ConfigurationId, CoordinationEvent, ExecutionId,
    HolderId,
};
use dw_storage::LeaseStore;
use std::convert::Infallible;
use std::sync::Mutex;
use std::time::Duration;

/// Proof of admission; hand it back to [`ConcurrencyGovernor::release`]
#[derive(Debug, PartialEq, Eq)]
pub struct AdmissionPermit {
    pub configuration_id: ConfigurationId,
    pub execution_id: ExecutionId,
}

/// Why a due configuration was not admitted and will not be retried this occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An execution of this configuration is in flight on this instance
    AlreadyRunning,
    /// Another instance holds the configuration's lease
    LeaseHeld,
}

/// Result of an admission attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    Admitted(AdmissionPermit),
    /// Ceiling reached; try again next tick
    Deferred,
    Skipped(SkipReason),
}

pub struct ConcurrencyGovernor<L: LeaseStore, C: Clock> {
    ceiling: Mutex<AdmissionCeiling>,
    leases: L,
    clock: C,
    holder: HolderId,
    lease_ttl: Duration,
    renew_interval: Duration,
}

impl<L: LeaseStore, C: Clock> ConcurrencyGovernor<L, C> {
    pub fn new(
        max_concurrent: usize,
        leases: L,
        clock: C,
        holder: HolderId,
        lease_ttl: Duration,
        renew_interval: Duration,
    ) -> Self {
        Self {
            ceiling: Mutex::new(AdmissionCeiling::new(max_concurrent)),
            leases,
            clock,
            holder,
            lease_ttl,
            renew_interval,
        }
    }

    pub fn holder(&self) -> &HolderId {
        &self.holder
    }

    /// Executions currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.lock_ceiling().used_slots()
    }

    /// Try to admit one execution of `configuration_id`
    ///
    /// Never waits: a full ceiling defers, a running configuration skips.
    pub async fn try_admit(
        &self,
        configuration_id: &ConfigurationId,
        execution_id: &ExecutionId,
    ) -> Result<Admission, EngineError> {
        let event = self.apply(AdmissionInput::Admit {
            holder_id: execution_id.to_string(),
            configuration_id: configuration_id.to_string(),
        });
        match event {
            Some(CoordinationEvent::SlotAcquired { .. }) => {}
            Some(CoordinationEvent::CeilingReached { .. }) => return Ok(Admission::Deferred),
            _ => return Ok(Admission::Skipped(SkipReason::AlreadyRunning)),
        }

        let acquired = self
            .leases
            .acquire(configuration_id.as_str(), &self.holder, self.lease_ttl)
            .await;
        match acquired {
            Ok(true) => Ok(Admission::Admitted(AdmissionPermit {
                configuration_id: configuration_id.clone(),
                execution_id: execution_id.clone(),
            })),
            Ok(false) => {
                self.release_slot(execution_id);
                Ok(Admission::Skipped(SkipReason::LeaseHeld))
            }
            Err(e) => {
                self.release_slot(execution_id);
                Err(e.into())
            }
        }
    }

    /// Give back the slot and lease of a finished execution
    pub async fn release(&self, permit: AdmissionPermit) {
        self.release_slot(&permit.execution_id);
        if let Err(e) = self
            .leases
            .release(permit.configuration_id.as_str(), &self.holder)
            .await
        {
            tracing::warn!(
                configuration_id = %permit.configuration_id,
                error = %e,
                "failed to release lease, it will expire"
            );
        }
    }

    /// Renew the permit's lease forever; run it alongside the execution
    ///
    /// A lost lease is logged and the execution carries on; renewal stops.
    pub async fn keep_alive(&self, permit: &AdmissionPermit) -> Infallible {
        let key = permit.configuration_id.as_str();
        loop {
            tokio::time::sleep(self.renew_interval).await;
            match self.leases.renew(key, &self.holder, self.lease_ttl).await {
                Ok(true) => {
                    tracing::trace!(configuration_id = key, "lease renewed");
                }
                Ok(false) => {
                    tracing::warn!(
                        configuration_id = key,
                        execution_id = %permit.execution_id,
                        "lease lost while running"
                    );
                    return std::future::pending().await;
                }
                Err(e) => {
                    tracing::warn!(configuration_id = key, error = %e, "lease renewal failed");
                }
            }
        }
    }

    /// Release every slot and lease this instance holds
    ///
    /// Used after a drain timeout aborted the remaining executions; returns
    /// what was still held so the caller can settle those executions.
    pub async fn release_all(&self) -> Vec<AdmissionPermit> {
        let held: Vec<AdmissionPermit> = self
            .lock_ceiling()
            .holders
            .values()
            .map(|h| AdmissionPermit {
                configuration_id: ConfigurationId::new(h.configuration_id.as_str()),
                execution_id: ExecutionId::new(h.holder_id.as_str()),
            })
            .collect();
        for permit in &held {
            self.release_slot(&permit.execution_id);
            if let Err(e) = self
                .leases
                .release(permit.configuration_id.as_str(), &self.holder)
                .await
            {
                tracing::warn!(configuration_id = %permit.configuration_id, error = %e, "failed to release lease");
            }
        }
        held
    }

    fn release_slot(&self, execution_id: &ExecutionId) {
        self.apply(AdmissionInput::Release {
            holder_id: execution_id.to_string(),
        });
    }

    /// Run a ceiling transition under the lock and log its events
    fn apply(&self, input: AdmissionInput) -> Option<CoordinationEvent> {
        let events = {
            let mut ceiling = self.lock_ceiling();
            let (next, events) = ceiling.transition(input, &self.clock);
            *ceiling = next;
            events
        };
        for event in &events {
            event.log();
        }
        events.into_iter().next()
    }

    fn lock_ceiling(&self) -> std::sync::MutexGuard<'_, AdmissionCeiling> {
        self.ceiling.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "governor_tests.rs"]
mod tests;
