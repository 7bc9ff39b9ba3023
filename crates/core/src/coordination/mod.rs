// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination primitives for bounded, exclusive execution
//!
//! This module provides:
//! - **Lease** - Time-bound lock record shared between scheduler instances
//! - **AdmissionCeiling** - Fixed number of in-flight execution slots

pub mod admission;
pub mod lease;

pub use admission::{AdmissionCeiling, AdmissionInput, SlotHolder};
pub use lease::{HolderId, Lease, LeaseInput, LeaseState};

/// Events emitted by coordination transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinationEvent {
    LeaseAcquired {
        key: String,
        holder: String,
    },
    LeaseReclaimed {
        key: String,
        previous_holder: String,
        new_holder: String,
    },
    LeaseDenied {
        key: String,
        holder: String,
        current_holder: String,
    },
    LeaseReleased {
        key: String,
        holder: String,
    },
    SlotAcquired {
        holder_id: String,
        configuration_id: String,
        available: usize,
    },
    SlotReleased {
        holder_id: String,
        configuration_id: String,
        available: usize,
    },
    CeilingReached {
        configuration_id: String,
        max_slots: usize,
    },
    AlreadyRunning {
        configuration_id: String,
    },
}

impl CoordinationEvent {
    /// Event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            CoordinationEvent::LeaseAcquired { .. } => "lease:acquired",
            CoordinationEvent::LeaseReclaimed { .. } => "lease:reclaimed",
            CoordinationEvent::LeaseDenied { .. } => "lease:denied",
            CoordinationEvent::LeaseReleased { .. } => "lease:released",
            CoordinationEvent::SlotAcquired { .. } => "slot:acquired",
            CoordinationEvent::SlotReleased { .. } => "slot:released",
            CoordinationEvent::CeilingReached { .. } => "slot:ceiling",
            CoordinationEvent::AlreadyRunning { .. } => "slot:already_running",
        }
    }

    /// Trace the event at a level matching its importance
    pub fn log(&self) {
        match self {
            CoordinationEvent::LeaseReclaimed {
                key,
                previous_holder,
                new_holder,
            } => tracing::warn!(
                event = self.name(),
                key,
                previous_holder,
                new_holder,
                "reclaimed expired lease"
            ),
            CoordinationEvent::CeilingReached {
                configuration_id,
                max_slots,
            } => tracing::info!(
                event = self.name(),
                configuration_id,
                max_slots,
                "admission ceiling reached, deferring"
            ),
            other => tracing::debug!(event = other.name(), detail = ?other),
        }
    }
}
