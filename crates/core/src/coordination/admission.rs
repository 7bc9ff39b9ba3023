// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission ceiling state machine
//!
//! Counts in-flight executions against a fixed number of slots. Admission is
//! fail-fast: when the ceiling is reached the request is denied, never queued.

use super::CoordinationEvent;
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A slot holder (one admitted execution)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotHolder {
    pub holder_id: String,
    /// Configuration the slot was taken for
    pub configuration_id: String,
    pub admitted_at: DateTime<Utc>,
}

/// Fixed-capacity admission state
#[derive(Clone, Debug)]
pub struct AdmissionCeiling {
    pub max_slots: usize,
    pub holders: HashMap<String, SlotHolder>,
}

/// Inputs that drive admission transitions
#[derive(Clone, Debug)]
pub enum AdmissionInput {
    Admit {
        holder_id: String,
        configuration_id: String,
    },
    Release {
        holder_id: String,
    },
}

impl AdmissionCeiling {
    pub fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            holders: HashMap::new(),
        }
    }

    pub fn used_slots(&self) -> usize {
        self.holders.len()
    }

    pub fn available_slots(&self) -> usize {
        self.max_slots.saturating_sub(self.used_slots())
    }

    /// Whether a slot is currently held for `configuration_id`
    pub fn holds_configuration(&self, configuration_id: &str) -> bool {
        self.holders
            .values()
            .any(|h| h.configuration_id == configuration_id)
    }

    /// Pure state transition function
    pub fn transition(
        &self,
        input: AdmissionInput,
        clock: &impl Clock,
    ) -> (AdmissionCeiling, Vec<CoordinationEvent>) {
        let mut next = self.clone();
        let mut events = Vec::new();

        match input {
            AdmissionInput::Admit {
                holder_id,
                configuration_id,
            } => {
                if self.holds_configuration(&configuration_id) {
                    events.push(CoordinationEvent::AlreadyRunning { configuration_id });
                } else if self.available_slots() == 0 {
                    events.push(CoordinationEvent::CeilingReached {
                        configuration_id,
                        max_slots: self.max_slots,
                    });
                } else {
                    next.holders.insert(
                        holder_id.clone(),
                        SlotHolder {
                            holder_id: holder_id.clone(),
                            configuration_id: configuration_id.clone(),
                            admitted_at: clock.now(),
                        },
                    );
                    events.push(CoordinationEvent::SlotAcquired {
                        holder_id,
                        configuration_id,
                        available: next.available_slots(),
                    });
                }
            }

            AdmissionInput::Release { holder_id } => {
                if let Some(holder) = next.holders.remove(&holder_id) {
                    events.push(CoordinationEvent::SlotReleased {
                        holder_id,
                        configuration_id: holder.configuration_id,
                        available: next.available_slots(),
                    });
                }
            }
        }

        (next, events)
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
