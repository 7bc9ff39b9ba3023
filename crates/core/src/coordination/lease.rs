// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease state machine for cross-instance mutual exclusion
//!
//! A lease is a time-bound lock record. The holder must renew it before it
//! expires; once expired, any other holder may take it over. This keeps a
//! crashed instance from orphaning a configuration for longer than one TTL.

use super::CoordinationEvent;
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifies a lease holder (one scheduler instance)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lease state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseState {
    Free,
    Held {
        holder: HolderId,
        expires_at: DateTime<Utc>,
    },
}

/// A named, time-bound lease
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub key: String,
    pub state: LeaseState,
}

/// Inputs that drive lease transitions
#[derive(Clone, Debug)]
pub enum LeaseInput {
    Acquire { holder: HolderId, ttl: Duration },
    Renew { holder: HolderId, ttl: Duration },
    Release { holder: HolderId },
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Lease {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: LeaseState::Free,
        }
    }

    /// Free, or held but past its expiry
    pub fn is_available(&self, clock: &impl Clock) -> bool {
        match &self.state {
            LeaseState::Free => true,
            LeaseState::Held { expires_at, .. } => clock.now() >= *expires_at,
        }
    }

    /// Held by `holder` and not yet expired
    pub fn is_held_by(&self, holder: &HolderId, clock: &impl Clock) -> bool {
        matches!(&self.state, LeaseState::Held { holder: h, expires_at }
            if h == holder && clock.now() < *expires_at)
    }

    pub fn holder(&self) -> Option<&HolderId> {
        match &self.state {
            LeaseState::Free => None,
            LeaseState::Held { holder, .. } => Some(holder),
        }
    }

    /// Pure state transition function
    pub fn transition(
        &self,
        input: LeaseInput,
        clock: &impl Clock,
    ) -> (Lease, Vec<CoordinationEvent>) {
        let mut next = self.clone();
        let mut events = Vec::new();
        let now = clock.now();

        match input {
            LeaseInput::Acquire { holder, ttl } => match &self.state {
                LeaseState::Free => {
                    next.state = LeaseState::Held {
                        holder: holder.clone(),
                        expires_at: expiry(now, ttl),
                    };
                    events.push(CoordinationEvent::LeaseAcquired {
                        key: self.key.clone(),
                        holder: holder.0,
                    });
                }
                LeaseState::Held {
                    holder: current,
                    expires_at,
                } if now >= *expires_at => {
                    next.state = LeaseState::Held {
                        holder: holder.clone(),
                        expires_at: expiry(now, ttl),
                    };
                    events.push(CoordinationEvent::LeaseReclaimed {
                        key: self.key.clone(),
                        previous_holder: current.0.clone(),
                        new_holder: holder.0,
                    });
                }
                LeaseState::Held {
                    holder: current, ..
                } => {
                    // Re-entrant acquire by the same holder is still a denial:
                    // one instance must not run the same configuration twice.
                    events.push(CoordinationEvent::LeaseDenied {
                        key: self.key.clone(),
                        holder: holder.0,
                        current_holder: current.0.clone(),
                    });
                }
            },

            LeaseInput::Renew { holder, ttl } => {
                if self.is_held_by(&holder, clock) {
                    next.state = LeaseState::Held {
                        holder,
                        expires_at: expiry(now, ttl),
                    };
                }
            }

            LeaseInput::Release { holder } => {
                if matches!(&self.state, LeaseState::Held { holder: h, .. } if *h == holder) {
                    next.state = LeaseState::Free;
                    events.push(CoordinationEvent::LeaseReleased {
                        key: self.key.clone(),
                        holder: holder.0,
                    });
                }
            }
        }

        (next, events)
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
