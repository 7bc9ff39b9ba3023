// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler tuning knobs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one scheduler instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Time between polling ticks
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Admission ceiling: maximum in-flight executions
    pub max_concurrent: usize,
    /// How long shutdown waits for in-flight executions
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
    /// Lifetime of a per-configuration lease between renewals
    #[serde(with = "humantime_serde")]
    pub lease_ttl: Duration,
    /// Upper bound on any single adapter call
    #[serde(with = "humantime_serde")]
    pub max_adapter_timeout: Duration,
    /// Terminal executions older than this are pruned
    #[serde(with = "humantime_serde")]
    pub execution_retention: Duration,
    /// Lease holder name; generated when absent
    pub instance_id: Option<String>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            max_concurrent: 100,
            drain_timeout: Duration::from_secs(30),
            lease_ttl: Duration::from_secs(300),
            max_adapter_timeout: Duration::from_secs(300),
            execution_retention: Duration::from_secs(30 * 24 * 60 * 60),
            instance_id: None,
        }
    }
}

impl SchedulerSettings {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    /// Effective timeout for one adapter call
    pub fn adapter_timeout(&self, requested: Duration) -> Duration {
        requested.min(self.max_adapter_timeout)
    }

    /// How often a running execution renews its lease
    pub fn lease_renew_interval(&self) -> Duration {
        (self.lease_ttl / 3).max(Duration::from_millis(100))
    }
}
