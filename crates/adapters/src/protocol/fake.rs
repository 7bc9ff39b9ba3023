// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake protocol adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AdapterError, ListRequest, ProtocolAdapter};
use crate::secret::Credential;
use async_trait::async_trait;
use dw_core::RemoteFile;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded listing call
#[derive(Debug, Clone)]
pub struct ListCall {
    pub request: ListRequest,
    /// Username of the credential handed to the adapter, if any
    pub username: Option<String>,
}

#[derive(Default)]
struct FakeState {
    /// Results keyed by connection host, consumed in order
    by_host: HashMap<String, VecDeque<Result<Vec<RemoteFile>, AdapterError>>>,
    /// Results for any host, consumed in order
    queued: VecDeque<Result<Vec<RemoteFile>, AdapterError>>,
    /// Returned when nothing is queued
    standing: Vec<RemoteFile>,
    delay: Option<Duration>,
    calls: Vec<ListCall>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Fake protocol adapter with scripted results
#[derive(Clone, Default)]
pub struct FakeProtocolAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeProtocolAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a result for the next call to any host
    pub fn push_result(&self, result: Result<Vec<RemoteFile>, AdapterError>) {
        self.state().queued.push_back(result);
    }

    /// Queue a result for the next call against `host`
    pub fn push_for_host(&self, host: &str, result: Result<Vec<RemoteFile>, AdapterError>) {
        self.state()
            .by_host
            .entry(host.to_string())
            .or_default()
            .push_back(result);
    }

    /// Files returned whenever no scripted result is queued
    pub fn set_files(&self, files: Vec<RemoteFile>) {
        self.state().standing = files;
    }

    /// Make every call take this long
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ListCall> {
        self.state().calls.clone()
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.state().max_in_flight
    }
}

#[async_trait]
impl ProtocolAdapter for FakeProtocolAdapter {
    async fn list_matching(
        &self,
        request: &ListRequest,
        credential: Option<&Credential>,
    ) -> Result<Vec<RemoteFile>, AdapterError> {
        let (delay, result) = {
            let mut state = self.state();
            state.calls.push(ListCall {
                request: request.clone(),
                username: credential.map(|c| c.username.clone()),
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            let host = &request.connection.host;
            let scripted = match state.by_host.get_mut(host).and_then(|q| q.pop_front()) {
                Some(result) => Some(result),
                None => state.queued.pop_front(),
            };
            let result = scripted.unwrap_or_else(|| Ok(state.standing.clone()));
            (state.delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state().in_flight -= 1;
        result
    }
}
