// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::FakeNotifier;
use crate::protocol::FakeProtocolAdapter;
use crate::secret::Secret;
use dw_core::{
    ConfigurationId, ConnectionSettings, ErrorCategory, ExecutionId, ExecutionStatus, Protocol,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn request() -> ListRequest {
    ListRequest {
        protocol: Protocol::Ftp,
        path: "/files/2025/01/24".to_string(),
        name_pattern: "data_20250124.csv".to_string(),
        connection: ConnectionSettings::new("ftp.partner.example"),
        timeout: Duration::from_secs(30),
    }
}

fn outcome() -> OutcomeNotification {
    OutcomeNotification {
        configuration_id: ConfigurationId::new("cfg-1"),
        execution_id: ExecutionId::new("exec-42"),
        status: ExecutionStatus::Completed,
        files_found: 1,
        error_category: None,
    }
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_listing_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeProtocolAdapter::new();
        fake.set_files(vec![RemoteFile::new(
            "ftp://ftp.partner.example/files/2025/01/24/data_20250124.csv",
        )]);
        let traced = TracedProtocolAdapter::new(fake);
        traced.list_matching(&request(), None).await
    });

    assert!(result.is_ok(), "listing should succeed: {:?}", result);
    assert!(
        logs.contains("protocol.list"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("ftp.partner.example"),
        "Should log host. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("listed"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_listing_logs_failure_category() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeProtocolAdapter::new();
        fake.push_result(Err(AdapterError::authentication("530 Login incorrect")));
        let traced = TracedProtocolAdapter::new(fake);
        traced.list_matching(&request(), None).await
    });

    assert_eq!(
        result.unwrap_err().category,
        ErrorCategory::AuthenticationFailure
    );
    assert!(
        logs.contains("listing failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("authentication_failure"),
        "Should log category. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_listing_never_logs_secret_values() {
    let (logs, _) = with_tracing(|| async {
        let traced = TracedProtocolAdapter::new(FakeProtocolAdapter::new());
        let credential = Credential::new("reader", Secret::new("hunter2"));
        traced.list_matching(&request(), Some(&credential)).await
    });

    assert!(
        logs.contains("authenticated=true"),
        "Should note credential presence. Logs:\n{}",
        logs
    );
    assert!(!logs.contains("hunter2"), "Leaked secret. Logs:\n{}", logs);
}

#[test]
fn traced_notifier_logs_delivery_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNotifier::new();
        fake.set_failing(true);
        let traced = TracedNotifier::new(fake);
        traced.outcome(&outcome()).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("notify.outcome"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("delivery failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_adapter_delegates_to_inner() {
    let fake = FakeProtocolAdapter::new();
    let traced = TracedProtocolAdapter::new(fake.clone());
    let credential = Credential::new("reader", Secret::new("hunter2"));

    traced
        .list_matching(&request(), Some(&credential))
        .await
        .unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request, request());
    assert_eq!(calls[0].username.as_deref(), Some("reader"));
}

#[tokio::test]
async fn traced_notifier_delegates_to_inner() {
    let fake = FakeNotifier::new();
    let traced = TracedNotifier::new(fake.clone());

    traced.outcome(&outcome()).await.unwrap();

    assert_eq!(fake.outcomes(), vec![outcome()]);
}
