// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use dw_adapters::{FakeNotifier, FakeProtocolAdapter, FakeSecretResolver};
use dw_core::{
    ConnectionSettings, ExecutionId, ExecutionStatus, FakeClock, Protocol, SecretRef,
};
use dw_storage::{DiscoveryRepository, ExecutionRepository, MemoryStore};
use std::time::Duration;
use yare::parameterized;

type TestCoordinator = ExecutionCoordinator<
    MemoryStore,
    FakeProtocolAdapter,
    FakeNotifier,
    FakeSecretResolver,
    FakeClock,
>;

struct Harness {
    coordinator: TestCoordinator,
    store: MemoryStore,
    adapter: FakeProtocolAdapter,
    notifier: FakeNotifier,
    secrets: FakeSecretResolver,
    clock: FakeClock,
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn harness() -> Harness {
    let store = MemoryStore::new();
    let adapter = FakeProtocolAdapter::new();
    let notifier = FakeNotifier::new();
    let secrets = FakeSecretResolver::new();
    let clock = FakeClock::at(utc(2025, 1, 24, 2, 0, 1));
    let coordinator = ExecutionCoordinator::new(
        store.clone(),
        adapter.clone(),
        notifier.clone(),
        secrets.clone(),
        clock.clone(),
        SchedulerSettings::default(),
    );
    Harness {
        coordinator,
        store,
        adapter,
        notifier,
        secrets,
        clock,
    }
}

fn daily_config() -> Configuration {
    Configuration::new(
        "cfg-1",
        "tenant-a",
        Protocol::Ftp,
        ConnectionSettings::new("ftp.example.com"),
    )
    .with_patterns("/files/{yyyy}/{mm}/{dd}", "data_{yyyymmdd}.csv")
    .with_schedule("0 2 * * *", "UTC")
    .with_next_due_at(utc(2025, 1, 24, 2, 0, 0))
}

const FILE_URL: &str = "ftp://ftp.example.com/files/2025/01/24/data_20250124.csv";

impl Harness {
    async fn run(&self, configuration: &Configuration, id: &str) -> Execution {
        let execution = Execution::pending(
            ExecutionId::new(id),
            configuration,
            configuration.next_due_at.unwrap(),
        );
        self.store.create_execution(&execution).await.unwrap();
        self.coordinator
            .run(configuration, execution)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn first_sighting_is_discovered_and_notified() {
    let h = harness();
    h.adapter
        .set_files(vec![RemoteFile::new(FILE_URL).with_size(2048)]);
    let config = daily_config();

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.files_found, 1);
    assert_eq!(execution.started_at, Some(h.clock.now()));

    let calls = h.adapter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request.path, "/files/2025/01/24");
    assert_eq!(calls[0].request.name_pattern, "data_20250124.csv");
    assert_eq!(calls[0].username, None);

    let discoveries = h.store.discoveries_for(&config.id).await.unwrap();
    assert_eq!(discoveries.len(), 1);
    assert_eq!(discoveries[0].size, Some(2048));
    assert_eq!(discoveries[0].notification_status, NotificationStatus::Sent);

    let sent = h.notifier.discoveries();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].file_url, FILE_URL);
    assert_eq!(sent[0].idempotency_key, discoveries[0].key.idempotency_key());

    let outcomes = h.notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, ExecutionStatus::Completed);
    assert_eq!(outcomes[0].files_found, 1);
}

#[tokio::test]
async fn second_run_same_day_finds_nothing_new() {
    let h = harness();
    h.adapter.set_files(vec![RemoteFile::new(FILE_URL)]);
    let config = daily_config();

    h.run(&config, "exec-1").await;
    h.clock.advance(Duration::from_secs(6 * 3600));
    let again = h.run(&config, "exec-2").await;

    assert_eq!(again.status, ExecutionStatus::Completed);
    assert_eq!(again.files_found, 0);
    assert_eq!(h.notifier.discoveries().len(), 1);
    assert_eq!(h.notifier.outcomes().len(), 2);
    assert_eq!(h.store.discoveries_for(&config.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_url_on_the_next_local_day_is_a_new_discovery() {
    let h = harness();
    h.adapter.set_files(vec![RemoteFile::new(FILE_URL)]);
    let config = daily_config().with_schedule("0 2 * * *", "America/New_York");

    // 2025-01-24 23:59:59 in New York
    h.clock.set(utc(2025, 1, 25, 4, 59, 59));
    let before = h.run(&config, "exec-1").await;
    h.clock.advance(Duration::from_secs(2));
    let after = h.run(&config, "exec-2").await;

    assert_eq!(before.files_found, 1);
    assert_eq!(after.files_found, 1);
    assert_eq!(h.notifier.discoveries().len(), 2);
}

#[tokio::test]
async fn only_unseen_files_count() {
    let h = harness();
    let config = daily_config().with_patterns("/drop", "*.csv");
    h.adapter
        .push_result(Ok(vec![RemoteFile::new("ftp://ftp.example.com/drop/a.csv")]));
    h.adapter.push_result(Ok(vec![
        RemoteFile::new("ftp://ftp.example.com/drop/a.csv"),
        RemoteFile::new("ftp://ftp.example.com/drop/b.csv"),
        RemoteFile::new("ftp://ftp.example.com/drop/c.csv"),
    ]));

    assert_eq!(h.run(&config, "exec-1").await.files_found, 1);
    assert_eq!(h.run(&config, "exec-2").await.files_found, 2);
    assert_eq!(h.notifier.discoveries().len(), 3);
}

#[tokio::test]
async fn empty_listing_completes() {
    let h = harness();
    let execution = h.run(&daily_config(), "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.files_found, 0);
    assert!(h.notifier.discoveries().is_empty());
}

#[parameterized(
    authentication = { AdapterError::authentication("530 Login incorrect"), ErrorCategory::AuthenticationFailure },
    timeout = { AdapterError::timeout("read timed out"), ErrorCategory::ConnectionTimeout },
    protocol = { AdapterError::protocol("bad reply"), ErrorCategory::ProtocolError },
    permission = { AdapterError::permission("403 Forbidden"), ErrorCategory::PermissionDenied },
)]
#[test_macro(tokio::test)]
async fn adapter_failure_is_recorded(error: AdapterError, category: ErrorCategory) {
    let h = harness();
    let detail = error.detail.clone();
    h.adapter.push_result(Err(error));
    let config = daily_config();

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.error_category, Some(category));
    assert_eq!(execution.error_detail, Some(detail));
    assert!(execution.completed_at.is_some());
    assert!(h.store.discoveries_for(&config.id).await.unwrap().is_empty());

    let outcomes = h.notifier.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].error_category, Some(category));
}

#[tokio::test]
async fn credential_is_resolved_by_reference() {
    let h = harness();
    h.secrets.insert("ftp/acme", "acme", "hunter2");
    let mut config = daily_config();
    config.connection = ConnectionSettings::new("ftp.example.com")
        .with_credential(SecretRef::new("ftp/acme"));

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(h.secrets.lookups(), vec!["ftp/acme".to_string()]);
    assert_eq!(h.adapter.calls()[0].username.as_deref(), Some("acme"));
}

#[tokio::test]
async fn missing_secret_fails_as_authentication() {
    let h = harness();
    let mut config = daily_config();
    config.connection = ConnectionSettings::new("ftp.example.com")
        .with_credential(SecretRef::new("ftp/missing"));

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(
        execution.error_category,
        Some(ErrorCategory::AuthenticationFailure)
    );
    assert!(h.adapter.calls().is_empty());
}

#[tokio::test]
async fn slow_adapter_times_out() {
    let h = harness();
    h.adapter.set_delay(Duration::from_secs(5));
    let mut config = daily_config();
    config.connection = ConnectionSettings::new("ftp.example.com")
        .with_timeout(Duration::from_millis(50));

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(
        execution.error_category,
        Some(ErrorCategory::ConnectionTimeout)
    );
}

#[tokio::test]
async fn invalid_timezone_fails_the_execution() {
    let h = harness();
    let config = daily_config().with_schedule("0 2 * * *", "Mars/Olympus_Mons");

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.error_category, Some(ErrorCategory::ProtocolError));
    assert!(h.adapter.calls().is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_execution() {
    let h = harness();
    h.adapter.set_files(vec![RemoteFile::new(FILE_URL)]);
    h.notifier.set_failing(true);
    let config = daily_config();

    let execution = h.run(&config, "exec-1").await;

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.files_found, 1);
    let discoveries = h.store.discoveries_for(&config.id).await.unwrap();
    assert_eq!(discoveries[0].notification_status, NotificationStatus::Failed);
}

#[tokio::test]
async fn terminal_record_is_persisted() {
    let h = harness();
    let execution = h.run(&daily_config(), "exec-1").await;

    let stored = h.store.get_execution(&execution.id).await.unwrap();
    assert_eq!(stored, Some(execution));
}

#[tokio::test]
async fn unknown_execution_is_a_storage_error() {
    let h = harness();
    let config = daily_config();
    let execution = Execution::pending(ExecutionId::new("ghost"), &config, h.clock.now());

    let result = h.coordinator.run(&config, execution).await;

    assert!(matches!(result, Err(EngineError::Storage(_))));
}
