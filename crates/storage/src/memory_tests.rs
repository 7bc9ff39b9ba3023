// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{NaiveDate, TimeZone};
use dw_core::{ConnectionSettings, ErrorCategory, ExecutionStatus, Protocol, RemoteFile, TenantId};
use std::path::Path;

fn configuration(id: &str) -> Configuration {
    Configuration::new(
        id,
        "tenant-a",
        Protocol::Https,
        ConnectionSettings::new("files.example.com"),
    )
}

fn at(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 24, h, 0, 0).unwrap()
}

fn discovery(url: &str) -> DiscoveredFile {
    let key = DiscoveryKey::new(
        TenantId::new("tenant-a"),
        ConfigurationId::new("cfg-1"),
        url,
        NaiveDate::from_ymd_opt(2025, 1, 24).unwrap(),
    );
    DiscoveredFile::new(key, &RemoteFile::new(url), at(2))
}

#[tokio::test]
async fn list_active_skips_inactive() {
    let store = MemoryStore::new();
    store.save(&configuration("on")).await.unwrap();
    store.save(&configuration("off").inactive()).await.unwrap();

    let active = store.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, ConfigurationId::new("on"));
    assert!(store
        .get_configuration(&ConfigurationId::new("off"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn try_create_is_unique_per_identity() {
    let store = MemoryStore::new();
    let file = discovery("https://files.example.com/a.csv");

    assert!(store.try_create(&file).await.unwrap());
    assert!(!store.try_create(&file).await.unwrap());
    assert_eq!(
        store
            .discoveries_for(&ConfigurationId::new("cfg-1"))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn concurrent_try_create_yields_one_winner() {
    let store = MemoryStore::new();
    let file = discovery("https://files.example.com/a.csv");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let file = file.clone();
        handles.push(tokio::spawn(async move { store.try_create(&file).await }));
    }
    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
}

#[tokio::test]
async fn transition_applies_state_machine() {
    let store = MemoryStore::new();
    let execution = Execution::pending(ExecutionId::new("e1"), &configuration("cfg-1"), at(2));
    store.create_execution(&execution).await.unwrap();

    let running = store
        .transition_execution(&execution.id, ExecutionEvent::Start { at: at(2) })
        .await
        .unwrap();
    assert_eq!(running.status, ExecutionStatus::Running);

    let failed = store
        .transition_execution(
            &execution.id,
            ExecutionEvent::Fail {
                at: at(3),
                category: ErrorCategory::PermissionDenied,
                detail: "403".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(failed.status, ExecutionStatus::Failed);

    let again = store
        .transition_execution(&execution.id, ExecutionEvent::Start { at: at(4) })
        .await;
    assert!(matches!(again, Err(StorageError::InvalidTransition(_))));
    assert_eq!(
        store.get_execution(&execution.id).await.unwrap(),
        Some(failed)
    );
}

#[tokio::test]
async fn duplicate_execution_id_is_rejected() {
    let store = MemoryStore::new();
    let execution = Execution::pending(ExecutionId::new("e1"), &configuration("cfg-1"), at(2));
    store.create_execution(&execution).await.unwrap();

    assert!(matches!(
        store.create_execution(&execution).await,
        Err(StorageError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn unknown_execution_transition_is_not_found() {
    let store = MemoryStore::new();
    let result = store
        .transition_execution(&ExecutionId::new("ghost"), ExecutionEvent::Start { at: at(1) })
        .await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn notification_status_requires_existing_discovery() {
    let store = MemoryStore::new();
    let file = discovery("https://files.example.com/a.csv");

    assert!(store
        .set_notification_status(&file.key, NotificationStatus::Sent)
        .await
        .is_err());

    store.try_create(&file).await.unwrap();
    store
        .set_notification_status(&file.key, NotificationStatus::Sent)
        .await
        .unwrap();
    let stored = store
        .discoveries_for(&ConfigurationId::new("cfg-1"))
        .await
        .unwrap();
    assert_eq!(stored[0].notification_status, NotificationStatus::Sent);
}

#[tokio::test]
async fn journaled_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("store.journal");
    let file = discovery("https://files.example.com/a.csv");

    {
        let store = MemoryStore::open(&path).unwrap();
        store.save(&configuration("cfg-1")).await.unwrap();
        store.try_create(&file).await.unwrap();
        store
            .set_notification_status(&file.key, NotificationStatus::Failed)
            .await
            .unwrap();
    }

    let reopened = MemoryStore::open(&path).unwrap();
    assert!(!reopened.try_create(&file).await.unwrap());
    let state = reopened.snapshot();
    assert_eq!(state.configurations.len(), 1);
    assert_eq!(
        state.discoveries[&file.key].notification_status,
        NotificationStatus::Failed
    );
}

#[tokio::test]
async fn compact_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.journal");
    let config = configuration("cfg-1");

    {
        let store = MemoryStore::open(&path).unwrap();
        for h in 0..5 {
            store
                .save(&config.clone().with_next_due_at(at(h)))
                .await
                .unwrap();
        }
        store.compact().unwrap();
        store.try_create(&discovery("https://h/a.csv")).await.unwrap();
    }

    assert_eq!(Journal::replay(&path).unwrap().len(), 2);
    let state = MemoryStore::open(&path).unwrap().snapshot();
    assert_eq!(state.configurations[&config.id].next_due_at, Some(at(4)));
    assert_eq!(state.discoveries.len(), 1);
}

fn discovery_on(url: &str, day: u32) -> DiscoveredFile {
    let key = DiscoveryKey::new(
        TenantId::new("tenant-a"),
        ConfigurationId::new("cfg-1"),
        url,
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
    );
    DiscoveredFile::new(key, &RemoteFile::new(url), at(2))
}

fn journal_lines(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .count()
}

#[tokio::test]
async fn prune_discoveries_removes_earlier_days() {
    let store = MemoryStore::new();
    for day in [20, 22, 24] {
        store
            .try_create(&discovery_on("https://h/a.csv", day))
            .await
            .unwrap();
    }
    let cutoff = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();

    assert_eq!(store.prune_discoveries_before(cutoff).await.unwrap(), 1);
    assert_eq!(store.prune_discoveries_before(cutoff).await.unwrap(), 0);
    let left = store
        .discoveries_for(&ConfigurationId::new("cfg-1"))
        .await
        .unwrap();
    assert_eq!(left.len(), 2);
    assert!(left.iter().all(|f| f.key.discovery_date >= cutoff));
}

#[tokio::test]
async fn maintenance_after_pruning_shrinks_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.journal");
    let config = configuration("cfg-1");

    {
        let store = MemoryStore::open(&path).unwrap();
        for h in 0..5 {
            store
                .save(&config.clone().with_next_due_at(at(h)))
                .await
                .unwrap();
        }
        store.try_create(&discovery_on("https://h/a.csv", 20)).await.unwrap();
        store.try_create(&discovery_on("https://h/a.csv", 24)).await.unwrap();
        let pruned = store
            .prune_discoveries_before(NaiveDate::from_ymd_opt(2025, 1, 23).unwrap())
            .await
            .unwrap();
        assert_eq!(journal_lines(&path), 8);

        assert!(store.maintain(pruned).await.unwrap());
        assert_eq!(journal_lines(&path), 2);

        // Appends continue on the rewritten journal
        store.save(&config.clone().with_next_due_at(at(6))).await.unwrap();
        assert_eq!(journal_lines(&path), 3);
    }

    let state = MemoryStore::open(&path).unwrap().snapshot();
    assert_eq!(state.configurations[&config.id].next_due_at, Some(at(6)));
    assert_eq!(state.discoveries.len(), 1);
}

#[tokio::test]
async fn maintenance_without_pruning_waits_for_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.journal");
    let config = configuration("cfg-1");
    let store = MemoryStore::open(&path)
        .unwrap()
        .with_compaction_threshold(4);

    for h in 0..3 {
        store
            .save(&config.clone().with_next_due_at(at(h)))
            .await
            .unwrap();
    }
    assert!(!store.maintain(0).await.unwrap());
    assert_eq!(journal_lines(&path), 3);

    for h in 3..5 {
        store
            .save(&config.clone().with_next_due_at(at(h)))
            .await
            .unwrap();
    }
    assert!(store.maintain(0).await.unwrap());
    assert_eq!(journal_lines(&path), 1);
}

#[tokio::test]
async fn volatile_store_never_compacts() {
    let store = MemoryStore::new().with_compaction_threshold(0);
    store.save(&configuration("cfg-1")).await.unwrap();

    assert!(!store.maintain(3).await.unwrap());
}
