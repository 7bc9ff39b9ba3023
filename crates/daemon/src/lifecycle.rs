// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_adapters::{
    Connectors, EnvSecretResolver, FtpAdapter, HttpsAdapter, LogNotifier, Notifier, NotifyError,
    ObjectStorageAdapter, TracedNotifier, TracedProtocolAdapter, WebhookNotifier,
};
use dw_core::{
    Clock, Configuration, DiscoveryNotification, ErrorCategory, ExecutionEvent, ExecutionStatus,
    OutcomeNotification, SystemClock, UuidIdGen,
};
use dw_engine::{DrainReport, EngineError, SchedulerDeps, SchedulerHandle, SchedulerLoop};
use dw_storage::{
    ConfigurationRepository, ExecutionRepository, MemoryLeaseStore, MemoryStore, StorageError,
};
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DaemonConfig, NotifySettings};

/// Real adapters for every protocol, wrapped with tracing
pub type DaemonConnectors =
    TracedProtocolAdapter<Connectors<FtpAdapter, HttpsAdapter, ObjectStorageAdapter>>;

/// Scheduler with concrete adapter types
pub type DaemonScheduler = SchedulerLoop<
    MemoryStore,
    MemoryLeaseStore<SystemClock>,
    DaemonConnectors,
    TracedNotifier<DaemonNotifier>,
    EnvSecretResolver,
    SystemClock,
    UuidIdGen,
>;

/// Notifier picked by the `[notify]` section
#[derive(Clone)]
pub enum DaemonNotifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl DaemonNotifier {
    pub fn from_settings(settings: &NotifySettings) -> Self {
        match settings {
            NotifySettings::Log => DaemonNotifier::Log(LogNotifier::new()),
            NotifySettings::Webhook { url, timeout } => {
                DaemonNotifier::Webhook(WebhookNotifier::new(url.as_str(), *timeout))
            }
        }
    }
}

#[async_trait]
impl Notifier for DaemonNotifier {
    async fn discovery(&self, notification: &DiscoveryNotification) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Log(n) => n.discovery(notification).await,
            DaemonNotifier::Webhook(n) => n.discovery(notification).await,
        }
    }

    async fn outcome(&self, notification: &OutcomeNotification) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Log(n) => n.outcome(notification).await,
            DaemonNotifier::Webhook(n) => n.outcome(notification).await,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot parse {0}: {1}")]
    Parse(PathBuf, #[source] Box<toml::de::Error>),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),

    #[error("state file {0} is locked: daemon already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("log path {0} has no file name")]
    BadLogPath(PathBuf),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What [`sync_configurations`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Stored and active, but no longer in the file
    pub deactivated: usize,
}

/// A running daemon
pub struct Daemon {
    pub config: DaemonConfig,
    pub store: MemoryStore,
    pub scheduler: Arc<DaemonScheduler>,
    lock: Option<(PathBuf, File)>,
}

impl Daemon {
    /// Start polling; the handle stops it
    pub fn start(&self) -> Result<SchedulerHandle, LifecycleError> {
        Ok(Arc::clone(&self.scheduler).start()?)
    }

    /// Stop polling, drain in-flight executions and compact the journal
    pub async fn shutdown(self, handle: SchedulerHandle) -> Result<DrainReport, LifecycleError> {
        info!("Shutting down daemon...");
        let report = handle.stop(self.config.scheduler.drain_timeout).await?;
        info!(
            completed = report.completed,
            aborted = report.aborted,
            "in-flight executions drained"
        );

        if let Err(e) = self.store.compact() {
            warn!(error = %e, "journal compaction failed");
        }

        if let Some((path, file)) = self.lock {
            drop(file);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove lock file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(report)
    }
}

/// Validate, open state, sync configurations and build the scheduler
pub async fn startup(config: DaemonConfig) -> Result<Daemon, LifecycleError> {
    for warning in config.validate()? {
        warn!("{}", warning);
    }

    // Lock before replaying so two daemons never share a journal
    let (store, lock) = match &config.daemon.state_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let lock_path = lock_path_for(path);
            let lock_file = File::create(&lock_path)?;
            lock_file
                .try_lock_exclusive()
                .map_err(|e| LifecycleError::LockFailed(path.clone(), e))?;
            (MemoryStore::open(path)?, Some((lock_path, lock_file)))
        }
        None => {
            info!("no state_path configured, state is kept in memory only");
            (MemoryStore::new(), None)
        }
    };

    let clock = SystemClock;
    let recovered = recover_interrupted(&store, &clock).await?;
    if recovered > 0 {
        warn!(
            "Marked {} executions interrupted by the previous shutdown as failed",
            recovered
        );
    }

    let sync = sync_configurations(&store, &config.configurations).await?;
    info!(
        added = sync.added,
        updated = sync.updated,
        unchanged = sync.unchanged,
        deactivated = sync.deactivated,
        "configurations loaded"
    );

    let deps = SchedulerDeps {
        repos: store.clone(),
        leases: MemoryLeaseStore::new(clock.clone()),
        adapter: TracedProtocolAdapter::new(Connectors::real()),
        notifier: TracedNotifier::new(DaemonNotifier::from_settings(&config.notify)),
        secrets: EnvSecretResolver::new(config.daemon.secret_prefix.as_str()),
    };
    let scheduler = SchedulerLoop::new(deps, clock, UuidIdGen, config.scheduler.clone());

    Ok(Daemon {
        config,
        store,
        scheduler: Arc::new(scheduler),
        lock,
    })
}

fn lock_path_for(state_path: &std::path::Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Make the stored configurations match the file
///
/// A configuration whose schedule and zone are unchanged keeps its
/// evaluation timestamps; a changed schedule starts over. Active stored
/// configurations missing from the file are deactivated, never deleted,
/// so their executions and discoveries stay queryable.
pub async fn sync_configurations<R: ConfigurationRepository>(
    repo: &R,
    desired: &[Configuration],
) -> Result<SyncReport, LifecycleError> {
    let mut report = SyncReport::default();

    for configuration in desired {
        let existing = repo.get_configuration(&configuration.id).await?;
        let merged = match &existing {
            Some(stored) if same_schedule(stored, configuration) => Configuration {
                last_evaluated_at: stored.last_evaluated_at,
                next_due_at: stored.next_due_at,
                ..configuration.clone()
            },
            _ => Configuration {
                last_evaluated_at: None,
                next_due_at: None,
                ..configuration.clone()
            },
        };
        match existing {
            None => report.added += 1,
            Some(stored) if stored == merged => {
                report.unchanged += 1;
                continue;
            }
            Some(_) => report.updated += 1,
        }
        repo.save(&merged).await?;
    }

    for stored in repo.list_active().await? {
        if !desired.iter().any(|c| c.id == stored.id) {
            info!(configuration_id = %stored.id, "deactivating configuration removed from file");
            repo.save(&Configuration {
                is_active: false,
                ..stored
            })
            .await?;
            report.deactivated += 1;
        }
    }

    Ok(report)
}

fn same_schedule(a: &Configuration, b: &Configuration) -> bool {
    a.schedule_expression == b.schedule_expression && a.timezone == b.timezone
}

/// Fail executions a previous process left behind
///
/// They cannot finish; their configurations fire again at the next occurrence.
pub async fn recover_interrupted(
    store: &MemoryStore,
    clock: &impl Clock,
) -> Result<usize, LifecycleError> {
    let interrupted: Vec<_> = store
        .snapshot()
        .executions
        .into_values()
        .filter(|e| !e.is_terminal())
        .collect();

    for execution in &interrupted {
        let at: DateTime<Utc> = clock.now();
        if execution.status == ExecutionStatus::Pending {
            store
                .transition_execution(&execution.id, ExecutionEvent::Start { at })
                .await?;
        }
        store
            .transition_execution(
                &execution.id,
                ExecutionEvent::Fail {
                    at,
                    category: ErrorCategory::ConnectionTimeout,
                    detail: "interrupted by daemon restart".to_string(),
                },
            )
            .await?;
        warn!(
            execution_id = %execution.id,
            configuration_id = %execution.configuration_id,
            "interrupted execution marked failed"
        );
    }
    Ok(interrupted.len())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
