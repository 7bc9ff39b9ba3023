// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler loop: polls configurations and dispatches due checks
//!
//! Each tick loads the active configurations, initialises new ones,
//! advances and admits the due ones, and spawns one task per admitted
//! execution. The tick never waits for an execution to finish.

use crate::coordinator::ExecutionCoordinator;
use crate::error::EngineError;
use crate::governor::{Admission, AdmissionPermit, ConcurrencyGovernor};
use chrono::{DateTime, Utc};
use dw_adapters::{Notifier, ProtocolAdapter, SecretResolver};
use dw_core::{
    Clock, Configuration, ErrorCategory, Execution, ExecutionEvent, ExecutionStatus, HolderId,
    IdGen, ScheduleEvaluator, SchedulerSettings,
};
use dw_storage::{LeaseStore, Repositories};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// External collaborators of the scheduler
pub struct SchedulerDeps<R, L, A, N, S> {
    pub repos: R,
    pub leases: L,
    pub adapter: A,
    pub notifier: N,
    pub secrets: S,
}

/// Where the loop is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
    Dispatching,
    Stopped,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active configurations seen
    pub active: usize,
    pub due: usize,
    pub admitted: usize,
    /// Ceiling reached; still due next tick
    pub deferred: usize,
    /// Already running here or elsewhere; occurrence dropped
    pub skipped: usize,
    /// Given their first `next_due_at`
    pub initialised: usize,
    /// Configurations whose dispatch hit an error
    pub errors: usize,
    /// Executions finished since the previous tick
    pub reaped: usize,
    /// Terminal executions past retention, deleted
    pub pruned: usize,
    /// Discoveries dated before the retention window, deleted
    pub pruned_discoveries: usize,
    /// The store rewrote its journal
    pub compacted: bool,
}

/// Outcome of a shutdown drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Executions that reached a terminal state on their own
    pub completed: usize,
    /// Executions cut off by the drain timeout
    pub aborted: usize,
}

pub struct SchedulerLoop<R, L, A, N, S, C, I>
where
    R: Repositories,
    L: LeaseStore,
    A: ProtocolAdapter,
    N: Notifier,
    S: SecretResolver,
    C: Clock,
    I: IdGen,
{
    repos: R,
    coordinator: Arc<ExecutionCoordinator<R, A, N, S, C>>,
    governor: Arc<ConcurrencyGovernor<L, C>>,
    evaluator: ScheduleEvaluator,
    clock: C,
    ids: I,
    settings: SchedulerSettings,
    state: Mutex<SchedulerState>,
    tasks: tokio::sync::Mutex<JoinSet<Result<Execution, EngineError>>>,
    started: AtomicBool,
}

impl<R, L, A, N, S, C, I> SchedulerLoop<R, L, A, N, S, C, I>
where
    R: Repositories,
    L: LeaseStore,
    A: ProtocolAdapter,
    N: Notifier,
    S: SecretResolver,
    C: Clock,
    I: IdGen,
{
    /// Build a scheduler; the lease holder is `settings.instance_id` or a fresh id
    pub fn new(
        deps: SchedulerDeps<R, L, A, N, S>,
        clock: C,
        ids: I,
        settings: SchedulerSettings,
    ) -> Self {
        let holder = match &settings.instance_id {
            Some(id) => HolderId::new(id.as_str()),
            None => HolderId::new(format!("dwd-{}", ids.next())),
        };
        let governor = ConcurrencyGovernor::new(
            settings.max_concurrent,
            deps.leases,
            clock.clone(),
            holder,
            settings.lease_ttl,
            settings.lease_renew_interval(),
        );
        let coordinator = ExecutionCoordinator::new(
            deps.repos.clone(),
            deps.adapter,
            deps.notifier,
            deps.secrets,
            clock.clone(),
            settings.clone(),
        );
        Self {
            repos: deps.repos,
            coordinator: Arc::new(coordinator),
            governor: Arc::new(governor),
            evaluator: ScheduleEvaluator::new(),
            clock,
            ids,
            settings,
            state: Mutex::new(SchedulerState::Idle),
            tasks: tokio::sync::Mutex::new(JoinSet::new()),
            started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Executions admitted and not yet finished
    pub fn in_flight(&self) -> usize {
        self.governor.in_flight()
    }

    pub fn holder(&self) -> &HolderId {
        self.governor.holder()
    }

    fn set_state(&self, next: SchedulerState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != SchedulerState::Stopped {
            *state = next;
        }
    }

    /// Run one polling cycle
    ///
    /// A failing configuration is counted in `errors` and never aborts the
    /// tick. Only a failure to list configurations is returned.
    pub async fn tick(&self) -> Result<TickReport, EngineError> {
        if self.state() == SchedulerState::Stopped {
            return Err(EngineError::Stopped);
        }
        let mut report = TickReport {
            reaped: self.reap().await,
            ..TickReport::default()
        };

        self.set_state(SchedulerState::Polling);
        let configurations = match self.repos.list_active().await {
            Ok(configurations) => configurations,
            Err(e) => {
                self.set_state(SchedulerState::Idle);
                return Err(e.into());
            }
        };
        report.active = configurations.len();

        self.set_state(SchedulerState::Dispatching);
        let now = self.clock.now();
        for configuration in &configurations {
            if let Err(e) = self.dispatch(configuration, now, &mut report).await {
                report.errors += 1;
                tracing::error!(
                    configuration_id = %configuration.id,
                    error = %e,
                    "dispatch failed"
                );
            }
        }

        self.prune(now, &mut report).await;
        self.set_state(SchedulerState::Idle);

        if report.due + report.initialised + report.errors > 0 {
            tracing::info!(?report, "tick");
        } else {
            tracing::debug!(?report, "tick");
        }
        Ok(report)
    }

    async fn dispatch(
        &self,
        configuration: &Configuration,
        now: DateTime<Utc>,
        report: &mut TickReport,
    ) -> Result<(), EngineError> {
        let Some(scheduled_for) = configuration.next_due_at else {
            let initialised = self.evaluator.initialize(configuration, now)?;
            self.repos.save(&initialised).await?;
            report.initialised += 1;
            tracing::debug!(
                configuration_id = %configuration.id,
                next_due_at = ?initialised.next_due_at,
                "initialised schedule"
            );
            return Ok(());
        };
        if !self.evaluator.is_due(configuration, now) {
            return Ok(());
        }
        report.due += 1;

        // Computed before admission so a bad expression fails without a slot
        let advanced = self.evaluator.advance(configuration, now)?;
        let execution_id = self.ids.next_execution_id();
        match self
            .governor
            .try_admit(&configuration.id, &execution_id)
            .await?
        {
            Admission::Deferred => {
                report.deferred += 1;
            }
            Admission::Skipped(reason) => {
                report.skipped += 1;
                tracing::info!(
                    configuration_id = %configuration.id,
                    ?reason,
                    "skipping occurrence"
                );
                self.repos.save(&advanced).await?;
            }
            Admission::Admitted(permit) => {
                let execution = Execution::pending(execution_id, &advanced, scheduled_for);
                let prepared = async {
                    self.repos.save(&advanced).await?;
                    self.repos.create_execution(&execution).await
                }
                .await;
                if let Err(e) = prepared {
                    self.governor.release(permit).await;
                    return Err(e.into());
                }
                report.admitted += 1;
                self.spawn(advanced, execution, permit).await;
            }
        }
        Ok(())
    }

    async fn spawn(&self, configuration: Configuration, execution: Execution, permit: AdmissionPermit) {
        let coordinator = Arc::clone(&self.coordinator);
        let governor = Arc::clone(&self.governor);
        self.tasks.lock().await.spawn(async move {
            let result = tokio::select! {
                result = coordinator.run(&configuration, execution) => result,
                never = governor.keep_alive(&permit) => match never {},
            };
            governor.release(permit).await;
            result
        });
    }

    /// Collect finished tasks without waiting
    async fn reap(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let mut reaped = 0;
        while let Some(joined) = tasks.try_join_next() {
            log_finished(joined);
            reaped += 1;
        }
        reaped
    }

    /// Apply retention to executions and discoveries, then let the store compact
    async fn prune(&self, now: DateTime<Utc>, report: &mut TickReport) {
        let Some(before) = chrono::Duration::from_std(self.settings.execution_retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
        else {
            return;
        };
        report.pruned = self
            .repos
            .prune_terminal_before(before)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "pruning executions failed");
                0
            });
        report.pruned_discoveries = self
            .repos
            .prune_discoveries_before(before.date_naive())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "pruning discoveries failed");
                0
            });
        report.compacted = self
            .repos
            .maintain(report.pruned + report.pruned_discoveries)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "store maintenance failed");
                false
            });
    }

    /// Stop polling and wait up to `timeout` for in-flight executions
    ///
    /// Executions still running at the deadline are aborted and recorded as
    /// failed; their configurations fire again at the next occurrence.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = SchedulerState::Stopped;
        }
        let mut tasks = self.tasks.lock().await;
        let mut report = DrainReport::default();
        tracing::info!(in_flight = tasks.len(), timeout_ms = timeout.as_millis() as u64, "draining");

        let waited = tokio::time::timeout(timeout, async {
            while let Some(joined) = tasks.join_next().await {
                log_finished(joined);
                report.completed += 1;
            }
        })
        .await;

        if waited.is_err() {
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                if !matches!(&joined, Err(e) if e.is_cancelled()) {
                    log_finished(joined);
                    report.completed += 1;
                }
            }
            for permit in self.governor.release_all().await {
                self.abandon(&permit).await;
                report.aborted += 1;
            }
        }

        tracing::info!(completed = report.completed, aborted = report.aborted, "drained");
        report
    }

    /// Record an execution cut off by shutdown as failed
    async fn abandon(&self, permit: &AdmissionPermit) {
        let id = &permit.execution_id;
        let result = async {
            let Some(execution) = self.repos.get_execution(id).await? else {
                return Ok(());
            };
            if execution.status == ExecutionStatus::Pending {
                self.repos
                    .transition_execution(id, ExecutionEvent::Start { at: self.clock.now() })
                    .await?;
            }
            if !execution.is_terminal() {
                self.repos
                    .transition_execution(
                        id,
                        ExecutionEvent::Fail {
                            at: self.clock.now(),
                            category: ErrorCategory::ConnectionTimeout,
                            detail: "aborted during shutdown".to_string(),
                        },
                    )
                    .await?;
            }
            Ok::<_, EngineError>(())
        }
        .await;
        match result {
            Ok(()) => tracing::warn!(
                execution_id = %id,
                configuration_id = %permit.configuration_id,
                "execution aborted by drain timeout"
            ),
            Err(e) => tracing::error!(execution_id = %id, error = %e, "failed to record aborted execution"),
        }
    }

    /// Poll on `poll_interval` until the returned handle is stopped
    pub fn start(self: Arc<Self>) -> Result<SchedulerHandle, EngineError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyStarted);
        }
        let (shutdown, mut signal) = watch::channel(None::<Duration>);
        let task = tokio::spawn(async move {
            tracing::info!(
                holder = %self.holder(),
                poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
                max_concurrent = self.settings.max_concurrent,
                "scheduler started"
            );
            let mut interval = tokio::time::interval(self.settings.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let drain_timeout = loop {
                tokio::select! {
                    biased;
                    changed = signal.changed() => {
                        let requested = match changed {
                            Ok(()) => *signal.borrow(),
                            Err(_) => None,
                        };
                        break requested.unwrap_or(self.settings.drain_timeout);
                    }
                    _ = interval.tick() => {}
                }
                // Outside select! so a stop request never cancels a tick midway
                if let Err(e) = self.tick().await {
                    tracing::error!(error = %e, "tick failed");
                }
            };
            self.drain(drain_timeout).await
        });
        Ok(SchedulerHandle { shutdown, task })
    }
}

fn log_finished(joined: Result<Result<Execution, EngineError>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(execution)) => tracing::debug!(
            execution_id = %execution.id,
            status = %execution.status,
            "execution finished"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "execution could not be recorded"),
        Err(e) => tracing::error!(error = %e, "execution task failed"),
    }
}

/// Running scheduler; dropping it without [`SchedulerHandle::stop`] drains with the default timeout
pub struct SchedulerHandle {
    shutdown: watch::Sender<Option<Duration>>,
    task: JoinHandle<DrainReport>,
}

impl SchedulerHandle {
    /// Stop polling now and drain in-flight executions for up to `drain_timeout`
    pub async fn stop(self, drain_timeout: Duration) -> Result<DrainReport, EngineError> {
        // The loop may already be gone; the join below reports that
        let _ = self.shutdown.send(Some(drain_timeout));
        self.task
            .await
            .map_err(|e| EngineError::Task(e.to_string()))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
