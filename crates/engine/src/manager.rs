// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-first job acquisition and finalization

use crate::build::BuildError;
use crate::handle::JobHandle;
use crate::job_trace::{JobTrace, TraceConfig, TraceOutcome, TraceProgress};
use rw_adapters::{Network, NetworkError};
use rw_core::{BuildState, Clock, Job, JobId, RunnerInfo, SystemClock};
use rw_storage::{JobStore, StoreConfig, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// A job ready to run
pub struct AcquiredJob {
    pub handle: JobHandle,
    /// Recovered from the store rather than handed out by the coordinator
    pub resumed: bool,
}

/// How a job's run ended, as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed { reason: String },
    /// State persisted; a later acquisition resumes the job
    Interrupted,
    /// The coordinator cancelled the job
    Aborted,
}

/// Periodically refreshes and persists the job's health timestamp.
pub struct HealthTicker {
    task: Option<JoinHandle<()>>,
}

impl HealthTicker {
    pub fn spawn(handle: JobHandle, interval: std::time::Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = handle.touch() {
                    tracing::warn!(job_id = %handle.id(), error = %e, "failed to persist job health");
                }
            }
        });
        Self { task: Some(task) }
    }

    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HealthTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Reporting context bound to one job's credentials
pub struct JobContext<N: Network> {
    pub trace: JobTrace<N>,
    pub health: HealthTicker,
}

/// Hands out jobs, preferring unfinished ones from the store.
pub struct StatefulJobManager<N, C: Clock = SystemClock> {
    network: N,
    store: Arc<dyn JobStore>,
    config: StoreConfig,
    runner: RunnerInfo,
    clock: C,
}

impl<N: Network, C: Clock> StatefulJobManager<N, C> {
    pub fn new(
        network: N,
        store: Arc<dyn JobStore>,
        config: StoreConfig,
        runner: RunnerInfo,
        clock: C,
    ) -> Self {
        Self { network, store, config, runner, clock }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Next job to run: a resumable one from the store, else a new one
    /// from the coordinator.
    ///
    /// Either way the job is persisted before it is returned, so a crash
    /// from here on leaves it resumable.
    pub async fn request_job(&self) -> Result<Option<AcquiredJob>, ManagerError> {
        let now = self.clock.epoch_ms();

        if let Some(mut job) = self.store.request()? {
            job.mark_resumed();
            job.set_build_state(BuildState::Running);
            job.update_health(now);
            self.store.update(&job)?;
            tracing::info!(
                job_id = %job.id(),
                retries = job.state.retries,
                stage = ?job.resumed_from(),
                "resuming job from store"
            );
            return Ok(Some(self.acquired(job, true)));
        }

        let Some(response) = self.network.request_job(&self.runner).await? else {
            return Ok(None);
        };
        let job = Job::new(response, now);
        self.store.update(&job)?;
        tracing::info!(job_id = %job.id(), "acquired job");
        Ok(Some(self.acquired(job, false)))
    }

    fn acquired(&self, job: Job, resumed: bool) -> AcquiredJob {
        let handle = JobHandle::new(job, Arc::clone(&self.store), self.clock.clone());
        AcquiredJob { handle, resumed }
    }

    /// Open the job's trace, continuing at its acknowledged offset, and
    /// start its health ticker.
    pub fn process_job(&self, handle: &JobHandle, trace_config: TraceConfig) -> JobContext<N> {
        let job = handle.snapshot();
        let progress: Arc<dyn TraceProgress> = Arc::new(handle.clone());
        let trace = JobTrace::start(
            self.network.clone(),
            job.credentials(),
            job.state.sent_trace,
            trace_config,
            Some(progress),
        );
        let health = HealthTicker::spawn(handle.clone(), self.config.health_interval);
        JobContext { trace, health }
    }

    /// Settle the store and the coordinator after a build.
    ///
    /// Terminal results are persisted, reported, then removed from the
    /// store, so a crash in between never loses a resumable job. An
    /// interrupted build keeps its record. A store failure during the build
    /// is returned as is.
    pub async fn finalize_job(
        &self,
        handle: &JobHandle,
        context: JobContext<N>,
        result: Result<(), BuildError>,
    ) -> Result<RunOutcome, StoreError> {
        let JobContext { trace, health } = context;
        health.stop();
        let job_id: JobId = handle.id();

        let failure = match result {
            Ok(()) => None,
            Err(BuildError::Store(e)) => {
                trace.detach().await;
                return Err(e);
            }
            Err(e) if e.is_resumable() => {
                trace.detach().await;
                // Surfaces a store failure the offset writes only logged
                handle.persist()?;
                tracing::info!(%job_id, error = %e, "job interrupted, state kept for resume");
                return Ok(RunOutcome::Interrupted);
            }
            Err(BuildError::Aborted) => {
                trace.abandon().await;
                handle.complete(BuildState::FailedTerminal)?;
                handle.release()?;
                tracing::info!(%job_id, "job aborted by coordinator");
                return Ok(RunOutcome::Aborted);
            }
            Err(e) => Some(e),
        };

        let outcome = match &failure {
            None => {
                handle.complete(BuildState::Succeeded)?;
                trace.success().await
            }
            Some(e) => {
                handle.complete(BuildState::FailedTerminal)?;
                trace.fail(e.failure_reason()).await
            }
        };
        handle.release()?;

        Ok(match (outcome, failure) {
            (TraceOutcome::Aborted, _) => RunOutcome::Aborted,
            (TraceOutcome::Updated(_), None) => RunOutcome::Succeeded,
            (TraceOutcome::Updated(_), Some(e)) => RunOutcome::Failed { reason: e.to_string() },
        })
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
