// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquire, run and settle one job at a time

use crate::build::Build;
use crate::interrupt::Interrupt;
use crate::job_trace::TraceConfig;
use crate::logger::BuildLogger;
use crate::manager::{AcquiredJob, ManagerError, RunOutcome, StatefulJobManager};
use rw_adapters::{Executor, ExecutorRegistry, Network, RegistryError, TracedExecutor};
use rw_core::{Clock, JobId, SystemClock};
use rw_storage::StoreError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Manager(#[from] ManagerError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Registry name of the executor every job runs on
    pub executor: String,
    /// Delay between acquisition attempts when no job is available
    pub check_interval: Duration,
    pub trace: TraceConfig,
    /// Bytes of redacted output kept for failure diagnostics
    pub capture_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executor: "shell".to_string(),
            check_interval: Duration::from_secs(3),
            trace: TraceConfig::default(),
            capture_capacity: 16 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job_id: JobId,
    pub resumed: bool,
    pub outcome: RunOutcome,
}

pub struct JobRunner<N, C: Clock = SystemClock> {
    manager: StatefulJobManager<N, C>,
    registry: ExecutorRegistry,
    config: RunnerConfig,
}

impl<N: Network, C: Clock> JobRunner<N, C> {
    pub fn new(
        manager: StatefulJobManager<N, C>,
        registry: ExecutorRegistry,
        config: RunnerConfig,
    ) -> Self {
        Self { manager, registry, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the next available job to an outcome. `Ok(None)` when there was
    /// nothing to do.
    pub async fn process_next(
        &self,
        interrupt: &mut Interrupt,
    ) -> Result<Option<RunReport>, RunnerError> {
        let provider = self
            .registry
            .get(&self.config.executor)
            .ok_or_else(|| RegistryError::Unknown(self.config.executor.clone()))?;

        let Some(AcquiredJob { handle, resumed }) = self.manager.request_job().await? else {
            return Ok(None);
        };
        let job_id = handle.id();
        let span = tracing::info_span!("job", %job_id, resumed);

        async {
            let start = std::time::Instant::now();
            let context = self.manager.process_job(&handle, self.config.trace.clone());
            let logger = Arc::new(BuildLogger::for_job(
                &handle.snapshot(),
                context.trace.writer(),
                self.config.capture_capacity,
            ));
            let executor: Box<dyn Executor> = Box::new(TracedExecutor::new(provider.create()));

            let build = Build::new(
                handle.clone(),
                executor,
                Arc::clone(&logger),
                context.trace.abort_signal(),
            );
            let result = build.run(interrupt).await;
            logger.close();

            let outcome = self.manager.finalize_job(&handle, context, result).await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::info!(outcome = ?outcome, elapsed_ms, "job finished");
            Ok::<_, RunnerError>(Some(RunReport { job_id: job_id.clone(), resumed, outcome }))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
