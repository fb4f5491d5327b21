// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::executor::{Executor, ExecutorError, PrepareOptions, ResumableExecutor, StageCommand};
use crate::network::{Network, NetworkError, PatchState, PatchTraceResult, UpdateJobInfo, UpdateState};
use async_trait::async_trait;
use rw_core::{JobCredentials, JobResponse, RunnerInfo};
use tracing::Instrument;

/// Wrapper that adds tracing to any Network
#[derive(Clone)]
pub struct TracedNetwork<N> {
    inner: N,
}

impl<N> TracedNetwork<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: Network> Network for TracedNetwork<N> {
    async fn request_job(&self, runner: &RunnerInfo) -> Result<Option<JobResponse>, NetworkError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.request_job(runner).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(Some(job)) => tracing::info!(job_id = %job.id, elapsed_ms, "job received"),
                Ok(None) => tracing::debug!(elapsed_ms, "no job available"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "request failed"),
            }
            result
        }
        .instrument(tracing::info_span!("network.request_job", executor = %runner.executor))
        .await
    }

    async fn update_job(&self, credentials: &JobCredentials, info: &UpdateJobInfo) -> UpdateState {
        async {
            tracing::debug!(state = ?info.state, trace_bytes = info.trace_bytes, "sending");
            let start = std::time::Instant::now();
            let result = self.inner.update_job(credentials, info).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match result {
                UpdateState::Succeeded => tracing::info!(elapsed_ms, "update accepted"),
                UpdateState::Failed | UpdateState::NotFound => {
                    tracing::warn!(elapsed_ms, result = ?result, "update not accepted")
                }
                other => tracing::info!(elapsed_ms, result = ?other, "update answered"),
            }
            result
        }
        .instrument(tracing::info_span!("network.update_job", job_id = %credentials.id))
        .await
    }

    async fn patch_trace(
        &self,
        credentials: &JobCredentials,
        content: &[u8],
        start_offset: u64,
    ) -> PatchTraceResult {
        let result = self.inner.patch_trace(credentials, content, start_offset).await;
        tracing::info_span!("network.patch_trace", job_id = %credentials.id, start_offset).in_scope(
            || match result.state {
                PatchState::Succeeded => {
                    tracing::trace!(len = content.len(), sent_offset = result.sent_offset, "patched")
                }
                PatchState::Aborted => tracing::info!("job aborted by coordinator"),
                PatchState::TransientFailure => tracing::warn!(len = content.len(), "patch failed"),
            },
        );
        result
    }
}

/// Wrapper that adds tracing to any Executor
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: Executor> Executor for TracedExecutor<E> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn prepare(&mut self, options: PrepareOptions) -> Result<(), ExecutorError> {
        let span = tracing::info_span!("executor.prepare", executor = self.inner.name(), job_id = %options.job_id);
        async {
            tracing::info!("starting");
            let start = std::time::Instant::now();
            let result = self.inner.prepare(options).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "executor prepared"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "prepare failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&mut self, command: &StageCommand) -> Result<(), ExecutorError> {
        let span = tracing::info_span!("executor.run", stage = %command.stage);
        async {
            tracing::info!(lines = command.script.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.run(command).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "stage completed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "stage failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn finish(&mut self, error: Option<&str>) {
        tracing::info_span!("executor.finish", failed = error.is_some())
            .in_scope(|| tracing::debug!("finishing"));
        self.inner.finish(error).await
    }

    async fn cleanup(&mut self) {
        self.inner.cleanup().await;
        tracing::info_span!("executor.cleanup").in_scope(|| tracing::info!("cleaned up"));
    }

    fn as_resumable(&mut self) -> Option<&mut dyn ResumableExecutor> {
        let resumable = self.inner.as_resumable();
        tracing::trace!(resumable = resumable.is_some(), "checked");
        resumable
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
