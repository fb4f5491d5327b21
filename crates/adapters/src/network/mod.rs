// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator network interface

mod noop;

pub use noop::NoOpNetwork;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNetwork, NetworkCall};

use async_trait::async_trait;
use rw_core::{JobCredentials, JobResponse, RunnerInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from network operations that have no status-carrying result
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("coordinator unreachable: {0}")]
    Unreachable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Job state reported in a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Success,
    Failed,
}

/// Payload of a job status update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateJobInfo {
    pub state: JobState,
    pub failure_reason: Option<String>,
    /// Total bytes of trace content produced for the job
    pub trace_bytes: u64,
}

impl UpdateJobInfo {
    pub fn running(trace_bytes: u64) -> Self {
        Self { state: JobState::Running, failure_reason: None, trace_bytes }
    }

    pub fn success(trace_bytes: u64) -> Self {
        Self { state: JobState::Success, failure_reason: None, trace_bytes }
    }

    pub fn failed(reason: impl Into<String>, trace_bytes: u64) -> Self {
        Self { state: JobState::Failed, failure_reason: Some(reason.into()), trace_bytes }
    }
}

/// Coordinator response to a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Succeeded,
    /// Accepted, but the coordinator wants the update repeated
    AcceptedButNotCompleted,
    NotFound,
    /// The coordinator cancelled the job
    Abort,
    Failed,
}

impl UpdateState {
    /// Whether a final update must be sent again
    pub fn should_retry(self) -> bool {
        matches!(self, UpdateState::Failed | UpdateState::AcceptedButNotCompleted)
    }
}

/// Outcome class of a trace patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    Succeeded,
    /// The coordinator cancelled the job; no further output is wanted
    Aborted,
    TransientFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchTraceResult {
    /// Offset the coordinator reports as received
    pub sent_offset: u64,
    pub state: PatchState,
}

/// The remote coordinator: hands out jobs and receives status and output.
#[async_trait]
pub trait Network: Clone + Send + Sync + 'static {
    /// Ask for a new job. `Ok(None)` means nothing is queued.
    async fn request_job(&self, runner: &RunnerInfo) -> Result<Option<JobResponse>, NetworkError>;

    async fn update_job(&self, credentials: &JobCredentials, info: &UpdateJobInfo) -> UpdateState;

    /// Send trace bytes starting at `start_offset` of the job's log.
    async fn patch_trace(
        &self,
        credentials: &JobCredentials,
        content: &[u8],
        start_offset: u64,
    ) -> PatchTraceResult;
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
