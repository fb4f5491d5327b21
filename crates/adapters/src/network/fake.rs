// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake coordinator for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Network, NetworkError, PatchState, PatchTraceResult, UpdateJobInfo, UpdateState};
use async_trait::async_trait;
use parking_lot::Mutex;
use rw_core::{JobCredentials, JobId, JobResponse, RunnerInfo};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// Recorded network call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCall {
    RequestJob,
    UpdateJob { id: JobId, info: UpdateJobInfo },
    PatchTrace { id: JobId, offset: u64, len: usize },
}

#[derive(Default)]
struct FakeNetworkState {
    queued: VecDeque<JobResponse>,
    calls: Vec<NetworkCall>,
    /// Trace bytes the coordinator has accepted, per job
    traces: BTreeMap<JobId, Vec<u8>>,
    aborted: BTreeSet<JobId>,
    patch_script: VecDeque<PatchState>,
    update_script: VecDeque<UpdateState>,
    request_error: Option<String>,
}

/// In-memory coordinator.
///
/// Trace patches behave like an idempotent server: content overlapping
/// what was already accepted is skipped, and a patch starting past the
/// accepted end is refused with the current offset.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    inner: Arc<Mutex<FakeNetworkState>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job to be handed out by the next `request_job`.
    pub fn push_job(&self, response: JobResponse) {
        self.inner.lock().queued.push_back(response);
    }

    /// Make the next patches answer with these states before normal handling.
    pub fn script_patches(&self, states: impl IntoIterator<Item = PatchState>) {
        self.inner.lock().patch_script.extend(states);
    }

    /// Make the next updates answer with these states.
    pub fn script_updates(&self, states: impl IntoIterator<Item = UpdateState>) {
        self.inner.lock().update_script.extend(states);
    }

    /// Cancel a job remotely; its patches and updates now report abort.
    pub fn abort_job(&self, id: &JobId) {
        self.inner.lock().aborted.insert(id.clone());
    }

    /// Fail every `request_job` with this message.
    pub fn fail_requests(&self, message: impl Into<String>) {
        self.inner.lock().request_error = Some(message.into());
    }

    pub fn calls(&self) -> Vec<NetworkCall> {
        self.inner.lock().calls.clone()
    }

    /// Trace content accepted for a job
    pub fn trace(&self, id: &JobId) -> Vec<u8> {
        self.inner.lock().traces.get(id).cloned().unwrap_or_default()
    }

    pub fn trace_string(&self, id: &JobId) -> String {
        String::from_utf8_lossy(&self.trace(id)).into_owned()
    }

    /// Status updates received for a job, in order
    pub fn updates(&self, id: &JobId) -> Vec<UpdateJobInfo> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NetworkCall::UpdateJob { id: call_id, info } if call_id == id => {
                    Some(info.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Start offsets of every patch sent for a job
    pub fn patch_offsets(&self, id: &JobId) -> Vec<u64> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NetworkCall::PatchTrace { id: call_id, offset, .. } if call_id == id => {
                    Some(*offset)
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn request_job(&self, _runner: &RunnerInfo) -> Result<Option<JobResponse>, NetworkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(NetworkCall::RequestJob);
        if let Some(message) = &inner.request_error {
            return Err(NetworkError::Unreachable(message.clone()));
        }
        Ok(inner.queued.pop_front())
    }

    async fn update_job(&self, credentials: &JobCredentials, info: &UpdateJobInfo) -> UpdateState {
        let mut inner = self.inner.lock();
        inner.calls.push(NetworkCall::UpdateJob { id: credentials.id.clone(), info: info.clone() });
        if let Some(state) = inner.update_script.pop_front() {
            return state;
        }
        if inner.aborted.contains(&credentials.id) {
            return UpdateState::Abort;
        }
        UpdateState::Succeeded
    }

    async fn patch_trace(
        &self,
        credentials: &JobCredentials,
        content: &[u8],
        start_offset: u64,
    ) -> PatchTraceResult {
        let mut inner = self.inner.lock();
        inner.calls.push(NetworkCall::PatchTrace {
            id: credentials.id.clone(),
            offset: start_offset,
            len: content.len(),
        });

        let accepted = inner.traces.get(&credentials.id).map_or(0, |t| t.len() as u64);
        if let Some(state) = inner.patch_script.pop_front() {
            return PatchTraceResult { sent_offset: accepted, state };
        }
        if inner.aborted.contains(&credentials.id) {
            return PatchTraceResult { sent_offset: accepted, state: PatchState::Aborted };
        }
        if start_offset > accepted {
            // Gap: report where the coordinator actually is
            return PatchTraceResult { sent_offset: accepted, state: PatchState::Succeeded };
        }

        let skip = (accepted - start_offset) as usize;
        let trace = inner.traces.entry(credentials.id.clone()).or_default();
        if skip < content.len() {
            trace.extend_from_slice(&content[skip..]);
        }
        PatchTraceResult { sent_offset: trace.len() as u64, state: PatchState::Succeeded }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
