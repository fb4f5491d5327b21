// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network that never hands out work and accepts everything sent to it

use super::{Network, NetworkError, PatchState, PatchTraceResult, UpdateJobInfo, UpdateState};
use async_trait::async_trait;
use rw_core::{JobCredentials, JobResponse, RunnerInfo};

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNetwork;

impl NoOpNetwork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Network for NoOpNetwork {
    async fn request_job(&self, _runner: &RunnerInfo) -> Result<Option<JobResponse>, NetworkError> {
        Ok(None)
    }

    async fn update_job(&self, _credentials: &JobCredentials, _info: &UpdateJobInfo) -> UpdateState {
        UpdateState::Succeeded
    }

    async fn patch_trace(
        &self,
        _credentials: &JobCredentials,
        content: &[u8],
        start_offset: u64,
    ) -> PatchTraceResult {
        PatchTraceResult {
            sent_offset: start_offset + content.len() as u64,
            state: PatchState::Succeeded,
        }
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
