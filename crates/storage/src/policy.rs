// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which stored jobs may be resumed and which are garbage

use rw_core::{BuildState, Job};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How often a running job refreshes its health timestamp
    pub health_interval: Duration,
    /// A running job silent for longer than this is considered abandoned
    pub health_timeout: Duration,
    /// Attempts allowed after the first one
    pub max_retries: u32,
    /// Records older than this are dropped whatever their state
    pub stale_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            health_interval: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5 * 60),
            max_retries: 3,
            stale_timeout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

fn elapsed_since(now_ms: u64, then_ms: u64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(then_ms))
}

impl StoreConfig {
    /// No live process is driving the job any more.
    fn is_unattended(&self, job: &Job, now_ms: u64) -> bool {
        match job.build_state() {
            BuildState::FailedResumable => true,
            state if state.is_active() => {
                elapsed_since(now_ms, job.state.health_check_at_ms) > self.health_timeout
            }
            _ => false,
        }
    }

    pub fn can_resume(&self, job: &Job, now_ms: u64) -> bool {
        job.state.retries < self.max_retries && self.is_unattended(job, now_ms)
    }

    pub fn can_delete(&self, job: &Job, now_ms: u64) -> bool {
        if job.build_state().is_terminal() {
            return true;
        }
        if elapsed_since(now_ms, job.state.started_at_ms) > self.stale_timeout {
            return true;
        }
        job.state.retries >= self.max_retries && self.is_unattended(job, now_ms)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
