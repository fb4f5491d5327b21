// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job payload, build state and the resumable runtime record.

use crate::snapshot::ExecutorSnapshot;
use crate::stage::BuildStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

crate::define_id! {
    /// Identifier assigned to a job by the coordinator.
    ///
    /// Also names the job's record in the store, so it must stay stable
    /// across resumes.
    pub struct JobId;
}

/// Default execution timeout when the coordinator does not send one
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 3600;

/// Identity this agent presents when asking for work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerInfo {
    pub token: String,
    pub system_id: String,
    pub executor: String,
}

/// Per-job credentials used for trace patches and state updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCredentials {
    pub id: JobId,
    pub token: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobVariable {
    pub key: String,
    pub value: String,
    /// Masked variables have their values redacted from the trace
    #[serde(default)]
    pub masked: bool,
}

/// Work handed out by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: JobId,
    pub token: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: Vec<JobVariable>,
    #[serde(default)]
    pub script: Vec<String>,
    #[serde(default)]
    pub after_script: Vec<String>,
    /// Extra token prefixes to redact alongside the default one
    #[serde(default)]
    pub token_prefixes: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_JOB_TIMEOUT_SECS
}

impl JobResponse {
    pub fn credentials(&self) -> JobCredentials {
        JobCredentials {
            id: self.id.clone(),
            token: self.token.clone(),
            url: self.url.clone(),
        }
    }

    /// Values of masked variables; these become redaction phrases.
    pub fn masked_values(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|v| v.masked)
            .map(|v| v.value.clone())
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Lifecycle state of a build as persisted with the job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    #[default]
    Pending,
    Running,
    /// Interrupted with state persisted; a later acquisition may resume it
    FailedResumable,
    Succeeded,
    FailedTerminal,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Succeeded | BuildState::FailedTerminal)
    }

    /// Owned by a live process as far as the record can tell
    pub fn is_active(self) -> bool {
        matches!(self, BuildState::Pending | BuildState::Running)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildState::Pending => "pending",
            BuildState::Running => "running",
            BuildState::FailedResumable => "failed_resumable",
            BuildState::Succeeded => "succeeded",
            BuildState::FailedTerminal => "failed_terminal",
        };
        f.write_str(s)
    }
}

/// Everything needed to pick a job back up after the process dies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRuntimeState {
    pub retries: u32,
    pub build_state: BuildState,
    /// Stage cursor: the stage currently (or last) executing
    pub stage: Option<BuildStage>,
    pub health_check_at_ms: u64,
    pub started_at_ms: u64,
    /// Trace offset already acknowledged by the coordinator
    pub sent_trace: u64,
    pub executor_state: Option<ExecutorSnapshot>,
    pub resumed_from_stage: Option<BuildStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub response: JobResponse,
    #[serde(default)]
    pub state: JobRuntimeState,
}

impl Job {
    pub fn new(response: JobResponse, now_ms: u64) -> Self {
        Self {
            response,
            state: JobRuntimeState {
                started_at_ms: now_ms,
                health_check_at_ms: now_ms,
                ..JobRuntimeState::default()
            },
        }
    }

    pub fn id(&self) -> &JobId {
        &self.response.id
    }

    pub fn credentials(&self) -> JobCredentials {
        self.response.credentials()
    }

    /// Record another attempt starting from the persisted stage cursor.
    pub fn mark_resumed(&mut self) {
        self.state.retries += 1;
        self.state.resumed_from_stage = self.state.stage;
    }

    /// The stage that must be resumed instead of run, if any.
    pub fn resumed_from(&self) -> Option<BuildStage> {
        self.state.resumed_from_stage
    }

    /// Drop resume bookkeeping once the resumed stage has completed.
    pub fn clear_resume(&mut self) {
        self.state.resumed_from_stage = None;
        self.state.executor_state = None;
    }

    pub fn enter_stage(&mut self, stage: BuildStage) {
        self.state.stage = Some(stage);
        self.state.build_state = BuildState::Running;
    }

    pub fn set_build_state(&mut self, state: BuildState) {
        self.state.build_state = state;
    }

    pub fn build_state(&self) -> BuildState {
        self.state.build_state
    }

    pub fn update_health(&mut self, now_ms: u64) {
        self.state.health_check_at_ms = now_ms;
    }

    /// Advance the acknowledged trace offset; never moves backwards.
    pub fn record_sent_trace(&mut self, offset: u64) {
        self.state.sent_trace = self.state.sent_trace.max(offset);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
