// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test builders for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::job::{Job, JobId, JobResponse, JobVariable, DEFAULT_JOB_TIMEOUT_SECS};

pub fn job_response(id: &str) -> JobResponse {
    JobResponse {
        id: JobId::new(id),
        token: format!("job-token-{id}"),
        url: "https://ci.example.com".to_string(),
        name: format!("job {id}"),
        variables: Vec::new(),
        script: vec!["make test".to_string()],
        after_script: Vec::new(),
        token_prefixes: Vec::new(),
        timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
    }
}

/// Response whose masked variable values must never reach the trace
pub fn job_response_with_secrets(id: &str, secrets: &[&str]) -> JobResponse {
    let mut response = job_response(id);
    response.variables = secrets
        .iter()
        .enumerate()
        .map(|(i, value)| JobVariable {
            key: format!("SECRET_{i}"),
            value: value.to_string(),
            masked: true,
        })
        .collect();
    response
}

pub fn job(id: &str, now_ms: u64) -> Job {
    Job::new(job_response(id), now_ms)
}
