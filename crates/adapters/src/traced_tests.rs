// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::{DiscardOutput, ExecutorCall, FakeExecutor};
use crate::network::{FakeNetwork, NetworkCall};
use rw_core::test_support::job_response;
use rw_core::{BuildStage, JobId};
use serial_test::{parallel, serial};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

/// Assert that captured logs contain the expected substring
fn assert_log(logs: &str, label: &str, expected: &str) {
    assert!(logs.contains(expected), "Should log {label}. Logs:\n{logs}",);
}

fn runner() -> RunnerInfo {
    RunnerInfo { token: "t".into(), system_id: "s".into(), executor: "fake".into() }
}

fn prepare_options() -> PrepareOptions {
    PrepareOptions {
        job_id: JobId::new("job-7"),
        job_name: "build".to_string(),
        variables: Vec::new(),
        output: Arc::new(DiscardOutput),
    }
}

fn script(stage: BuildStage) -> StageCommand {
    StageCommand::new(stage, vec!["make".to_string()])
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
#[serial(tracing)]
fn traced_network_request_logs_received_job() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNetwork::new();
        fake.push_job(job_response("job-1"));
        TracedNetwork::new(fake).request_job(&runner()).await
    });

    assert!(result.is_ok());
    assert_log(&logs, "span name", "network.request_job");
    assert_log(&logs, "job id", "job-1");
    assert_log(&logs, "completion", "job received");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn traced_network_request_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNetwork::new();
        fake.fail_requests("connection refused");
        TracedNetwork::new(fake).request_job(&runner()).await
    });

    assert!(result.is_err());
    assert_log(&logs, "failure", "request failed");
    assert_log(&logs, "error detail", "connection refused");
}

#[test]
#[serial(tracing)]
fn traced_network_update_logs_state() {
    let (logs, _) = with_tracing(|| async {
        let creds = job_response("job-2").credentials();
        TracedNetwork::new(FakeNetwork::new())
            .update_job(&creds, &UpdateJobInfo::success(12))
            .await
    });

    assert_log(&logs, "span name", "network.update_job");
    assert_log(&logs, "job id", "job-2");
    assert_log(&logs, "accepted", "update accepted");
}

#[test]
#[serial(tracing)]
fn traced_network_patch_logs_transient_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNetwork::new();
        fake.script_patches([PatchState::TransientFailure]);
        let creds = job_response("job-3").credentials();
        TracedNetwork::new(fake).patch_trace(&creds, b"output", 0).await
    });

    assert_eq!(result.state, PatchState::TransientFailure);
    assert_log(&logs, "span name", "network.patch_trace");
    assert_log(&logs, "warning", "patch failed");
}

#[test]
#[serial(tracing)]
fn traced_executor_run_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let mut traced = TracedExecutor::new(FakeExecutor::new("fake"));
        traced.prepare(prepare_options()).await.unwrap();
        traced.run(&script(BuildStage::Script)).await
    });

    assert!(result.is_ok());
    assert_log(&logs, "prepare span", "executor.prepare");
    assert_log(&logs, "job id", "job-7");
    assert_log(&logs, "run span", "executor.run");
    assert_log(&logs, "stage name", "step_script");
    assert_log(&logs, "completion", "stage completed");
}

#[test]
#[serial(tracing)]
fn traced_executor_run_logs_error_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeExecutor::new("fake");
        fake.fail_at(BuildStage::Script, "exit status 2");
        TracedExecutor::new(fake).run(&script(BuildStage::Script)).await
    });

    assert!(result.is_err());
    assert_log(&logs, "failure", "stage failed");
    assert_log(&logs, "error detail", "exit status 2");
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
#[parallel(tracing)]
async fn traced_network_delegates_patches() {
    let fake = FakeNetwork::new();
    let traced = TracedNetwork::new(fake.clone());
    let creds = job_response("job-4").credentials();

    let result = traced.patch_trace(&creds, b"abc", 0).await;

    assert_eq!(result.sent_offset, 3);
    assert_eq!(
        fake.calls(),
        vec![NetworkCall::PatchTrace { id: creds.id.clone(), offset: 0, len: 3 }]
    );
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_executor_delegates_lifecycle() {
    let fake = FakeExecutor::new("fake");
    let mut traced = TracedExecutor::new(fake.clone());

    traced.run(&script(BuildStage::GetSources)).await.unwrap();
    traced.finish(Some("boom")).await;
    traced.cleanup().await;

    assert_eq!(
        fake.calls(),
        vec![
            ExecutorCall::Run(BuildStage::GetSources),
            ExecutorCall::Finish(Some("boom".to_string())),
            ExecutorCall::Cleanup,
        ]
    );
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_executor_exposes_inner_resume_capability() {
    let fake = FakeExecutor::new("fake");
    let mut traced = TracedExecutor::new(fake.clone());
    assert!(traced.as_resumable().is_none());

    fake.set_resumable(true);
    assert!(traced.as_resumable().is_some());
}

#[tokio::test]
#[parallel(tracing)]
async fn traced_boxed_executor_keeps_name() {
    let boxed: Box<dyn Executor> = Box::new(FakeExecutor::new("boxed"));
    let traced = TracedExecutor::new(boxed);
    assert_eq!(traced.name(), "boxed");
}
