// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rw_core::test_support::job_response;

fn runner() -> RunnerInfo {
    RunnerInfo { token: "t".into(), system_id: "s".into(), executor: "shell".into() }
}

#[tokio::test]
async fn hands_out_queued_jobs_in_order() {
    let net = FakeNetwork::new();
    net.push_job(job_response("a"));
    net.push_job(job_response("b"));

    let first = net.request_job(&runner()).await.unwrap().unwrap();
    let second = net.request_job(&runner()).await.unwrap().unwrap();
    assert_eq!(first.id, "a");
    assert_eq!(second.id, "b");
    assert!(net.request_job(&runner()).await.unwrap().is_none());
    assert_eq!(net.calls().len(), 3);
}

#[tokio::test]
async fn request_failure_is_an_error() {
    let net = FakeNetwork::new();
    net.fail_requests("down");
    assert!(matches!(net.request_job(&runner()).await, Err(NetworkError::Unreachable(_))));
}

#[tokio::test]
async fn overlapping_patches_are_idempotent() {
    let net = FakeNetwork::new();
    let creds = job_response("j").credentials();

    let r1 = net.patch_trace(&creds, b"hello ", 0).await;
    assert_eq!(r1.sent_offset, 6);
    // Resend from an older offset, as after a crash
    let r2 = net.patch_trace(&creds, b"lo world", 3).await;
    assert_eq!(r2, PatchTraceResult { sent_offset: 11, state: PatchState::Succeeded });
    assert_eq!(net.trace_string(&creds.id), "hello world");
    assert_eq!(net.patch_offsets(&creds.id), vec![0, 3]);
}

#[tokio::test]
async fn patch_past_the_end_reports_current_offset() {
    let net = FakeNetwork::new();
    let creds = job_response("j").credentials();
    let result = net.patch_trace(&creds, b"late", 10).await;
    assert_eq!(result.sent_offset, 0);
    assert!(net.trace(&creds.id).is_empty());
}

#[tokio::test]
async fn scripted_patch_states_come_first() {
    let net = FakeNetwork::new();
    let creds = job_response("j").credentials();
    net.script_patches([PatchState::TransientFailure]);

    let failed = net.patch_trace(&creds, b"abc", 0).await;
    assert_eq!(failed.state, PatchState::TransientFailure);
    let ok = net.patch_trace(&creds, b"abc", 0).await;
    assert_eq!(ok, PatchTraceResult { sent_offset: 3, state: PatchState::Succeeded });
}

#[tokio::test]
async fn aborted_job_rejects_patches_and_updates() {
    let net = FakeNetwork::new();
    let creds = job_response("j").credentials();
    net.abort_job(&creds.id);

    assert_eq!(net.patch_trace(&creds, b"x", 0).await.state, PatchState::Aborted);
    assert_eq!(net.update_job(&creds, &UpdateJobInfo::running(0)).await, UpdateState::Abort);
}

#[tokio::test]
async fn records_updates_per_job() {
    let net = FakeNetwork::new();
    let a = job_response("a").credentials();
    let b = job_response("b").credentials();
    net.script_updates([UpdateState::AcceptedButNotCompleted]);

    assert_eq!(
        net.update_job(&a, &UpdateJobInfo::success(4)).await,
        UpdateState::AcceptedButNotCompleted
    );
    net.update_job(&b, &UpdateJobInfo::failed("boom", 0)).await;
    net.update_job(&a, &UpdateJobInfo::success(4)).await;

    assert_eq!(net.updates(&a.id), vec![UpdateJobInfo::success(4), UpdateJobInfo::success(4)]);
    assert_eq!(net.updates(&b.id)[0].failure_reason.as_deref(), Some("boom"));
}
