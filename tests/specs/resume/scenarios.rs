// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs across agent restarts, with the store on disk.

use crate::prelude::*;
use rw_adapters::{ExecutorCall, JobState, PatchState};
use rw_core::test_support::job_response;
use rw_core::{BuildStage, BuildState, JobId};
use rw_engine::{interrupt_channel, RunOutcome};
use similar_asserts::assert_eq;

fn j1() -> JobId {
    JobId::new("j1")
}

fn count(calls: &[ExecutorCall], call: &ExecutorCall) -> usize {
    calls.iter().filter(|c| *c == call).count()
}

#[tokio::test(start_paused = true)]
async fn uninterrupted_job_runs_every_stage_once() {
    let host = Host::new();
    host.net.push_job(job_response("j1"));

    let (_handle, mut interrupt) = interrupt_channel();
    let report = host.agent().process_next(&mut interrupt).await.unwrap().unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(host.executor.stages(), BuildStage::ALL.to_vec());
    assert_eq!(host.net.updates(&j1())[0].state, JobState::Success);
    assert_eq!(host.stored_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn interrupted_script_resumes_in_a_new_agent() {
    let host = Host::new();
    host.net.push_job(job_response("j1"));
    host.executor.set_resumable(true);
    host.executor.block_at(BuildStage::Script);

    // First agent: interrupted while the script runs
    let first = {
        let agent = host.agent();
        let (handle, mut interrupt) = interrupt_channel();
        let (report, ()) = tokio::join!(agent.process_next(&mut interrupt), async {
            host.executor.wait_blocked().await;
            handle.trigger();
        });
        report.unwrap().unwrap()
    };
    assert_eq!(first.outcome, RunOutcome::Interrupted);
    let stored = host.open_store().list().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].build_state(), BuildState::FailedResumable);
    assert!(host.net.updates(&j1()).is_empty());

    let split = host.executor.calls().len();

    // Second agent: picks the job up from disk
    let (_handle, mut interrupt) = interrupt_channel();
    let second = host.agent().process_next(&mut interrupt).await.unwrap().unwrap();
    assert!(second.resumed);
    assert_eq!(second.outcome, RunOutcome::Succeeded);

    let calls = host.executor.calls();
    let (before, after) = calls.split_at(split);
    for stage in [
        BuildStage::Prepare,
        BuildStage::GetSources,
        BuildStage::RestoreCache,
        BuildStage::DownloadArtifacts,
    ] {
        assert_eq!(count(before, &ExecutorCall::Run(stage)), 1, "{stage}");
        assert_eq!(count(after, &ExecutorCall::Run(stage)), 0, "{stage} re-run");
    }
    assert_eq!(
        after.iter().filter(|c| matches!(c, ExecutorCall::SetState(_))).count(),
        1
    );
    assert_eq!(count(after, &ExecutorCall::Resume(BuildStage::Script)), 1);
    assert_eq!(count(after, &ExecutorCall::Run(BuildStage::Script)), 0);
    for stage in [
        BuildStage::AfterScript,
        BuildStage::ArchiveCache,
        BuildStage::UploadArtifacts,
        BuildStage::Cleanup,
    ] {
        assert_eq!(count(after, &ExecutorCall::Run(stage)), 1, "{stage}");
    }

    assert_eq!(host.net.updates(&j1()).len(), 1);
    assert_eq!(host.net.updates(&j1())[0].state, JobState::Success);
    assert_eq!(host.stored_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn trace_continues_where_the_coordinator_left_off() {
    let host = Host::new();
    host.net.push_job(job_response("j1"));
    host.net.script_patches([PatchState::TransientFailure, PatchState::TransientFailure]);
    host.executor.set_resumable(true);
    host.executor.block_at(BuildStage::Script);
    host.executor.output_at(BuildStage::GetSources, "cloned repository\n");

    {
        let agent = host.agent();
        let (handle, mut interrupt) = interrupt_channel();
        let _ = tokio::join!(agent.process_next(&mut interrupt), async {
            host.executor.wait_blocked().await;
            handle.trigger();
        });
    }
    let (_handle, mut interrupt) = interrupt_channel();
    host.agent().process_next(&mut interrupt).await.unwrap();

    let trace = host.net.trace_string(&j1());
    assert_eq!(trace.matches("cloned repository").count(), 1);
    assert!(trace.contains("Resuming job from step_script (attempt 2)"));

    let offsets = host.net.patch_offsets(&j1());
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]), "{offsets:?}");
    assert!(offsets.last().copied().unwrap_or(0) <= trace.len() as u64);
}

#[tokio::test(start_paused = true)]
async fn failing_stage_is_terminal_and_not_resumed() {
    let host = Host::new();
    host.net.push_job(job_response("j1"));
    host.executor.set_resumable(true);
    host.executor.fail_at(BuildStage::Script, "exit status 2");

    let (_handle, mut interrupt) = interrupt_channel();
    let report = host.agent().process_next(&mut interrupt).await.unwrap().unwrap();

    assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
    assert_eq!(host.net.updates(&j1())[0].state, JobState::Failed);
    assert_eq!(host.stored_jobs(), 0);

    let (_handle, mut interrupt) = interrupt_channel();
    assert!(host.agent().process_next(&mut interrupt).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn non_resumable_backend_reruns_the_interrupted_stage() {
    let host = Host::new();
    host.net.push_job(job_response("j1"));
    host.executor.block_at(BuildStage::Script);

    {
        let agent = host.agent();
        let (handle, mut interrupt) = interrupt_channel();
        let _ = tokio::join!(agent.process_next(&mut interrupt), async {
            host.executor.wait_blocked().await;
            handle.trigger();
        });
    }
    let split = host.executor.calls().len();

    let (_handle, mut interrupt) = interrupt_channel();
    let report = host.agent().process_next(&mut interrupt).await.unwrap().unwrap();

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    let after = &host.executor.calls()[split..];
    assert_eq!(count(after, &ExecutorCall::Run(BuildStage::Script)), 1);
    assert_eq!(count(after, &ExecutorCall::Resume(BuildStage::Script)), 0);
    assert_eq!(count(after, &ExecutorCall::Run(BuildStage::GetSources)), 0);
}
