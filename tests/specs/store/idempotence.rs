// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repeated store writes and removals settle to the same on-disk state.

use crate::prelude::*;
use rw_core::test_support::job;
use rw_core::{BuildStage, BuildState, Clock, ExecutorSnapshot, SystemClock};
use rw_storage::JobStore;
use similar_asserts::assert_eq;

fn record_files(host: &Host) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(host.store_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn suspended_job() -> rw_core::Job {
    let mut job = job("j1", SystemClock.epoch_ms());
    job.enter_stage(BuildStage::Script);
    job.state.executor_state =
        Some(ExecutorSnapshot::from(serde_json::json!({ "container": "c-1" })));
    job.set_build_state(BuildState::FailedResumable);
    job
}

#[test]
fn repeated_update_with_same_state_is_invisible() {
    let host = Host::new();
    let store = host.open_store();
    let job = suspended_job();

    store.update(&job).unwrap();
    let once = store.list().unwrap();
    let files = record_files(&host);

    store.update(&job).unwrap();
    store.update(&job).unwrap();

    assert_eq!(store.list().unwrap(), once);
    assert_eq!(record_files(&host), files);
}

#[test]
fn removing_twice_is_the_same_as_once() {
    let host = Host::new();
    let store = host.open_store();
    let job = suspended_job();
    store.update(&job).unwrap();

    store.remove(&job).unwrap();
    let after_first = record_files(&host);
    store.remove(&job).unwrap();

    assert_eq!(record_files(&host), after_first);
    assert!(store.list().unwrap().is_empty());
    assert!(store.request().unwrap().is_none());
}

#[test]
fn suspended_job_survives_reopening() {
    let host = Host::new();
    let job = suspended_job();
    host.open_store().update(&job).unwrap();

    let resumed = host.open_store().request().unwrap().unwrap();

    assert_eq!(resumed.id(), job.id());
    assert_eq!(resumed.state.stage, Some(BuildStage::Script));
    assert_eq!(resumed.state.executor_state, job.state.executor_state);
}
