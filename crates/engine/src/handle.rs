// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, persistable view of the job being run

use crate::job_trace::TraceProgress;
use parking_lot::Mutex;
use rw_core::{BuildState, Clock, Job, JobId};
use rw_storage::{JobStore, StoreError};
use std::sync::Arc;

/// The in-flight job plus the store that makes it resumable.
///
/// Clones share the same job. Persisting holds the job lock for the whole
/// store write so concurrent persists land in order.
#[derive(Clone)]
pub struct JobHandle {
    job: Arc<Mutex<Job>>,
    store: Arc<dyn JobStore>,
    now: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl JobHandle {
    pub fn new<C: Clock>(job: Job, store: Arc<dyn JobStore>, clock: C) -> Self {
        Self {
            job: Arc::new(Mutex::new(job)),
            store,
            now: Arc::new(move || clock.epoch_ms()),
        }
    }

    pub fn id(&self) -> JobId {
        self.job.lock().id().clone()
    }

    /// Copy of the current job state
    pub fn snapshot(&self) -> Job {
        self.job.lock().clone()
    }

    /// Change the in-memory job without persisting.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Job) -> R) -> R {
        f(&mut self.job.lock())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        let job = self.job.lock();
        self.store.update(&job)
    }

    /// Refresh the health timestamp and persist.
    pub fn touch(&self) -> Result<(), StoreError> {
        let mut job = self.job.lock();
        job.update_health((self.now)());
        self.store.update(&job)
    }

    /// Record the final build state and persist it.
    pub fn complete(&self, state: BuildState) -> Result<(), StoreError> {
        let mut job = self.job.lock();
        job.set_build_state(state);
        self.store.update(&job)
    }

    /// Drop the persisted record; the job can no longer be resumed.
    pub fn release(&self) -> Result<(), StoreError> {
        let job = self.job.lock();
        self.store.remove(&job)
    }
}

impl TraceProgress for JobHandle {
    /// Record and persist the offset so a resumed trace starts where the
    /// coordinator already is.
    fn acknowledged(&self, offset: u64) {
        let mut job = self.job.lock();
        job.record_sent_trace(offset);
        if let Err(e) = self.store.update(&job) {
            tracing::warn!(job_id = %job.id(), error = %e, "failed to persist trace offset");
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
