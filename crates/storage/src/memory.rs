// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-durable store, for agents that opt out of resume and for tests

use crate::policy::StoreConfig;
use crate::store::{JobStore, StoreError};
use parking_lot::Mutex;
use rw_core::{Clock, Job, JobId, SystemClock};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    jobs: BTreeMap<JobId, Job>,
    updates: usize,
    #[cfg(any(test, feature = "test-support"))]
    fail_writes: bool,
}

#[derive(Clone)]
pub struct MemoryJobStore<C: Clock = SystemClock> {
    inner: Arc<Mutex<MemoryState>>,
    config: StoreConfig,
    clock: C,
}

impl MemoryJobStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> MemoryJobStore<C> {
    pub fn with_clock(config: StoreConfig, clock: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState::default())),
            config,
            clock,
        }
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.lock().jobs.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful `update` calls so far
    pub fn update_count(&self) -> usize {
        self.inner.lock().updates
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    #[cfg(any(test, feature = "test-support"))]
    fn check_writable(state: &MemoryState) -> Result<(), StoreError> {
        if state.fail_writes {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-support")))]
    fn check_writable(_state: &MemoryState) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<C: Clock> JobStore for MemoryJobStore<C> {
    fn request(&self) -> Result<Option<Job>, StoreError> {
        let now_ms = self.clock.epoch_ms();
        let mut state = self.inner.lock();
        state
            .jobs
            .retain(|_, job| !self.config.can_delete(job, now_ms));
        Ok(state
            .jobs
            .values()
            .find(|job| self.config.can_resume(job, now_ms))
            .cloned())
    }

    fn update(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        Self::check_writable(&state)?;
        state.jobs.insert(job.id().clone(), job.clone());
        state.updates += 1;
        Ok(())
    }

    fn remove(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        Self::check_writable(&state)?;
        state.jobs.remove(job.id());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.inner.lock().jobs.values().cloned().collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
