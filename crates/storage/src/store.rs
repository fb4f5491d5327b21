// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rw_core::Job;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
    #[error("record version {found} is newer than supported ({supported})")]
    UnsupportedVersion { found: u64, supported: u64 },
    #[error("job id {0:?} cannot name a store record")]
    InvalidJobId(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for the resumable state of jobs owned by this agent.
///
/// A job is resumable exactly while the store holds it. Callers own a job
/// one at a time, so implementations need no cross-job locking.
pub trait JobStore: Send + Sync {
    /// A previously owned job that can be resumed, or `None`.
    ///
    /// Records that can never be resumed again are removed on the way.
    fn request(&self) -> Result<Option<Job>, StoreError>;

    /// Persist the job's current state, replacing any earlier record.
    fn update(&self, job: &Job) -> Result<(), StoreError>;

    /// Forget the job. Removing an absent job succeeds.
    fn remove(&self, job: &Job) -> Result<(), StoreError>;

    /// All readable records, in id order.
    fn list(&self) -> Result<Vec<Job>, StoreError>;
}

impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    fn request(&self) -> Result<Option<Job>, StoreError> {
        (**self).request()
    }

    fn update(&self, job: &Job) -> Result<(), StoreError> {
        (**self).update(job)
    }

    fn remove(&self, job: &Job) -> Result<(), StoreError> {
        (**self).remove(job)
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        (**self).list()
    }
}
