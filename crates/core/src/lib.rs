// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rw-core: Core types for the Runwell job execution engine

pub mod clock;
pub mod id;
pub mod job;
pub mod snapshot;
pub mod stage;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{new_system_id, ShortId};
pub use job::{
    BuildState, Job, JobCredentials, JobId, JobResponse, JobRuntimeState, JobVariable, RunnerInfo,
};
pub use snapshot::{ExecutorSnapshot, SnapshotError};
pub use stage::BuildStage;
