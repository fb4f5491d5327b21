// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Runwell execution engine

mod build;
mod handle;
mod interrupt;
mod job_trace;
mod logger;
mod manager;
mod runner;

pub use build::{Build, BuildError, FAILURE_STAGE_TIMEOUT};
pub use handle::JobHandle;
pub use interrupt::{interrupt_channel, Interrupt, InterruptHandle};
pub use job_trace::{AbortSignal, JobTrace, TraceConfig, TraceOutcome, TraceProgress, TraceWriter};
pub use logger::BuildLogger;
pub use manager::{
    AcquiredJob, HealthTicker, JobContext, ManagerError, RunOutcome, StatefulJobManager,
};
pub use runner::{JobRunner, RunReport, RunnerConfig, RunnerError};

#[cfg(test)]
mod test_helpers;
