// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborator interfaces: the coordinator network and execution backends

pub mod executor;
pub mod network;
pub mod traced;

pub use executor::{
    DiscardOutput, Executor, ExecutorError, ExecutorProvider, ExecutorRegistry, OutputHandle,
    PrepareOptions, RegistryError, ResumableExecutor, StageCommand, StageOutput,
};
pub use network::{
    JobState, Network, NetworkError, NoOpNetwork, PatchState, PatchTraceResult, UpdateJobInfo,
    UpdateState,
};
pub use traced::{TracedExecutor, TracedNetwork};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecutorCall, FakeExecutor, FakeExecutorProvider};
#[cfg(any(test, feature = "test-support"))]
pub use network::{FakeNetwork, NetworkCall};
