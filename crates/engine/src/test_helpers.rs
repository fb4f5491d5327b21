// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::{
    Build, BuildLogger, JobHandle, JobRunner, JobTrace, RunnerConfig, StatefulJobManager,
    TraceConfig,
};
use rw_adapters::{ExecutorRegistry, FakeExecutor, FakeExecutorProvider, FakeNetwork};
use rw_core::{Clock, FakeClock, Job, RunnerInfo};
use rw_storage::{MemoryJobStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;

pub(crate) type TestRunner = JobRunner<FakeNetwork, FakeClock>;

/// Fakes wired together the way the daemon wires real adapters.
pub(crate) struct TestContext {
    pub net: FakeNetwork,
    pub store: MemoryJobStore<FakeClock>,
    pub clock: FakeClock,
    pub provider: FakeExecutorProvider,
    pub executor: FakeExecutor,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        let provider = FakeExecutorProvider::new("fake");
        Self {
            net: FakeNetwork::new(),
            store: MemoryJobStore::with_clock(StoreConfig::default(), clock.clone()),
            executor: provider.executor(),
            clock,
            provider,
        }
    }

    pub fn trace_config() -> TraceConfig {
        TraceConfig {
            update_interval: Duration::from_secs(3),
            retry_interval: Duration::from_secs(1),
            output_limit: 64 * 1024,
            flush_threshold: 16 * 1024,
            force_send_interval: Duration::from_secs(30),
        }
    }

    pub fn manager(&self) -> StatefulJobManager<FakeNetwork, FakeClock> {
        StatefulJobManager::new(
            self.net.clone(),
            Arc::new(self.store.clone()),
            StoreConfig::default(),
            RunnerInfo {
                token: "runner-token".into(),
                system_id: "s_test".into(),
                executor: "fake".into(),
            },
            self.clock.clone(),
        )
    }

    pub fn runner(&self) -> TestRunner {
        let mut registry = ExecutorRegistry::new();
        let _ = registry.register(Arc::new(self.provider.clone()));
        JobRunner::new(
            self.manager(),
            registry,
            RunnerConfig {
                executor: "fake".into(),
                trace: Self::trace_config(),
                ..RunnerConfig::default()
            },
        )
    }

    pub fn handle(&self, job: Job) -> JobHandle {
        JobHandle::new(job, Arc::new(self.store.clone()), self.clock.clone())
    }

    /// A build over `job` with its own trace, bypassing acquisition.
    pub fn build(&self, job: Job) -> BuildParts {
        let handle = self.handle(job);
        let snapshot = handle.snapshot();
        let trace = JobTrace::start(
            self.net.clone(),
            snapshot.credentials(),
            snapshot.state.sent_trace,
            Self::trace_config(),
            None,
        );
        let logger = Arc::new(BuildLogger::for_job(&snapshot, trace.writer(), 4096));
        let build = Build::new(
            handle.clone(),
            Box::new(self.executor.clone()),
            Arc::clone(&logger),
            trace.abort_signal(),
        );
        BuildParts { build, handle, trace, logger }
    }

    pub fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

pub(crate) struct BuildParts {
    pub build: Build,
    pub handle: JobHandle,
    pub trace: JobTrace<FakeNetwork>,
    pub logger: Arc<BuildLogger>,
}
