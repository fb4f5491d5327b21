// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! A [`Host`] stands in for one machine: its job store lives on disk and
//! outlives any number of simulated agent processes, each built with
//! [`Host::agent`].

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rw_adapters::{ExecutorRegistry, FakeExecutor, FakeExecutorProvider, FakeNetwork};
use rw_core::{RunnerInfo, SystemClock};
use rw_engine::{JobRunner, RunnerConfig, StatefulJobManager, TraceConfig};
use rw_storage::{FileJobStore, JobStore, StoreConfig};
use tempfile::TempDir;

pub type Agent = JobRunner<FakeNetwork, SystemClock>;

pub struct Host {
    dir: TempDir,
    /// Coordinator shared by every agent on this host
    pub net: FakeNetwork,
    /// Remote backend: survives agent restarts
    pub provider: FakeExecutorProvider,
    pub executor: FakeExecutor,
}

impl Host {
    pub fn new() -> Self {
        let provider = FakeExecutorProvider::new("fake");
        Self {
            dir: tempfile::tempdir().unwrap(),
            net: FakeNetwork::new(),
            executor: provider.executor(),
            provider,
        }
    }

    pub fn store_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Open the on-disk store the way a freshly started agent would.
    pub fn open_store(&self) -> Arc<dyn JobStore> {
        Arc::new(FileJobStore::open(self.dir.path(), StoreConfig::default()).unwrap())
    }

    /// A new agent process on this host.
    pub fn agent(&self) -> Agent {
        let manager = StatefulJobManager::new(
            self.net.clone(),
            self.open_store(),
            StoreConfig::default(),
            RunnerInfo {
                token: "runner-token".into(),
                system_id: "s_specs".into(),
                executor: "fake".into(),
            },
            SystemClock,
        );
        let mut registry = ExecutorRegistry::new();
        registry.register(Arc::new(self.provider.clone())).unwrap();
        JobRunner::new(
            manager,
            registry,
            RunnerConfig {
                executor: "fake".into(),
                trace: TraceConfig {
                    update_interval: Duration::from_secs(3),
                    retry_interval: Duration::from_millis(500),
                    output_limit: 64 * 1024,
                    flush_threshold: 16 * 1024,
                    force_send_interval: Duration::from_secs(30),
                },
                ..RunnerConfig::default()
            },
        )
    }

    pub fn stored_jobs(&self) -> usize {
        self.open_store().list().unwrap().len()
    }
}
