// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, the job loop, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use rw_adapters::{ExecutorRegistry, Network, NoOpNetwork, TracedNetwork};
use rw_core::{new_system_id, Clock, RunnerInfo, SystemClock};
use rw_engine::{Interrupt, JobRunner, RunnerConfig, RunnerError, StatefulJobManager};
use rw_storage::{FileJobStore, StoreConfig, StoreError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::env;

/// Runner with the adapters the shipped binary wires in
pub type DaemonRunner = JobRunner<TracedNetwork<NoOpNetwork>, SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/rw)
    pub state_dir: PathBuf,
    /// Directory holding one record per job
    pub store_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Runner system id, generated on first start
    pub system_id_path: PathBuf,
    pub store: StoreConfig,
    pub runner: RunnerConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(env::state_dir()?))
    }

    /// Paths under `state_dir`, with environment overrides applied to the
    /// defaults.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        let mut store = StoreConfig::default();
        if let Some(interval) = env::health_interval() {
            store.health_interval = interval;
        }
        if let Some(timeout) = env::health_timeout() {
            store.health_timeout = timeout;
        }
        if let Some(retries) = env::max_retries() {
            store.max_retries = retries;
        }
        if let Some(timeout) = env::stale_timeout() {
            store.stale_timeout = timeout;
        }

        let mut runner = RunnerConfig::default();
        if let Some(executor) = env::executor() {
            runner.executor = executor;
        }
        if let Some(interval) = env::check_interval() {
            runner.check_interval = interval;
        }
        if let Some(limit) = env::output_limit() {
            runner.trace.output_limit = limit;
        }
        if let Some(interval) = env::trace_interval() {
            runner.trace.update_interval = interval;
        }

        Self {
            store_path: state_dir.join("jobs"),
            lock_path: state_dir.join("rwd.pid"),
            log_path: state_dir.join("rwd.log"),
            system_id_path: state_dir.join("system_id"),
            state_dir,
            store,
            runner,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon: the store lock plus the runner that owns the store.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runner: DaemonRunner,
}

/// Take the store lock and wire the runner.
///
/// A failure other than [`LifecycleError::LockFailed`] leaves no PID file
/// behind.
pub fn startup(config: &Config, registry: ExecutorRegistry) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config, registry) {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The PID file belongs to the running daemon when the lock is taken
            if !matches!(e, LifecycleError::LockFailed(_)) {
                remove_if_present(&config.lock_path);
            }
            Err(e)
        }
    }
}

fn startup_inner(config: &Config, registry: ExecutorRegistry) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = acquire_lock(&config.lock_path)?;

    let store = FileJobStore::open(&config.store_path, config.store.clone())?;
    info!(path = %config.store_path.display(), "opened job store");

    if registry.get(&config.runner.executor).is_none() {
        warn!(
            executor = %config.runner.executor,
            registered = ?registry.names(),
            "executor not registered, no jobs will run"
        );
    }

    let runner_info = RunnerInfo {
        token: String::new(),
        system_id: load_system_id(&config.system_id_path)?,
        executor: config.runner.executor.clone(),
    };
    let manager = StatefulJobManager::new(
        TracedNetwork::new(NoOpNetwork::new()),
        Arc::new(store),
        config.store.clone(),
        runner_info,
        SystemClock,
    );
    let runner = JobRunner::new(manager, registry, config.runner.clone());

    Ok(DaemonState { config: config.clone(), lock_file, runner })
}

/// Exclusive lock on the PID file, then record our PID in it.
fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    // Opened without truncation so a running daemon's PID survives a failed attempt
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// The id stored at `path`, or a fresh one written there.
fn load_system_id(path: &Path) -> Result<String, LifecycleError> {
    match std::fs::read_to_string(path) {
        Ok(id) if !id.trim().is_empty() => return Ok(id.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let id = new_system_id();
    std::fs::write(path, format!("{id}\n"))?;
    info!(system_id = %id, "generated runner system id");
    Ok(id)
}

fn remove_if_present(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

impl DaemonState {
    /// Remove the PID file. The lock itself is released when the state drops.
    pub fn shutdown(self) {
        info!("Shutting down daemon...");
        remove_if_present(&self.config.lock_path);
        info!("Daemon shutdown complete");
    }
}

/// Process jobs until `shutdown` flips to true.
///
/// Idle or failed polls wait `check_interval` before the next attempt; a
/// finished job is followed immediately by the next poll. A job running
/// when shutdown is requested sees the interrupt and persists its state
/// before this returns.
pub async fn run_jobs<N: Network, C: Clock>(
    runner: &JobRunner<N, C>,
    interrupt: &mut Interrupt,
    shutdown: &mut watch::Receiver<bool>,
) {
    let check_interval = runner.config().check_interval;
    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match runner.process_next(interrupt).await {
            Ok(Some(report)) => {
                info!(job_id = %report.job_id, resumed = report.resumed, outcome = ?report.outcome, "job done");
                None
            }
            Ok(None) => Some(check_interval),
            Err(RunnerError::Registry(e)) => {
                tracing::debug!(error = %e, "no executor for jobs");
                Some(check_interval)
            }
            Err(e) => {
                warn!(error = %e, "job processing failed");
                Some(check_interval)
            }
        };

        if let Some(delay) = delay {
            wait_or_shutdown(delay, shutdown).await;
        }
    }
    // An interrupt raised while idle has nothing left to stop
    let _ = interrupt.take_pending();
}

async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        changed = shutdown.changed() => {
            if changed.is_err() {
                // Sender gone: nobody can request shutdown, keep polling
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
