// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution backends
//!
//! An [`Executor`] runs the stages of one job. Backends that can pick up
//! an in-flight stage after the agent restarts also implement
//! [`ResumableExecutor`] and expose it through [`Executor::as_resumable`].

mod registry;

pub use registry::{ExecutorProvider, ExecutorRegistry, RegistryError};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutor, FakeExecutorProvider};

use async_trait::async_trait;
use rw_core::{BuildStage, ExecutorSnapshot, JobId, JobVariable, SnapshotError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("prepare failed: {0}")]
    Prepare(String),
    #[error("stage {stage} failed: {message}")]
    Stage { stage: BuildStage, message: String },
    #[error("executor state unavailable: {0}")]
    State(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Destination for output produced while a stage runs.
///
/// Everything written here reaches the job trace after redaction.
pub trait StageOutput: Send + Sync {
    fn write(&self, data: &[u8]);
}

pub type OutputHandle = Arc<dyn StageOutput>;

/// Output sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardOutput;

impl StageOutput for DiscardOutput {
    fn write(&self, _data: &[u8]) {}
}

/// Everything an executor needs to set itself up for a job
#[derive(Clone)]
pub struct PrepareOptions {
    pub job_id: JobId,
    pub job_name: String,
    pub variables: Vec<JobVariable>,
    pub output: OutputHandle,
}

/// One stage's work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub stage: BuildStage,
    pub script: Vec<String>,
}

impl StageCommand {
    pub fn new(stage: BuildStage, script: Vec<String>) -> Self {
        Self { stage, script }
    }
}

#[async_trait]
pub trait Executor: Send {
    fn name(&self) -> &str;

    async fn prepare(&mut self, options: PrepareOptions) -> Result<(), ExecutorError>;

    async fn run(&mut self, command: &StageCommand) -> Result<(), ExecutorError>;

    /// Report the build's outcome; `error` is set when it failed.
    async fn finish(&mut self, error: Option<&str>);

    async fn cleanup(&mut self);

    /// Resume capability, when the backend has it.
    fn as_resumable(&mut self) -> Option<&mut dyn ResumableExecutor> {
        None
    }
}

#[async_trait]
pub trait ResumableExecutor: Send {
    /// Capture what a fresh instance needs to continue the current stage.
    async fn get_state(&mut self) -> Result<ExecutorSnapshot, ExecutorError>;

    /// Adopt a captured state. `false` means the state cannot be used and
    /// the stage must be run from scratch.
    fn set_state(&mut self, snapshot: &ExecutorSnapshot) -> bool;

    /// Continue a stage that was in flight when the snapshot was taken.
    async fn resume(&mut self, command: &StageCommand) -> Result<(), ExecutorError>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn prepare(&mut self, options: PrepareOptions) -> Result<(), ExecutorError> {
        (**self).prepare(options).await
    }

    async fn run(&mut self, command: &StageCommand) -> Result<(), ExecutorError> {
        (**self).run(command).await
    }

    async fn finish(&mut self, error: Option<&str>) {
        (**self).finish(error).await
    }

    async fn cleanup(&mut self) {
        (**self).cleanup().await
    }

    fn as_resumable(&mut self) -> Option<&mut dyn ResumableExecutor> {
        (**self).as_resumable()
    }
}
