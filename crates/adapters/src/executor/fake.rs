// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    Executor, ExecutorError, ExecutorProvider, OutputHandle, PrepareOptions, ResumableExecutor,
    StageCommand,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rw_core::{BuildStage, ExecutorSnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Recorded executor call
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorCall {
    Prepare,
    Run(BuildStage),
    Resume(BuildStage),
    GetState,
    SetState(ExecutorSnapshot),
    Finish(Option<String>),
    Cleanup,
}

#[derive(Default)]
struct FakeExecutorState {
    calls: Vec<ExecutorCall>,
    resumable: bool,
    reject_state: bool,
    fail_prepare: Option<String>,
    fail_stage: Option<(BuildStage, String)>,
    /// Consumed the first time the stage is entered
    block_stage: Option<BuildStage>,
    stage_output: BTreeMap<BuildStage, Vec<u8>>,
}

/// Scriptable executor.
///
/// Clones share configuration and the call log, so every instance a
/// [`FakeExecutorProvider`] creates across attempts records into the same
/// place. The output handle stays per instance.
#[derive(Clone)]
pub struct FakeExecutor {
    name: String,
    inner: Arc<Mutex<FakeExecutorState>>,
    blocked: Arc<Notify>,
    output: Option<OutputHandle>,
    current: Option<BuildStage>,
}

impl FakeExecutor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(FakeExecutorState::default())),
            blocked: Arc::new(Notify::new()),
            output: None,
            current: None,
        }
    }

    pub fn set_resumable(&self, resumable: bool) {
        self.inner.lock().resumable = resumable;
    }

    /// `set_state` returns false from now on.
    pub fn reject_state(&self) {
        self.inner.lock().reject_state = true;
    }

    pub fn fail_prepare(&self, message: impl Into<String>) {
        self.inner.lock().fail_prepare = Some(message.into());
    }

    pub fn fail_at(&self, stage: BuildStage, message: impl Into<String>) {
        self.inner.lock().fail_stage = Some((stage, message.into()));
    }

    /// Never return from the next run or resume of `stage`.
    pub fn block_at(&self, stage: BuildStage) {
        self.inner.lock().block_stage = Some(stage);
    }

    /// Extra bytes written to the output when `stage` runs.
    pub fn output_at(&self, stage: BuildStage, data: impl Into<Vec<u8>>) {
        self.inner.lock().stage_output.insert(stage, data.into());
    }

    /// Wait until a blocked stage has been entered.
    pub async fn wait_blocked(&self) {
        self.blocked.notified().await;
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.inner.lock().calls.clone()
    }

    /// Stages run or resumed, in order
    pub fn stages(&self) -> Vec<BuildStage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ExecutorCall::Run(stage) | ExecutorCall::Resume(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    fn fresh(&self) -> Self {
        Self { output: None, current: None, ..self.clone() }
    }

    fn write(&self, data: &[u8]) {
        if let Some(output) = &self.output {
            output.write(data);
        }
    }

    async fn execute(&mut self, command: &StageCommand, call: ExecutorCall) -> Result<(), ExecutorError> {
        self.current = Some(command.stage);
        let (block, fail, extra) = {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            let block = inner.block_stage == Some(command.stage);
            if block {
                inner.block_stage = None;
            }
            let fail = inner
                .fail_stage
                .as_ref()
                .filter(|(stage, _)| *stage == command.stage)
                .map(|(_, message)| message.clone());
            (block, fail, inner.stage_output.get(&command.stage).cloned())
        };

        for line in &command.script {
            self.write(format!("$ {line}\n").as_bytes());
        }
        if let Some(extra) = extra {
            self.write(&extra);
        }
        if block {
            self.blocked.notify_one();
            std::future::pending::<()>().await;
        }
        match fail {
            Some(message) => Err(ExecutorError::Stage { stage: command.stage, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn prepare(&mut self, options: PrepareOptions) -> Result<(), ExecutorError> {
        let fail = {
            let mut inner = self.inner.lock();
            inner.calls.push(ExecutorCall::Prepare);
            inner.fail_prepare.clone()
        };
        self.output = Some(options.output);
        match fail {
            Some(message) => Err(ExecutorError::Prepare(message)),
            None => Ok(()),
        }
    }

    async fn run(&mut self, command: &StageCommand) -> Result<(), ExecutorError> {
        self.execute(command, ExecutorCall::Run(command.stage)).await
    }

    async fn finish(&mut self, error: Option<&str>) {
        self.inner.lock().calls.push(ExecutorCall::Finish(error.map(str::to_string)));
    }

    async fn cleanup(&mut self) {
        self.inner.lock().calls.push(ExecutorCall::Cleanup);
    }

    fn as_resumable(&mut self) -> Option<&mut dyn ResumableExecutor> {
        if self.inner.lock().resumable {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ResumableExecutor for FakeExecutor {
    async fn get_state(&mut self) -> Result<ExecutorSnapshot, ExecutorError> {
        self.inner.lock().calls.push(ExecutorCall::GetState);
        Ok(ExecutorSnapshot::from(serde_json::json!({
            "executor": self.name,
            "stage": self.current.map(|s| s.name()),
        })))
    }

    fn set_state(&mut self, snapshot: &ExecutorSnapshot) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(ExecutorCall::SetState(snapshot.clone()));
        !inner.reject_state
    }

    async fn resume(&mut self, command: &StageCommand) -> Result<(), ExecutorError> {
        self.execute(command, ExecutorCall::Resume(command.stage)).await
    }
}

/// Provider handing out instances that share one [`FakeExecutor`]'s script
#[derive(Clone)]
pub struct FakeExecutorProvider {
    executor: FakeExecutor,
}

impl FakeExecutorProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { executor: FakeExecutor::new(name) }
    }

    /// Handle for scripting and inspecting the created instances
    pub fn executor(&self) -> FakeExecutor {
        self.executor.clone()
    }
}

impl ExecutorProvider for FakeExecutorProvider {
    fn name(&self) -> &str {
        &self.executor.name
    }

    fn create(&self) -> Box<dyn Executor> {
        Box::new(self.executor.fresh())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
