// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage sequencer
//!
//! Runs the fixed stage order against an executor. Every stage races
//! against the interrupt channel, a remote abort and the job timeout. An
//! interrupt persists the executor snapshot and ends the attempt as
//! resumable; the next attempt skips completed stages and resumes the
//! interrupted one.

use crate::handle::JobHandle;
use crate::interrupt::Interrupt;
use crate::job_trace::AbortSignal;
use crate::logger::BuildLogger;
use rw_adapters::{Executor, ExecutorError, PrepareOptions, StageCommand};
use rw_core::{BuildStage, BuildState, Job};
use rw_storage::StoreError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Budget for each stage that runs after a failure
pub const FAILURE_STAGE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build interrupted")]
    Interrupted { stage: Option<BuildStage> },
    #[error("executor prepare failed: {0}")]
    Prepare(#[source] ExecutorError),
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: BuildStage,
        #[source]
        source: ExecutorError,
    },
    #[error("job exceeded its timeout of {0:?}")]
    Timeout(Duration),
    #[error("job aborted by coordinator")]
    Aborted,
    #[error("failed to persist job state: {0}")]
    Store(#[from] StoreError),
}

impl BuildError {
    /// A later attempt can pick the job up where this one stopped.
    pub fn is_resumable(&self) -> bool {
        matches!(self, BuildError::Interrupted { .. })
    }

    /// Failure class reported to the coordinator
    pub fn failure_reason(&self) -> &'static str {
        match self {
            BuildError::Stage {
                stage: BuildStage::Script | BuildStage::AfterScript,
                ..
            } => "script_failure",
            BuildError::Timeout(_) => "job_execution_timeout",
            _ => "runner_system_failure",
        }
    }
}

enum Race<T> {
    Done(T),
    Interrupted,
    Aborted,
    TimedOut,
}

async fn race<F: Future>(
    work: F,
    interrupt: &mut Interrupt,
    abort: &mut AbortSignal,
    deadline: Instant,
) -> Race<F::Output> {
    // Work that is ready is never thrown away for a signal that arrived with it
    tokio::select! {
        biased;
        out = work => Race::Done(out),
        _ = interrupt.wait() => Race::Interrupted,
        _ = abort.wait() => Race::Aborted,
        _ = tokio::time::sleep_until(deadline) => Race::TimedOut,
    }
}

fn stage_command(job: &Job, stage: BuildStage) -> StageCommand {
    let script = match stage {
        BuildStage::Script => job.response.script.clone(),
        BuildStage::AfterScript => job.response.after_script.clone(),
        _ => Vec::new(),
    };
    StageCommand::new(stage, script)
}

/// One attempt at running a job
pub struct Build {
    handle: JobHandle,
    executor: Box<dyn Executor>,
    logger: Arc<BuildLogger>,
    abort: AbortSignal,
}

impl Build {
    pub fn new(
        handle: JobHandle,
        executor: Box<dyn Executor>,
        logger: Arc<BuildLogger>,
        abort: AbortSignal,
    ) -> Self {
        Self { handle, executor, logger, abort }
    }

    pub async fn run(mut self, interrupt: &mut Interrupt) -> Result<(), BuildError> {
        let job = self.handle.snapshot();
        let timeout = job.response.timeout();
        let deadline = Instant::now() + timeout;
        let resumed_from = job.resumed_from();

        if job.state.retries > 0 {
            let from = resumed_from.map_or("the beginning", BuildStage::name);
            self.logger.info(&format!(
                "Resuming job from {from} (attempt {})",
                job.state.retries + 1
            ));
        }

        if interrupt.take_pending() {
            return Err(self.suspend(job.state.stage, false).await);
        }

        let options = PrepareOptions {
            job_id: job.id().clone(),
            job_name: job.response.name.clone(),
            variables: job.response.variables.clone(),
            output: self.logger.clone(),
        };
        let prepared = race(
            self.executor.prepare(options),
            interrupt,
            &mut self.abort,
            deadline,
        )
        .await;
        match prepared {
            Race::Done(Ok(())) => {}
            Race::Done(Err(e)) => return Err(self.fail(BuildError::Prepare(e)).await),
            // Nothing ran yet; keep whatever snapshot the store holds
            Race::Interrupted => return Err(self.suspend(job.state.stage, false).await),
            Race::Aborted => return Err(self.fail(BuildError::Aborted).await),
            Race::TimedOut => return Err(self.fail(BuildError::Timeout(timeout)).await),
        }

        let mut failure: Option<BuildError> = None;
        let mut skip_failure_stages = false;
        for stage in BuildStage::ALL {
            if resumed_from.is_some_and(|from| stage < from) {
                tracing::debug!(%stage, "stage completed in an earlier attempt");
                continue;
            }

            if failure.is_some() {
                if stage.runs_on_failure() && !skip_failure_stages {
                    skip_failure_stages = !self.run_after_failure(&job, stage, interrupt).await?;
                }
                continue;
            }

            self.handle.modify(|j| j.enter_stage(stage));
            self.handle.persist()?;
            self.logger.section(stage);

            let command = stage_command(&job, stage);
            let resume = resumed_from == Some(stage) && self.adopt_snapshot(&job);
            let executor = &mut self.executor;
            let work = async {
                if resume {
                    if let Some(resumable) = executor.as_resumable() {
                        return resumable.resume(&command).await;
                    }
                }
                executor.run(&command).await
            };

            match race(work, interrupt, &mut self.abort, deadline).await {
                Race::Done(Ok(())) => {
                    if resumed_from == Some(stage) {
                        self.handle.modify(Job::clear_resume);
                    }
                }
                Race::Done(Err(e)) => {
                    self.logger.error(&format!("{stage}: {e}"));
                    failure = Some(BuildError::Stage { stage, source: e });
                }
                Race::TimedOut => {
                    self.logger.error(&format!("Job timed out after {timeout:?}"));
                    failure = Some(BuildError::Timeout(timeout));
                }
                Race::Interrupted => return Err(self.suspend(Some(stage), true).await),
                Race::Aborted => return Err(self.fail(BuildError::Aborted).await),
            }
        }

        match failure {
            None => {
                self.executor.finish(None).await;
                self.executor.cleanup().await;
                Ok(())
            }
            Some(e) => Err(self.fail(e).await),
        }
    }

    /// Hand the persisted snapshot to the executor. `false` means the stage
    /// has to run from scratch.
    fn adopt_snapshot(&mut self, job: &Job) -> bool {
        let Some(resumable) = self.executor.as_resumable() else {
            tracing::info!("executor cannot resume, running stage again");
            return false;
        };
        let Some(snapshot) = &job.state.executor_state else {
            tracing::warn!("no executor snapshot persisted, running stage again");
            return false;
        };
        if !resumable.set_state(snapshot) {
            tracing::warn!("executor rejected persisted snapshot, running stage again");
            return false;
        }
        true
    }

    /// Run a stage flagged to run after a failure. Its errors are only
    /// logged. Returns false when later failure stages should be skipped.
    async fn run_after_failure(
        &mut self,
        job: &Job,
        stage: BuildStage,
        interrupt: &mut Interrupt,
    ) -> Result<bool, BuildError> {
        self.handle.modify(|j| j.enter_stage(stage));
        self.handle.persist()?;
        self.logger.section(stage);

        let command = stage_command(job, stage);
        let deadline = Instant::now() + FAILURE_STAGE_TIMEOUT;
        let work = self.executor.run(&command);
        Ok(match race(work, interrupt, &mut self.abort, deadline).await {
            Race::Done(Ok(())) => true,
            Race::Done(Err(e)) => {
                tracing::warn!(%stage, error = %e, "stage failed after an earlier failure");
                true
            }
            Race::TimedOut => {
                tracing::warn!(%stage, "stage timed out after an earlier failure");
                true
            }
            Race::Interrupted | Race::Aborted => {
                tracing::warn!(%stage, "stopped running stages after failure");
                false
            }
        })
    }

    /// Persist what a later attempt needs and end this one as resumable.
    async fn suspend(&mut self, stage: Option<BuildStage>, capture: bool) -> BuildError {
        let resumable = self.executor.as_resumable().is_some();
        let snapshot = match self.executor.as_resumable() {
            Some(backend) if capture => match backend.get_state().await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!(error = %e, "could not capture executor state");
                    None
                }
            },
            _ => None,
        };
        // Remote state backs the persisted snapshot and must outlive us
        let keep_remote = resumable && (!capture || snapshot.is_some());

        self.handle.modify(|j| {
            if capture {
                j.state.executor_state = snapshot;
            }
            j.set_build_state(BuildState::FailedResumable);
        });
        if let Err(e) = self.handle.persist() {
            tracing::error!(error = %e, "failed to persist interrupted job");
            return BuildError::Store(e);
        }
        self.logger.warning("Job interrupted; its state was saved and it will be resumed");
        tracing::info!(stage = ?stage, keep_remote, "build suspended");

        if !keep_remote {
            self.executor.finish(Some("interrupted")).await;
            self.executor.cleanup().await;
        }
        BuildError::Interrupted { stage }
    }

    /// Tear the executor down after a terminal failure.
    async fn fail(&mut self, error: BuildError) -> BuildError {
        let message = error.to_string();
        self.executor.finish(Some(&message)).await;
        self.executor.cleanup().await;
        let report = self.logger.capture_report();
        tracing::warn!(
            reason = error.failure_reason(),
            error = %message,
            output = %String::from_utf8_lossy(&report),
            "build failed"
        );
        error
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
