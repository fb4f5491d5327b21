// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job trace delivery
//!
//! Writes land in a shared buffer; a background flusher patches them to
//! the coordinator at the acknowledged offset. Transient failures resend
//! the same range. An abort reported by the coordinator stops delivery
//! and is published through [`AbortSignal`].

mod buffer;

pub use buffer::TraceWriter;

use buffer::TraceBuffer;
use rw_adapters::{JobState, Network, PatchState, UpdateJobInfo, UpdateState};
use rw_core::JobCredentials;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Interval between background flushes
    pub update_interval: Duration,
    /// Delay before resending after a failed patch or update
    pub retry_interval: Duration,
    /// Bytes collected per job before output is cut off
    pub output_limit: u64,
    /// Unsent bytes that trigger a flush before the interval elapses
    pub flush_threshold: usize,
    /// Longest quiet period before an empty patch is sent anyway
    pub force_send_interval: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(3),
            retry_interval: Duration::from_secs(3),
            output_limit: 4 * 1024 * 1024,
            flush_threshold: 64 * 1024,
            force_send_interval: Duration::from_secs(30),
        }
    }
}

/// Notified whenever the coordinator acknowledges more output.
pub trait TraceProgress: Send + Sync {
    fn acknowledged(&self, offset: u64);
}

/// How trace delivery ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// Output drained and the final update answered with this state
    Updated(UpdateState),
    /// The coordinator aborted the job; nothing more was sent
    Aborted,
}

/// Resolves once the coordinator has aborted the job.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flush {
    Idle,
    Sent,
    Failed,
    Aborted,
}

struct Shared<N> {
    network: N,
    credentials: JobCredentials,
    buffer: Arc<TraceBuffer>,
    config: TraceConfig,
    progress: Option<Arc<dyn TraceProgress>>,
    abort: watch::Sender<bool>,
    stop: Notify,
}

impl<N: Network> Shared<N> {
    async fn flush_once(&self) -> Flush {
        if *self.abort.borrow() {
            return Flush::Aborted;
        }
        let Some((content, offset)) = self.buffer.pending() else {
            return Flush::Idle;
        };

        let result = self
            .network
            .patch_trace(&self.credentials, &content, offset)
            .await;
        match result.state {
            PatchState::Succeeded => match self.buffer.acknowledge(result.sent_offset) {
                Some(acked) => {
                    if let Some(progress) = &self.progress {
                        progress.acknowledged(acked);
                    }
                    Flush::Sent
                }
                None => {
                    tracing::debug!(
                        job_id = %self.credentials.id,
                        offset,
                        sent_offset = result.sent_offset,
                        "coordinator accepted no new output"
                    );
                    Flush::Failed
                }
            },
            PatchState::Aborted => self.aborted(),
            PatchState::TransientFailure => Flush::Failed,
        }
    }

    /// Empty patch at the acknowledged offset, answered like any other.
    async fn keepalive(&self) -> Flush {
        let offset = self.buffer.acked();
        let result = self.network.patch_trace(&self.credentials, &[], offset).await;
        match result.state {
            PatchState::Succeeded => Flush::Sent,
            PatchState::Aborted => self.aborted(),
            PatchState::TransientFailure => Flush::Failed,
        }
    }

    fn aborted(&self) -> Flush {
        tracing::info!(job_id = %self.credentials.id, "trace aborted by coordinator");
        self.abort.send_replace(true);
        Flush::Aborted
    }

    /// Send everything left. Returns false when the job was aborted.
    async fn drain(&self) -> bool {
        loop {
            match self.flush_once().await {
                Flush::Idle => return true,
                Flush::Sent => {}
                Flush::Failed => tokio::time::sleep(self.config.retry_interval).await,
                Flush::Aborted => return false,
            }
        }
    }

    async fn final_update(&self, info: &UpdateJobInfo) -> UpdateState {
        loop {
            let state = self.network.update_job(&self.credentials, info).await;
            if state == UpdateState::Abort {
                self.abort.send_replace(true);
            }
            if !state.should_retry() {
                return state;
            }
            tracing::debug!(job_id = %self.credentials.id, ?state, "retrying final update");
            tokio::time::sleep(self.config.retry_interval).await;
        }
    }
}

async fn run_flusher<N: Network>(shared: Arc<Shared<N>>) {
    let mut last_sent = Instant::now();
    loop {
        tokio::select! {
            biased;
            _ = shared.stop.notified() => break,
            _ = shared.buffer.wake.notified() => {}
            _ = tokio::time::sleep(shared.config.update_interval) => {}
        }
        let flushed = match shared.flush_once().await {
            Flush::Idle if last_sent.elapsed() >= shared.config.force_send_interval => {
                shared.keepalive().await
            }
            other => other,
        };
        match flushed {
            Flush::Aborted => break,
            Flush::Sent => last_sent = Instant::now(),
            Flush::Idle | Flush::Failed => {}
        }
    }
}

/// Trace of one job, bound to its credentials.
pub struct JobTrace<N: Network> {
    shared: Arc<Shared<N>>,
    flusher: Option<JoinHandle<()>>,
}

impl<N: Network> JobTrace<N> {
    /// Start delivering output written at or after `start_offset`.
    ///
    /// Must be called within a tokio runtime; the flusher runs as a task.
    pub fn start(
        network: N,
        credentials: JobCredentials,
        start_offset: u64,
        config: TraceConfig,
        progress: Option<Arc<dyn TraceProgress>>,
    ) -> Self {
        let buffer = Arc::new(TraceBuffer::new(
            start_offset,
            config.output_limit,
            config.flush_threshold,
        ));
        let (abort, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            network,
            credentials,
            buffer,
            config,
            progress,
            abort,
            stop: Notify::new(),
        });
        let flusher = tokio::spawn(run_flusher(Arc::clone(&shared)));
        Self { shared, flusher: Some(flusher) }
    }

    pub fn writer(&self) -> TraceWriter {
        TraceWriter { buffer: Arc::clone(&self.shared.buffer) }
    }

    pub fn abort_signal(&self) -> AbortSignal {
        AbortSignal { rx: self.shared.abort.subscribe() }
    }

    pub fn is_aborted(&self) -> bool {
        *self.shared.abort.borrow()
    }

    pub fn acknowledged_offset(&self) -> u64 {
        self.shared.buffer.acked()
    }

    pub fn total_bytes(&self) -> u64 {
        self.shared.buffer.total()
    }

    /// Drain output and report success.
    pub async fn success(self) -> TraceOutcome {
        self.finish(JobState::Success, None).await
    }

    /// Drain output and report failure.
    pub async fn fail(self, reason: &str) -> TraceOutcome {
        self.finish(JobState::Failed, Some(reason.to_string())).await
    }

    async fn finish(mut self, state: JobState, failure_reason: Option<String>) -> TraceOutcome {
        self.stop_flusher().await;
        self.shared.buffer.close();
        if !self.shared.drain().await {
            return TraceOutcome::Aborted;
        }
        let info = UpdateJobInfo {
            state,
            failure_reason,
            trace_bytes: self.shared.buffer.total(),
        };
        match self.shared.final_update(&info).await {
            UpdateState::Abort => TraceOutcome::Aborted,
            other => TraceOutcome::Updated(other),
        }
    }

    /// Stop without a final update so another attempt can continue the
    /// trace. Makes one best-effort flush.
    pub async fn detach(mut self) {
        self.stop_flusher().await;
        self.shared.buffer.close();
        if self.shared.flush_once().await != Flush::Idle {
            tracing::info!(
                job_id = %self.shared.credentials.id,
                unsent = self.shared.buffer.unsent_len(),
                "trace detached with output still pending"
            );
        }
    }

    /// Stop without sending anything more.
    pub async fn abandon(mut self) {
        self.stop_flusher().await;
        self.shared.buffer.close();
    }

    async fn stop_flusher(&mut self) {
        if let Some(flusher) = self.flusher.take() {
            self.shared.stop.notify_one();
            if let Err(e) = flusher.await {
                tracing::warn!(error = %e, "trace flusher ended abnormally");
            }
        }
    }
}

impl<N: Network> Drop for JobTrace<N> {
    fn drop(&mut self) {
        if let Some(flusher) = self.flusher.take() {
            flusher.abort();
        }
    }
}

#[cfg(test)]
#[path = "job_trace_tests.rs"]
mod tests;
