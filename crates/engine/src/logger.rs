// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build output: redaction in front of the trace and the capture buffer

use crate::job_trace::TraceWriter;
use parking_lot::Mutex;
use rw_adapters::StageOutput;
use rw_core::{BuildStage, Job};
use rw_trace::{CaptureBuffer, Pipeline, RedactionRules, Sink, TraceError};
use std::sync::Arc;

const ANSI_RESET: &str = "\x1b[0;m";
const ANSI_BOLD_CYAN: &str = "\x1b[36;1m";
const ANSI_BOLD_GREEN: &str = "\x1b[32;1m";
const ANSI_YELLOW: &str = "\x1b[0;33m";
const ANSI_BOLD_RED: &str = "\x1b[31;1m";

/// Redacted output goes to the trace and a bounded diagnostic copy.
struct TeeSink {
    trace: TraceWriter,
    capture: Arc<Mutex<CaptureBuffer>>,
}

impl Sink for TeeSink {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        self.capture.lock().write(data);
        self.trace.write(data)
    }

    fn close(&mut self) -> Result<(), TraceError> {
        self.trace.close()
    }
}

/// Everything written to the job log passes through here.
pub struct BuildLogger {
    pipeline: Mutex<Pipeline<TeeSink>>,
    capture: Arc<Mutex<CaptureBuffer>>,
}

impl BuildLogger {
    pub fn new(rules: &RedactionRules, trace: TraceWriter, capture_capacity: usize) -> Self {
        let capture = Arc::new(Mutex::new(CaptureBuffer::new(capture_capacity)));
        let sink = TeeSink { trace, capture: Arc::clone(&capture) };
        Self { pipeline: Mutex::new(Pipeline::new(rules, sink)), capture }
    }

    /// Logger masking the job's secret variables and its token prefixes.
    pub fn for_job(job: &Job, trace: TraceWriter, capture_capacity: usize) -> Self {
        let rules = RedactionRules::new()
            .with_phrases(job.response.masked_values())
            .with_token_prefixes(&job.response.token_prefixes);
        Self::new(&rules, trace, capture_capacity)
    }

    pub fn write(&self, data: &[u8]) {
        if let Err(e) = self.pipeline.lock().write(data) {
            tracing::debug!(error = %e, len = data.len(), "dropped build output");
        }
    }

    pub fn section(&self, stage: BuildStage) {
        self.line(ANSI_BOLD_CYAN, stage.description());
    }

    pub fn info(&self, message: &str) {
        self.line(ANSI_BOLD_GREEN, message);
    }

    pub fn warning(&self, message: &str) {
        self.line(ANSI_YELLOW, &format!("WARNING: {message}"));
    }

    pub fn error(&self, message: &str) {
        self.line(ANSI_BOLD_RED, &format!("ERROR: {message}"));
    }

    fn line(&self, color: &str, message: &str) {
        self.write(format!("{color}{message}{ANSI_RESET}\n").as_bytes());
    }

    /// Release withheld bytes and close the trace writer.
    pub fn close(&self) {
        if let Err(e) = self.pipeline.lock().close() {
            tracing::debug!(error = %e, "closing build output failed");
        }
    }

    /// Tail of the redacted output, with an omission note when truncated.
    pub fn capture_report(&self) -> Vec<u8> {
        self.capture.lock().report()
    }
}

impl StageOutput for BuildLogger {
    fn write(&self, data: &[u8]) {
        BuildLogger::write(self, data);
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
