// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unsent trace bytes and the acknowledged offset

use parking_lot::Mutex;
use rw_trace::{Sink, TraceError};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
struct BufferState {
    /// Bytes past `acked`, not yet accepted by the coordinator
    unsent: Vec<u8>,
    acked: u64,
    limit_hit: bool,
    closed: bool,
}

impl BufferState {
    fn total(&self) -> u64 {
        self.acked + self.unsent.len() as u64
    }
}

/// Shared between the writer side (build output) and the flusher.
#[derive(Debug)]
pub(crate) struct TraceBuffer {
    state: Mutex<BufferState>,
    limit: u64,
    flush_threshold: usize,
    pub(crate) wake: Notify,
}

pub(crate) fn limit_message(limit: u64) -> String {
    format!(
        "\n\x1b[33;1mJob's log exceeded limit of {limit} bytes.\n\
         Job execution will continue but no more output will be collected.\x1b[0;m\n"
    )
}

/// Largest prefix length not above `max` that does not split a UTF-8 sequence.
fn utf8_floor(data: &[u8], max: usize) -> usize {
    if max >= data.len() {
        return data.len();
    }
    let mut cut = max;
    while cut > 0 && (data[cut] & 0xC0) == 0x80 {
        cut -= 1;
    }
    cut
}

impl TraceBuffer {
    pub(crate) fn new(start_offset: u64, limit: u64, flush_threshold: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                unsent: Vec::new(),
                acked: start_offset,
                limit_hit: false,
                closed: false,
            }),
            limit,
            flush_threshold,
            wake: Notify::new(),
        }
    }

    pub(crate) fn write(&self, data: &[u8]) -> Result<(), TraceError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TraceError::Closed);
        }
        if state.limit_hit || data.is_empty() {
            return Ok(());
        }

        let room = self.limit.saturating_sub(state.total());
        if (data.len() as u64) <= room {
            state.unsent.extend_from_slice(data);
        } else {
            let cut = utf8_floor(data, room as usize);
            state.unsent.extend_from_slice(&data[..cut]);
            state.unsent.extend_from_slice(limit_message(self.limit).as_bytes());
            state.limit_hit = true;
            tracing::warn!(limit = self.limit, "trace output limit reached");
        }

        if state.unsent.len() >= self.flush_threshold {
            self.wake.notify_one();
        }
        Ok(())
    }

    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Copy of the unsent bytes and the offset they start at.
    pub(crate) fn pending(&self) -> Option<(Vec<u8>, u64)> {
        let state = self.state.lock();
        if state.unsent.is_empty() {
            return None;
        }
        Some((state.unsent.clone(), state.acked))
    }

    /// Apply an offset reported by the coordinator.
    ///
    /// The acknowledged offset only moves forward and never past what was
    /// written. Returns the new offset when it advanced.
    pub(crate) fn acknowledge(&self, sent_offset: u64) -> Option<u64> {
        let mut state = self.state.lock();
        let next = sent_offset.clamp(state.acked, state.total());
        if next == state.acked {
            return None;
        }
        let accepted = (next - state.acked) as usize;
        state.unsent.drain(..accepted);
        state.acked = next;
        Some(next)
    }

    pub(crate) fn acked(&self) -> u64 {
        self.state.lock().acked
    }

    pub(crate) fn total(&self) -> u64 {
        self.state.lock().total()
    }

    pub(crate) fn unsent_len(&self) -> usize {
        self.state.lock().unsent.len()
    }
}

/// Redacted output entering the trace
#[derive(Clone, Debug)]
pub struct TraceWriter {
    pub(crate) buffer: Arc<TraceBuffer>,
}

impl Sink for TraceWriter {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        self.buffer.write(data)
    }

    fn close(&mut self) -> Result<(), TraceError> {
        self.buffer.close();
        Ok(())
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
