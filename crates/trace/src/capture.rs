// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity capture of the most recent output

use crate::pipeline::Sink;
use crate::TraceError;
use std::collections::VecDeque;

/// Ring buffer keeping the last `capacity` bytes ever written.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    data: VecDeque<u8>,
    capacity: usize,
    total: u64,
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.total += bytes.len() as u64;
        let keep = bytes.len().min(self.capacity);
        let tail = &bytes[bytes.len() - keep..];
        let overflow = (self.data.len() + tail.len()).saturating_sub(self.capacity);
        self.data.drain(..overflow);
        self.data.extend(tail);
    }

    /// Bytes ever written
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes written but no longer retained
    pub fn omitted(&self) -> u64 {
        self.total - self.data.len() as u64
    }

    /// Retained bytes, oldest first
    pub fn tail(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }

    /// Retained bytes, prefixed with an omission note when anything was dropped.
    pub fn report(&self) -> Vec<u8> {
        let omitted = self.omitted();
        if omitted == 0 {
            return self.tail();
        }
        let mut out = format!("[{omitted} bytes omitted]\n").into_bytes();
        out.extend(self.data.iter());
        out
    }
}

impl Sink for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        CaptureBuffer::write(self, data);
        Ok(())
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
