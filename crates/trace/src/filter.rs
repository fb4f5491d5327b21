// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Building blocks shared by the redaction filters

/// Token written in place of redacted bytes
pub const MASK: &[u8] = b"[MASKED]";

/// Unit passed between filter stages.
///
/// A mask emitted by one stage travels as `Mask` so later stages never
/// try to match inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
    Data(Vec<u8>),
    Mask,
}

/// Output collected from one stage for one input chunk.
#[derive(Debug, Default)]
pub(crate) struct Emitted {
    chunks: Vec<Chunk>,
}

impl Emitted {
    pub fn data(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.chunks.last_mut() {
            Some(Chunk::Data(last)) => last.extend_from_slice(bytes),
            _ => self.chunks.push(Chunk::Data(bytes.to_vec())),
        }
    }

    pub fn mask(&mut self) {
        self.chunks.push(Chunk::Mask);
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}

/// One stage of the redaction chain.
pub(crate) trait Filter: Send {
    fn write(&mut self, data: &[u8], out: &mut Emitted);

    /// A mask token arrived from an earlier stage.
    fn mask(&mut self, out: &mut Emitted);

    /// End of stream: release anything still withheld.
    fn close(&mut self, out: &mut Emitted);
}

/// Result of feeding one byte to a [`Matcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Byte is not part of any match
    Plain,
    /// Byte extends a match that is not complete yet
    Partial,
    /// Byte completed the pattern; the matcher is idle again
    Complete,
}

/// Streaming Knuth-Morris-Pratt matcher.
///
/// Matched bytes are withheld (they are always `pattern[..matched]`). On a
/// mismatch the bytes that can no longer start a match are emitted and the
/// current byte is re-evaluated against the longest surviving prefix, which
/// handles self-overlapping patterns.
#[derive(Debug)]
pub(crate) struct Matcher {
    pattern: Vec<u8>,
    failure: Vec<usize>,
    matched: usize,
}

impl Matcher {
    /// `pattern` must not be empty.
    pub fn new(pattern: Vec<u8>) -> Self {
        let failure = failure_table(&pattern);
        Self {
            pattern,
            failure,
            matched: 0,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    #[cfg(test)]
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn is_idle(&self) -> bool {
        self.matched == 0
    }

    pub fn feed(&mut self, byte: u8, out: &mut Emitted) -> Step {
        loop {
            if self.pattern[self.matched] == byte {
                self.matched += 1;
                if self.matched == self.pattern.len() {
                    self.matched = 0;
                    return Step::Complete;
                }
                return Step::Partial;
            }
            if self.matched == 0 {
                return Step::Plain;
            }
            let keep = self.failure[self.matched - 1];
            out.data(&self.pattern[..self.matched - keep]);
            self.matched = keep;
        }
    }

    /// Emit withheld bytes unmodified and reset.
    pub fn flush(&mut self, out: &mut Emitted) {
        out.data(&self.pattern[..self.matched]);
        self.matched = 0;
    }
}

/// `table[i]` is the length of the longest proper prefix of
/// `pattern[..=i]` that is also its suffix.
pub(crate) fn failure_table(pattern: &[u8]) -> Vec<usize> {
    let mut table = vec![0; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = table[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
