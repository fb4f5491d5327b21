// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-phrase masking stage

use crate::filter::{Emitted, Filter, Matcher, Step};

/// Replaces every occurrence of one secret phrase with the mask token.
#[derive(Debug)]
pub(crate) struct PhraseMasker {
    matcher: Matcher,
}

impl PhraseMasker {
    /// `phrase` must not be empty.
    pub fn new(phrase: &[u8]) -> Self {
        Self {
            matcher: Matcher::new(phrase.to_vec()),
        }
    }
}

impl Filter for PhraseMasker {
    fn write(&mut self, data: &[u8], out: &mut Emitted) {
        let mut plain_start = 0;
        for (i, &byte) in data.iter().enumerate() {
            let was_idle = self.matcher.is_idle();
            match self.matcher.feed(byte, out) {
                Step::Plain => {}
                step => {
                    if was_idle {
                        out.data(&data[plain_start..i]);
                    }
                    plain_start = i + 1;
                    if step == Step::Complete {
                        out.mask();
                    }
                }
            }
        }
        out.data(&data[plain_start..]);
    }

    fn mask(&mut self, out: &mut Emitted) {
        self.matcher.flush(out);
        out.mask();
    }

    fn close(&mut self, out: &mut Emitted) {
        // Pending bytes are always a strict prefix: the matcher resets on
        // completion. Whatever is withheld goes out as is.
        self.matcher.flush(out);
    }
}

#[cfg(test)]
#[path = "masker_tests.rs"]
mod tests;
