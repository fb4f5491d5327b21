// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Masks access tokens recognized by a known prefix.
//!
//! The prefix itself stays visible; the run of token bytes after it is
//! replaced by a single mask token.

use crate::filter::{Emitted, Filter, Matcher, Step};

/// Prefix of personal access tokens, always masked
pub const DEFAULT_TOKEN_PREFIX: &str = "glpat-";

/// Prefixes beyond this count (default included) are ignored
pub const MAX_TOKEN_PREFIXES: usize = 10;

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'=')
}

/// Default prefix first, then the given ones, trimmed, deduplicated and
/// capped at [`MAX_TOKEN_PREFIXES`].
pub(crate) fn normalize_prefixes<S: AsRef<str>>(extra: &[S]) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    let candidates =
        std::iter::once(DEFAULT_TOKEN_PREFIX).chain(extra.iter().map(|p| p.as_ref().trim()));
    for prefix in candidates {
        if prefixes.len() == MAX_TOKEN_PREFIXES {
            tracing::debug!(prefix, "ignoring token prefix over limit");
            continue;
        }
        if !prefix.is_empty() && !prefixes.iter().any(|p| p == prefix) {
            prefixes.push(prefix.to_string());
        }
    }
    prefixes
}

#[derive(Debug)]
pub(crate) struct TokenSanitizer {
    matcher: Matcher,
    /// Prefix matched; dropping token bytes
    in_token: bool,
    /// At least one token byte was dropped in the current run
    dropped: bool,
}

impl TokenSanitizer {
    /// `prefix` must not be empty.
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            matcher: Matcher::new(prefix.to_vec()),
            in_token: false,
            dropped: false,
        }
    }

    fn end_token(&mut self, out: &mut Emitted) {
        if self.dropped {
            out.mask();
        }
        self.in_token = false;
        self.dropped = false;
    }
}

impl Filter for TokenSanitizer {
    fn write(&mut self, data: &[u8], out: &mut Emitted) {
        let mut plain_start = 0;
        for (i, &byte) in data.iter().enumerate() {
            if self.in_token {
                if is_token_byte(byte) {
                    self.dropped = true;
                    plain_start = i + 1;
                    continue;
                }
                self.end_token(out);
                plain_start = i;
            }
            let was_idle = self.matcher.is_idle();
            match self.matcher.feed(byte, out) {
                Step::Plain => {}
                step => {
                    if was_idle {
                        out.data(&data[plain_start..i]);
                    }
                    plain_start = i + 1;
                    if step == Step::Complete {
                        out.data(self.matcher.pattern());
                        self.in_token = true;
                    }
                }
            }
        }
        out.data(&data[plain_start..]);
    }

    fn mask(&mut self, out: &mut Emitted) {
        if self.in_token {
            self.end_token(out);
        }
        self.matcher.flush(out);
        out.mask();
    }

    fn close(&mut self, out: &mut Emitted) {
        if self.in_token {
            self.end_token(out);
        }
        self.matcher.flush(out);
    }
}

#[cfg(test)]
#[path = "token_sanitizer_tests.rs"]
mod tests;
