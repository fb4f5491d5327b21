// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Masks the values of sensitive query parameters found in free text.
//!
//! A key starts right after `?` or `&`. When it is followed by `=` and the
//! key names a known secret, the mask is emitted and the value is dropped
//! up to the next parameter end. Keys longer than the longest known key
//! are released untouched, so the withheld buffer stays bounded.

use crate::filter::{Emitted, Filter};

/// Query parameter keys whose values are always masked (case-insensitive)
pub const SENSITIVE_PARAM_KEYS: [&str; 6] = [
    "private_token",
    "authenticity_token",
    "rss_token",
    "x-amz-signature",
    "x-amz-credential",
    "x-amz-security-token",
];

fn max_key_len() -> usize {
    SENSITIVE_PARAM_KEYS
        .iter()
        .map(|k| k.len())
        .max()
        .unwrap_or(0)
}

fn is_sensitive(key: &[u8]) -> bool {
    SENSITIVE_PARAM_KEYS
        .iter()
        .any(|k| k.as_bytes().eq_ignore_ascii_case(key))
}

fn is_separator(byte: u8) -> bool {
    byte == b'?' || byte == b'&'
}

fn is_param_end(byte: u8) -> bool {
    is_separator(byte) || byte.is_ascii_whitespace() || byte.is_ascii_control()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for `?` or `&`
    Scanning,
    /// Collecting a key name into the buffer
    Key,
    /// Dropping a sensitive value
    Masking,
}

#[derive(Debug)]
pub(crate) struct UrlSanitizer {
    state: State,
    key: Vec<u8>,
    max_key_len: usize,
}

impl UrlSanitizer {
    pub fn new() -> Self {
        let max_key_len = max_key_len();
        Self {
            state: State::Scanning,
            key: Vec::with_capacity(max_key_len),
            max_key_len,
        }
    }

    fn release_key(&mut self, out: &mut Emitted) {
        out.data(&self.key);
        self.key.clear();
    }
}

impl Filter for UrlSanitizer {
    fn write(&mut self, data: &[u8], out: &mut Emitted) {
        // Bytes in data[plain_start..i] pass through unchanged
        let mut plain_start = 0;
        let mut i = 0;
        while i < data.len() {
            let byte = data[i];
            match self.state {
                State::Scanning => {
                    if is_separator(byte) {
                        out.data(&data[plain_start..=i]);
                        plain_start = i + 1;
                        self.state = State::Key;
                    }
                }
                State::Key => {
                    if byte == b'=' {
                        let sensitive = is_sensitive(&self.key);
                        self.release_key(out);
                        out.data(b"=");
                        if sensitive {
                            out.mask();
                            self.state = State::Masking;
                        } else {
                            self.state = State::Scanning;
                        }
                        plain_start = i + 1;
                    } else if is_separator(byte) {
                        self.release_key(out);
                        out.data(&[byte]);
                        plain_start = i + 1;
                    } else if is_param_end(byte) || self.key.len() == self.max_key_len {
                        self.release_key(out);
                        self.state = State::Scanning;
                        plain_start = i;
                    } else {
                        self.key.push(byte);
                        plain_start = i + 1;
                    }
                }
                State::Masking => {
                    if is_param_end(byte) {
                        self.state = State::Scanning;
                        plain_start = i;
                        // the separator may open the next key
                        continue;
                    }
                    plain_start = i + 1;
                }
            }
            i += 1;
        }
        out.data(&data[plain_start..]);
    }

    fn mask(&mut self, out: &mut Emitted) {
        match self.state {
            // the value is already masked
            State::Masking => {}
            State::Key => {
                self.release_key(out);
                self.state = State::Scanning;
                out.mask();
            }
            State::Scanning => out.mask(),
        }
    }

    fn close(&mut self, out: &mut Emitted) {
        if self.state == State::Key {
            self.release_key(out);
        }
        self.state = State::Scanning;
    }
}

#[cfg(test)]
#[path = "url_sanitizer_tests.rs"]
mod tests;
