// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redaction chain construction and driving

use crate::filter::{Chunk, Emitted, Filter, MASK};
use crate::masker::PhraseMasker;
use crate::token_sanitizer::{normalize_prefixes, TokenSanitizer};
use crate::url_sanitizer::UrlSanitizer;
use crate::TraceError;
use std::cmp::Reverse;

/// Final destination of redacted output
pub trait Sink: Send {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError>;

    fn close(&mut self) -> Result<(), TraceError> {
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        self.extend_from_slice(data);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        (**self).write(data)
    }

    fn close(&mut self) -> Result<(), TraceError> {
        (**self).close()
    }
}

/// What a job's pipeline must redact. Fixed once the pipeline is built.
#[derive(Debug, Clone, Default)]
pub struct RedactionRules {
    phrases: Vec<Vec<u8>>,
    token_prefixes: Vec<String>,
}

impl RedactionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Secret values to mask wherever they appear.
    pub fn with_phrases<I, P>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.phrases
            .extend(phrases.into_iter().map(|p| p.as_ref().to_vec()));
        self
    }

    /// Token prefixes to mask in addition to the default one.
    pub fn with_token_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.token_prefixes
            .extend(prefixes.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    /// Non-empty unique phrases, longest first.
    fn ordered_phrases(&self) -> Vec<&[u8]> {
        let mut phrases: Vec<&[u8]> = self
            .phrases
            .iter()
            .map(Vec::as_slice)
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by_key(|p| (Reverse(p.len()), *p));
        phrases.dedup();
        phrases
    }

    fn ordered_token_prefixes(&self) -> Vec<String> {
        let mut prefixes = normalize_prefixes(&self.token_prefixes);
        prefixes.sort_by_key(|p| Reverse(p.len()));
        prefixes
    }
}

/// Ordered chain of redaction filters feeding a sink.
///
/// Order: one masker per phrase (longest first), the URL sanitizer, then
/// one token sanitizer per prefix (longest first).
pub struct Pipeline<S> {
    filters: Vec<Box<dyn Filter>>,
    sink: S,
    closed: bool,
}

impl<S: Sink> Pipeline<S> {
    pub fn new(rules: &RedactionRules, sink: S) -> Self {
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        for phrase in rules.ordered_phrases() {
            filters.push(Box::new(PhraseMasker::new(phrase)));
        }
        filters.push(Box::new(UrlSanitizer::new()));
        for prefix in rules.ordered_token_prefixes() {
            filters.push(Box::new(TokenSanitizer::new(prefix.as_bytes())));
        }
        tracing::debug!(stages = filters.len(), "redaction pipeline built");
        Self {
            filters,
            sink,
            closed: false,
        }
    }

    pub fn stage_count(&self) -> usize {
        self.filters.len()
    }

    /// Redact `data` and forward whatever is safe to emit.
    ///
    /// A write that is exactly the mask token is forwarded as a mask
    /// without being matched again.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TraceError> {
        if self.closed {
            return Err(TraceError::Closed);
        }
        if data.is_empty() {
            return Ok(());
        }
        let first = if data == MASK {
            Chunk::Mask
        } else {
            Chunk::Data(data.to_vec())
        };
        self.drive(vec![first], false)
    }

    /// Release withheld partial matches and close the sink. Idempotent.
    pub fn close(&mut self) -> Result<(), TraceError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.drive(Vec::new(), true)?;
        self.sink.close()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn drive(&mut self, mut chunks: Vec<Chunk>, closing: bool) -> Result<(), TraceError> {
        for filter in &mut self.filters {
            let mut out = Emitted::default();
            for chunk in &chunks {
                match chunk {
                    Chunk::Data(data) => filter.write(data, &mut out),
                    Chunk::Mask => filter.mask(&mut out),
                }
            }
            if closing {
                filter.close(&mut out);
            }
            chunks = out.into_chunks();
        }
        for chunk in chunks {
            match chunk {
                Chunk::Data(data) => self.sink.write(&data)?,
                Chunk::Mask => self.sink.write(MASK)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
