// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rw-trace: streaming redaction of job output
//!
//! Output flows through an ordered chain of stateful filters before it
//! reaches a [`Sink`]. Each filter keeps its partial-match state between
//! writes, so splitting the input differently never changes the output.

mod capture;
mod filter;
mod masker;
mod pipeline;
mod token_sanitizer;
mod url_sanitizer;

pub use capture::CaptureBuffer;
pub use filter::MASK;
pub use pipeline::{Pipeline, RedactionRules, Sink};
pub use token_sanitizer::{DEFAULT_TOKEN_PREFIX, MAX_TOKEN_PREFIXES};
pub use url_sanitizer::SENSITIVE_PARAM_KEYS;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("write after close")]
    Closed,
    #[error("sink rejected write: {0}")]
    Sink(String),
}
