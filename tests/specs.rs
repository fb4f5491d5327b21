// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specifications for the job engine.
//!
//! These tests drive the public crates end to end against fake adapters and
//! an on-disk job store, simulating agent restarts by reopening the store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// resume/
#[path = "specs/resume/scenarios.rs"]
mod resume_scenarios;

// store/
#[path = "specs/store/idempotence.rs"]
mod store_idempotence;

// trace/
#[path = "specs/trace/redaction.rs"]
mod trace_redaction;
