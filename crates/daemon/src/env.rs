// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Unset or unparsable values yield `None` so callers keep their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: RW_STATE_DIR > XDG_STATE_HOME/rw > ~/.local/state/rw
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("RW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("rw"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/rw"))
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

fn millis(key: &str) -> Option<Duration> {
    parsed::<u64>(key).map(Duration::from_millis)
}

/// Registry name of the executor jobs run on
pub fn executor() -> Option<String> {
    std::env::var("RW_EXECUTOR").ok().filter(|name| !name.trim().is_empty())
}

pub fn check_interval() -> Option<Duration> {
    millis("RW_CHECK_INTERVAL_MS")
}

pub fn max_retries() -> Option<u32> {
    parsed("RW_MAX_RETRIES")
}

pub fn health_interval() -> Option<Duration> {
    millis("RW_HEALTH_INTERVAL_MS")
}

pub fn health_timeout() -> Option<Duration> {
    millis("RW_HEALTH_TIMEOUT_MS")
}

pub fn stale_timeout() -> Option<Duration> {
    millis("RW_STALE_TIMEOUT_MS")
}

/// Trace output cap, in bytes
pub fn output_limit() -> Option<u64> {
    parsed::<u64>("RW_OUTPUT_LIMIT_KB").map(|kb| kb.saturating_mul(1024))
}

pub fn trace_interval() -> Option<Duration> {
    millis("RW_TRACE_INTERVAL_MS")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
