// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record format: zstd-compressed JSON with a schema version

use crate::store::StoreError;
use chrono::{DateTime, Utc};
use rw_core::Job;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version written into every record as `v`
pub const CURRENT_RECORD_VERSION: u64 = 1;

const COMPRESSION_LEVEL: i32 = 3;

/// A persisted job as read back from the store.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub v: u64,
    pub saved_at: DateTime<Utc>,
    pub job: Job,
}

#[derive(Serialize)]
struct RecordRef<'a> {
    v: u64,
    saved_at: DateTime<Utc>,
    job: &'a Job,
}

pub(crate) fn encode(job: &Job) -> Result<Vec<u8>, StoreError> {
    let record = RecordRef {
        v: CURRENT_RECORD_VERSION,
        saved_at: Utc::now(),
        job,
    };
    let json = serde_json::to_vec(&record)?;
    zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
        .map_err(|e| StoreError::Compress(e.to_string()))
}

pub(crate) fn decode(bytes: &[u8]) -> Result<JobRecord, StoreError> {
    let json = zstd::decode_all(bytes).map_err(|e| StoreError::Compress(e.to_string()))?;
    let value: Value = serde_json::from_slice(&json)?;
    let found = value.get("v").and_then(Value::as_u64).unwrap_or(1);
    if found > CURRENT_RECORD_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found,
            supported: CURRENT_RECORD_VERSION,
        });
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
