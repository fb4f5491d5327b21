// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rw_core::test_support::job;
use rw_core::{BuildStage, ExecutorSnapshot};

#[test]
fn decode_restores_runtime_state() {
    let mut original = job("42", 1_000);
    original.enter_stage(BuildStage::Script);
    original.state.executor_state = Some(ExecutorSnapshot::from(serde_json::json!({"pid": 7})));
    original.record_sent_trace(512);

    let record = decode(&encode(&original).unwrap()).unwrap();
    assert_eq!(record.v, CURRENT_RECORD_VERSION);
    assert_eq!(record.job, original);
}

#[test]
fn records_are_compressed() {
    let bytes = encode(&job("42", 0)).unwrap();
    // zstd frame magic
    assert_eq!(&bytes[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
}

#[test]
fn newer_version_is_rejected() {
    let json = serde_json::json!({
        "v": CURRENT_RECORD_VERSION + 1,
        "saved_at": "2026-01-01T00:00:00Z",
        "job": job("1", 0),
    });
    let bytes = zstd::encode_all(json.to_string().as_bytes(), 3).unwrap();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedVersion { found: 2, .. }));
}

#[test]
fn garbage_is_a_compression_error() {
    let err = decode(b"not a record").unwrap_err();
    assert!(matches!(err, StoreError::Compress(_)));
}
