// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct PodHandle {
    pod: String,
    attach_offset: u64,
}

#[test]
fn decode_returns_encoded_state() {
    let handle = PodHandle {
        pod: "runner-abc".into(),
        attach_offset: 512,
    };
    let snapshot = ExecutorSnapshot::encode(&handle).unwrap();
    assert_eq!(snapshot.decode::<PodHandle>().unwrap(), handle);
}

#[test]
fn decode_into_wrong_shape_fails() {
    let snapshot = ExecutorSnapshot::from(serde_json::json!({"container": 7}));
    let err = snapshot.decode::<PodHandle>().unwrap_err();
    assert!(matches!(err, SnapshotError::Shape(_)));
}
