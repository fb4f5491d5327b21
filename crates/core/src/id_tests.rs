// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId;
}

#[test]
fn define_id_round_trips_through_display_and_from() {
    let id: TestId = "job-42".into();
    assert_eq!(id.as_str(), "job-42");
    assert_eq!(id.to_string(), "job-42");
    assert_eq!(id, "job-42");
}

#[test]
fn define_id_serializes_as_plain_string() {
    let id = TestId::new("abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    let back: TestId = serde_json::from_str("\"abc\"").unwrap();
    assert_eq!(back, id);
}

#[test]
fn define_id_hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(TestId::new("k"), 42);
    assert_eq!(map.get("k"), Some(&42));
}

#[yare::parameterized(
    shorter = { "abc", 8, "abc" },
    exact = { "abcdefgh", 8, "abcdefgh" },
    longer = { "abcdefghij", 8, "abcdefgh" },
    multibyte = { "żółw-123", 3, "żół" },
)]
fn short_truncates_on_char_boundary(input: &str, n: usize, expected: &str) {
    assert_eq!(input.short(n), expected);
}

#[test]
fn system_ids_are_prefixed_and_unique() {
    let id = new_system_id();
    assert!(id.starts_with("s_"));
    assert_eq!(id.len(), 14);
    assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(id, new_system_id());
}
