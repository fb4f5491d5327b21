// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redaction is independent of how output is chunked.

use rw_trace::{CaptureBuffer, Pipeline, RedactionRules};
use similar_asserts::assert_eq;

const MASK: &str = "[MASKED]";

fn redact(rules: &RedactionRules, chunks: &[&[u8]]) -> Vec<u8> {
    let mut pipeline = Pipeline::new(rules, Vec::new());
    for chunk in chunks {
        pipeline.write(chunk).unwrap();
    }
    pipeline.close().unwrap();
    pipeline.into_sink()
}

/// Every split of `input` into one, two, or three chunks.
fn splits(input: &[u8]) -> Vec<Vec<&[u8]>> {
    let mut out = vec![vec![input]];
    for i in 0..=input.len() {
        out.push(vec![&input[..i], &input[i..]]);
        for j in i..=input.len() {
            out.push(vec![&input[..i], &input[i..j], &input[j..]]);
        }
    }
    out
}

fn assert_chunking_invariant(rules: &RedactionRules, input: &[u8], expected: &str) {
    for chunks in splits(input) {
        let got = redact(rules, &chunks);
        assert_eq!(String::from_utf8_lossy(&got), expected, "chunks: {chunks:?}");
    }
}

#[test]
fn phrases_are_masked_across_every_split() {
    let rules = RedactionRules::new().with_phrases(["hunter2"]);
    assert_chunking_invariant(
        &rules,
        b"pw=hunter2; again hunter2 and hunter",
        &format!("pw={MASK}; again {MASK} and hunter"),
    );
}

#[test]
fn self_overlapping_phrase_is_masked_across_every_split() {
    let rules = RedactionRules::new().with_phrases(["abab"]);
    assert_chunking_invariant(&rules, b"aababab!", &format!("a{MASK}ab!"));
}

#[test]
fn later_stages_never_match_inside_a_mask() {
    let rules = RedactionRules::new().with_phrases(["secret", "MASK", "ED]"]);
    assert_chunking_invariant(&rules, b"a secret b", &format!("a {MASK} b"));
}

#[test]
fn count_of_masks_matches_count_of_phrases() {
    let rules = RedactionRules::new().with_phrases(["s3cr3t", "t0k3n"]);
    let input = b"s3cr3t t0k3n s3cr3ts3cr3t x t0k3";
    for chunks in splits(input) {
        let got = String::from_utf8(redact(&rules, &chunks)).unwrap();
        assert_eq!(got.matches(MASK).count(), 4, "chunks: {chunks:?}");
        assert!(!got.contains("s3cr3t"));
    }
}

#[test]
fn url_parameters_and_tokens_are_masked() {
    let rules = RedactionRules::new().with_token_prefixes(["ghp_"]);
    let input = b"GET /a?private_token=abc&x=1 glpat-0123abcd ghp_zzz done";
    assert_chunking_invariant(
        &rules,
        input,
        &format!("GET /a?private_token={MASK}&x=1 glpat-{MASK} ghp_{MASK} done"),
    );
}

#[test]
fn capture_buffer_reports_only_what_was_omitted() {
    let mut small = CaptureBuffer::new(16);
    small.write(b"0123456789");
    assert_eq!(small.omitted(), 0);
    assert_eq!(small.report(), b"0123456789".to_vec());

    let mut full = CaptureBuffer::new(4);
    for chunk in [&b"abc"[..], b"defg", b"hi"] {
        full.write(chunk);
    }
    assert_eq!(full.omitted(), 5);
    assert_eq!(full.tail(), b"fghi".to_vec());
    assert_eq!(String::from_utf8(full.report()).unwrap(), "[5 bytes omitted]\nfghi");
}
