// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn inputs<'a>(flags: &'a [String], deps: &'a [String]) -> HashInputs<'a> {
    HashInputs {
        compiler_id: "gcc",
        compiler_version: "13.2.0",
        flags,
        source_digest: "deadbeef",
        dependency_digests: deps,
    }
}

#[test]
fn same_inputs_hash_to_the_same_key() {
    let flags = vec!["-O2".to_string()];
    let deps = vec!["abc123".to_string()];
    let a = hash_build_inputs(&inputs(&flags, &deps));
    let b = hash_build_inputs(&inputs(&flags, &deps));
    assert_eq!(a, b);
}

#[test]
fn different_flags_hash_to_different_keys() {
    let deps = vec![];
    let a = hash_build_inputs(&inputs(&[String::from("-O2")], &deps));
    let b = hash_build_inputs(&inputs(&[String::from("-O3")], &deps));
    assert_ne!(a, b);
}

#[test]
fn field_boundary_shift_does_not_collide() {
    // ["ab", "c"] and ["a", "bc"] must not hash the same just because their
    // concatenation without a separator would match.
    let a = hash_build_inputs(&inputs(&[String::from("ab"), String::from("c")], &[]));
    let b = hash_build_inputs(&inputs(&[String::from("a"), String::from("bc")], &[]));
    assert_ne!(a, b);
}

#[test]
fn hash_bytes_is_deterministic() {
    assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
    assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
}
