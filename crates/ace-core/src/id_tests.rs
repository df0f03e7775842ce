// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn short_id_truncates() {
    let id = RootId::new("0123456789abcdef");
    assert_eq!(id.short(4), "0123");
    assert_eq!(id.short(100), "0123456789abcdef");
}

#[test]
fn sequential_id_gen_is_ordered_and_deterministic() {
    let gen = SequentialIdGen::new("root");
    assert_eq!(gen.next(), "root-1");
    assert_eq!(gen.next(), "root-2");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}

#[test]
fn root_id_equals_str() {
    let id = RootId::new("abc");
    assert_eq!(id, "abc");
}
