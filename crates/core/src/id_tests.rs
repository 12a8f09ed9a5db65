// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn uuid_gen_creates_unique_ids() {
    let id_gen = UuidIdGen;
    let id1 = id_gen.next();
    let id2 = id_gen.next();
    assert_ne!(id1, id2);
    assert!(uuid::Uuid::parse_str(&id1).is_ok());
}

#[test]
fn sequential_gen_shares_counter_across_clones() {
    let id_gen1 = SequentialIdGen::new("run");
    let id_gen2 = id_gen1.clone();
    assert_eq!(id_gen1.next(), "run-1");
    assert_eq!(id_gen2.next(), "run-2");
    assert_eq!(id_gen1.next(), "run-3");
}

#[test]
fn ids_serialize_as_plain_strings() {
    let id = RunId::new("run-42");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"run-42\"");

    let parsed: PipelineId = serde_json::from_str("\"p-1\"").unwrap();
    assert_eq!(parsed, PipelineId::from("p-1"));
    assert_eq!(parsed.to_string(), "p-1");
}
