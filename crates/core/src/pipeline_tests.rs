// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn names(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}

#[test]
fn encoded_and_decoded_lists_agree() {
    let decoded = StepList::Decoded(names(&["malware_scan", "pii_scan"]));
    let encoded = StepList::Encoded(r#"["malware_scan","pii_scan"]"#.to_string());

    assert_eq!(decoded.decode().unwrap(), encoded.decode().unwrap());
    assert_eq!(
        encoded.decode().unwrap(),
        names(&["malware_scan", "pii_scan"])
    );
}

#[test]
fn step_list_deserializes_either_shape() {
    let from_array: StepList = serde_json::from_str(r#"["ingestion"]"#).unwrap();
    let from_string: StepList = serde_json::from_str(r#""[\"ingestion\"]""#).unwrap();

    assert!(matches!(from_array, StepList::Decoded(_)));
    assert!(matches!(from_string, StepList::Encoded(_)));
    assert_eq!(from_array.decode().unwrap(), from_string.decode().unwrap());
}

#[test]
fn malformed_encoded_list_is_rejected() {
    let list = StepList::Encoded("not json".to_string());
    assert!(matches!(list.decode(), Err(StepsError::Malformed(_))));

    let list = StepList::Encoded(r#"{"step":"x"}"#.to_string());
    assert!(matches!(list.decode(), Err(StepsError::Malformed(_))));
}

#[test]
fn duplicate_step_names_are_rejected() {
    let list = StepList::Decoded(names(&["pii_scan", "ingestion", "pii_scan"]));
    match list.decode() {
        Err(StepsError::Duplicate(step)) => assert_eq!(step, "pii_scan"),
        other => panic!("expected duplicate error, got {:?}", other),
    }
}

#[test]
fn empty_list_is_allowed() {
    assert!(StepList::Encoded("[]".to_string()).decode().unwrap().is_empty());
}

#[test]
fn pipeline_step_names_preserve_order() {
    let pipeline = Pipeline::new(
        "p-1",
        "room-1",
        "intake",
        DEFAULT_STEPS,
        chrono::DateTime::<Utc>::UNIX_EPOCH,
    );

    assert_eq!(pipeline.step_names().unwrap(), names(DEFAULT_STEPS));
    assert_eq!(pipeline.created_at, pipeline.updated_at);
}
