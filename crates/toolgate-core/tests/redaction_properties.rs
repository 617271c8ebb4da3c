// crates/toolgate-core/tests/redaction_properties.rs
// ============================================================================
// Module: Redaction Property Tests
// Description: Property tests for redaction idempotence and completeness.
// ============================================================================
//! ## Overview
//! Generates payloads mixing plain words with PII tokens and checks that
//! redaction is idempotent, leaves no pattern match behind, and preserves
//! payload structure.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use toolgate_core::Redactor;

// ============================================================================
// SECTION: Strategies
// ============================================================================

fn pii_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        ("[a-z]{1,6}", "[a-z]{1,6}", "[a-z]{2,3}")
            .prop_map(|(user, host, tld)| format!("{user}@{host}.{tld}")),
        (100u32..999, 10u32..99, 1000u32..9999)
            .prop_map(|(a, b, c)| format!("{a}-{b}-{c}")),
        (100u32..999, 100u32..999, 1000u32..9999)
            .prop_map(|(a, b, c)| format!("{a}-{b}-{c}")),
        (100u32..999, 100u32..999, 1000u32..9999)
            .prop_map(|(a, b, c)| format!("({a}) {b}-{c}")),
        (1000u32..9999, 1000u32..9999, 1000u32..9999, 1000u32..9999)
            .prop_map(|(a, b, c, d)| format!("{a}-{b}-{c}-{d}")),
        (0u32..256, 0u32..256, 0u32..256, 0u32..256)
            .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}")),
    ]
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(pii_token(), 0..6).prop_map(|tokens| tokens.join(" | "))
}

fn payload() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        text().prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        Just(Value::Null),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.push(text.clone()),
        Value::Number(number) => out.push(number.to_string()),
        Value::Array(items) => items.iter().for_each(|item| strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| strings(item, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

fn same_shape(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| same_shape(x, y)))
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => true,
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn redaction_is_idempotent(value in payload()) {
        let redactor = Redactor::with_builtin().unwrap();
        let once = redactor.redact(&value);
        let twice = redactor.redact(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn redaction_leaves_no_pattern_match(value in payload()) {
        let redactor = Redactor::with_builtin().unwrap();
        let redacted = redactor.redact(&value);
        let mut texts = Vec::new();
        strings(&redacted, &mut texts);
        for text in texts {
            prop_assert!(!redactor.contains_pii(&text), "residual pii in {}", text);
        }
    }

    #[test]
    fn redaction_preserves_structure(value in payload()) {
        let redactor = Redactor::with_builtin().unwrap();
        prop_assert!(same_shape(&value, &redactor.redact(&value)));
    }

    #[test]
    fn redaction_is_deterministic(value in payload()) {
        let first = Redactor::with_builtin().unwrap().redact(&value);
        let second = Redactor::with_builtin().unwrap().redact(&value);
        prop_assert_eq!(first, second);
    }
}
