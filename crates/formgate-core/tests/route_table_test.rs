//! Property tests over the whole route table.
//!
//! Whatever the browser sends, the pure pipeline steps must behave: no
//! panics, no raw challenge token upstream, and validation agreeing with
//! path rendering for parameterized routes.

#![allow(clippy::unwrap_used)]

use formgate_core::{
    bypass::BOT_TOKEN_FIELD, catalog::ENDPOINTS, inbound, translate, validate, JsonMap,
};
use proptest::prelude::*;
use serde_json::Value;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ a-zA-Z0-9/]{0,12}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Bodies drawn from the field names endpoints actually read, plus noise.
fn inbound_body() -> impl Strategy<Value = JsonMap> {
    let known: Vec<&'static str> = ENDPOINTS
        .iter()
        .flat_map(|spec| spec.rules.iter().map(|rule| rule.field()))
        .chain([BOT_TOKEN_FIELD, "email", "source", "tone"])
        .collect();
    let key = prop_oneof![prop::sample::select(known).prop_map(String::from), "[a-z]{1,8}"];

    prop::collection::btree_map(key, json_value(), 0..8)
        .prop_map(|m| m.into_iter().collect::<JsonMap>())
}

proptest! {
    #[test]
    fn translation_never_forwards_raw_challenge_field(body in inbound_body()) {
        for spec in ENDPOINTS {
            let payload = translate(&body, spec);
            prop_assert!(!payload.contains_key(BOT_TOKEN_FIELD), "{}", spec.route);
        }
    }

    #[test]
    fn every_mapped_field_is_present_after_translation(body in inbound_body()) {
        for spec in ENDPOINTS {
            let payload = translate(&body, spec);
            for field in spec.fields {
                prop_assert!(payload.contains_key(field.to), "{} missing {}", spec.route, field.to);
            }
        }
    }

    #[test]
    fn validated_input_renders_upstream_path(body in inbound_body()) {
        for spec in ENDPOINTS {
            if validate(Some(&body), spec.rules).is_err() {
                continue;
            }
            // Only string/number params render; the results route validates
            // truthiness, so arrays/objects/true may still be rejected there.
            let rendered = spec.upstream.render(&body);
            let param_ok = spec.upstream.0.iter().all(|segment| match segment {
                formgate_core::Segment::Literal(_) => true,
                formgate_core::Segment::Param(name) => {
                    matches!(body.get(*name), Some(Value::String(_) | Value::Number(_)))
                }
            });
            prop_assert_eq!(rendered.is_some(), param_ok, "{}", spec.route);
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let body = inbound::parse_body(&data);
        for spec in ENDPOINTS {
            let _ = validate(body.as_ref(), spec.rules);
        }
    }
}
