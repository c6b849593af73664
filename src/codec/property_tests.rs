//! Property-Based Tests for the Codec Module
//!
//! Uses proptest to check round-trip fidelity, legacy passthrough and tag
//! discrimination for both wire formats.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::codec::header::{BinaryTag, TextTag, BINARY_HEADER, TEXT_HEADER};
use crate::codec::{binary, text, Json, Payload, Storable, Value};

const STORE: &str = "PropStorage";

// == Strategies ==
fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        prop_oneof![Just(f64::INFINITY), Just(f64::NEG_INFINITY)].prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
        (0i64..4_102_444_800, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
            Value::Date(Utc.timestamp_opt(secs, nanos).single().unwrap_or_default())
        }),
        any::<i128>().prop_map(Value::BigInt),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z.\\\\]{0,6}", inner.clone(), 0..6)
                .prop_map(|fields: BTreeMap<String, Value>| Value::Object(fields)),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(Value::Map),
            prop::collection::vec(inner, 0..4).prop_map(Value::Set),
        ]
    })
}

fn non_finite_f64() -> impl Strategy<Value = f64> {
    prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
}

fn text_without_header() -> impl Strategy<Value = String> {
    ".{0,64}".prop_filter("must not start with the header", |s: &String| {
        !s.starts_with(TEXT_HEADER)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Round-trip: decode(encode(v)) == v for every structured value, both formats.
    #[test]
    fn prop_structured_roundtrip(value in value_strategy()) {
        let payload = value.into_payload().unwrap();

        let encoded = text::encode(STORE, payload.clone()).unwrap();
        prop_assert_eq!(text::decode(STORE, encoded).unwrap(), payload.clone());

        let encoded = binary::encode(STORE, payload.clone()).unwrap();
        prop_assert_eq!(binary::decode(STORE, encoded).unwrap(), payload);
    }

    // Strings round-trip byte for byte without JSON quoting.
    #[test]
    fn prop_string_roundtrip(s in ".{0,64}") {
        let encoded = text::encode(STORE, s.clone().into_payload().unwrap()).unwrap();
        prop_assert_eq!(&encoded[TEXT_HEADER.len() + 1..], s.as_str());
        let decoded = String::from_payload(text::decode(STORE, encoded).unwrap()).unwrap();
        prop_assert_eq!(&decoded, &s);

        let encoded = binary::encode(STORE, s.clone().into_payload().unwrap()).unwrap();
        let decoded = String::from_payload(binary::decode(STORE, encoded).unwrap()).unwrap();
        prop_assert_eq!(decoded, s);
    }

    // Non-finite floats survive both formats instead of collapsing to null.
    #[test]
    fn prop_non_finite_f64_roundtrip(n in non_finite_f64()) {
        let same = |decoded: f64| (n.is_nan() && decoded.is_nan()) || decoded == n;

        let encoded = text::encode(STORE, n.into_payload().unwrap()).unwrap();
        prop_assert!(same(f64::from_payload(text::decode(STORE, encoded).unwrap()).unwrap()));

        let encoded = binary::encode(STORE, n.into_payload().unwrap()).unwrap();
        prop_assert!(same(f64::from_payload(binary::decode(STORE, encoded).unwrap()).unwrap()));
    }

    // Raw buffers round-trip unchanged through the binary codec.
    #[test]
    fn prop_bytes_roundtrip(raw in prop::collection::vec(any::<u8>(), 0..128)) {
        let raw = Bytes::from(raw);
        let encoded = binary::encode(STORE, Payload::Binary(raw.clone())).unwrap();
        prop_assert_eq!(binary::decode(STORE, encoded).unwrap(), Payload::Binary(raw));
    }

    // Legacy passthrough: anything without the header decodes to itself.
    #[test]
    fn prop_text_legacy_passthrough(s in text_without_header()) {
        prop_assert_eq!(text::decode(STORE, s.clone()).unwrap(), Payload::Text(s));
    }

    #[test]
    fn prop_binary_legacy_passthrough(raw in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(!raw.starts_with(&BINARY_HEADER));
        let raw = Bytes::from(raw);
        prop_assert_eq!(binary::decode(STORE, raw.clone()).unwrap(), Payload::Binary(raw));
    }

    // Tag discrimination: strings never carry the structured tag, everything else does.
    #[test]
    fn prop_tag_discrimination(value in value_strategy()) {
        let is_string = matches!(value, Value::String(_));
        let payload = value.into_payload().unwrap();

        let encoded = text::encode(STORE, payload.clone()).unwrap();
        let tag = encoded[TEXT_HEADER.len()..].chars().next().unwrap();
        let expected = if is_string { TextTag::PlainString } else { TextTag::Structured };
        prop_assert_eq!(tag, expected.as_char());

        let encoded = binary::encode(STORE, payload).unwrap();
        let expected = if is_string { BinaryTag::PlainString } else { BinaryTag::Structured };
        prop_assert_eq!(encoded[BINARY_HEADER.len()], expected as u8);
    }

    // Strings wrapped as serde values still take the plain string tag.
    #[test]
    fn prop_json_string_tag(s in ".{0,32}") {
        let encoded = text::encode(STORE, Json(s.clone()).into_payload().unwrap()).unwrap();
        prop_assert_eq!(encoded, format!("{TEXT_HEADER}{}{s}", TextTag::PlainString.as_char()));

        let encoded = binary::encode(STORE, Json(s).into_payload().unwrap()).unwrap();
        prop_assert_eq!(encoded[BINARY_HEADER.len()], BinaryTag::PlainString as u8);
    }
}
