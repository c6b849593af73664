//! Structured-JSON Module
//!
//! Serializes a [`Value`] into a JSON document that carries the metadata
//! needed to restore dates, maps, sets, big integers and non-finite numbers:
//!
//! ```text
//! {"json": <plain JSON>, "meta": {"values": {"$.created": "Date"}}}
//! ```
//!
//! Annotation paths start at `$` and join escaped segments with `.`; map
//! entries are addressed as `<map>.<index>.0` (key) and `<map>.<index>.1` (value).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Map};

use super::value::{format_date, Value};

const ROOT_PATH: &str = "$";

const DATE_TAG: &str = "Date";
const MAP_TAG: &str = "map";
const SET_TAG: &str = "set";
const BIGINT_TAG: &str = "bigint";
const NUMBER_TAG: &str = "number";

type Annotations = BTreeMap<String, String>;

// == Serialize ==
/// Builds the structured document for a value.
pub fn serialize(value: &Value) -> serde_json::Value {
    let mut annotations = Annotations::new();
    let json = lower(value, ROOT_PATH.to_string(), &mut annotations);

    if annotations.is_empty() {
        json!({ "json": json })
    } else {
        let values: Map<String, serde_json::Value> = annotations
            .into_iter()
            .map(|(path, tag)| (path, serde_json::Value::String(tag)))
            .collect();
        json!({ "json": json, "meta": { "values": values } })
    }
}

fn lower(value: &Value, path: String, annotations: &mut Annotations) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::NonFinite(n) => {
            annotations.insert(path, NUMBER_TAG.to_string());
            serde_json::Value::String(non_finite_name(*n).to_string())
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => lower_items(items, &path, annotations),
        Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), lower(field, child_path(&path, key), annotations)))
                .collect(),
        ),
        Value::Date(date) => {
            annotations.insert(path, DATE_TAG.to_string());
            serde_json::Value::String(format_date(date))
        }
        Value::Set(items) => {
            let json = lower_items(items, &path, annotations);
            annotations.insert(path, SET_TAG.to_string());
            json
        }
        Value::Map(pairs) => {
            let entries = pairs
                .iter()
                .enumerate()
                .map(|(index, (key, entry))| {
                    let entry_path = child_path(&path, &index.to_string());
                    serde_json::Value::Array(vec![
                        lower(key, child_path(&entry_path, "0"), annotations),
                        lower(entry, child_path(&entry_path, "1"), annotations),
                    ])
                })
                .collect();
            annotations.insert(path, MAP_TAG.to_string());
            serde_json::Value::Array(entries)
        }
        Value::BigInt(n) => {
            annotations.insert(path, BIGINT_TAG.to_string());
            serde_json::Value::String(n.to_string())
        }
    }
}

fn non_finite_name(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn lower_items(items: &[Value], path: &str, annotations: &mut Annotations) -> serde_json::Value {
    serde_json::Value::Array(
        items
            .iter()
            .enumerate()
            .map(|(index, item)| lower(item, child_path(path, &index.to_string()), annotations))
            .collect(),
    )
}

// == Deserialize ==
/// Restores a value from its structured document.
///
/// Fails with a human readable reason when the document is not shaped like
/// the output of [`serialize`] or an annotated node cannot be restored.
pub fn deserialize(document: serde_json::Value) -> Result<Value, String> {
    let serde_json::Value::Object(mut document) = document else {
        return Err("structured document must be a JSON object".to_string());
    };
    let json = document
        .remove("json")
        .ok_or_else(|| "structured document has no \"json\" field".to_string())?;
    let annotations = read_annotations(document.remove("meta"))?;

    raise(json, ROOT_PATH.to_string(), &annotations)
}

fn read_annotations(meta: Option<serde_json::Value>) -> Result<Annotations, String> {
    let Some(meta) = meta else {
        return Ok(Annotations::new());
    };
    let values = match meta {
        serde_json::Value::Object(mut meta) => meta.remove("values"),
        _ => return Err("\"meta\" must be an object".to_string()),
    };
    match values {
        None => Ok(Annotations::new()),
        Some(serde_json::Value::Object(values)) => values
            .into_iter()
            .map(|(path, tag)| match tag {
                serde_json::Value::String(tag) => Ok((path, tag)),
                other => Err(format!("annotation for {path} must be a string, got {other}")),
            })
            .collect(),
        Some(_) => Err("\"meta.values\" must be an object".to_string()),
    }
}

// Post-order: children are restored before the annotation on their parent is applied.
fn raise(json: serde_json::Value, path: String, annotations: &Annotations) -> Result<Value, String> {
    let value = match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| raise(item, child_path(&path, &index.to_string()), annotations))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| {
                    let field = raise(field, child_path(&path, &key), annotations)?;
                    Ok((key, field))
                })
                .collect::<Result<_, String>>()?,
        ),
    };

    match annotations.get(&path) {
        Some(tag) => apply_annotation(tag, value, &path),
        None => Ok(value),
    }
}

fn apply_annotation(tag: &str, value: Value, path: &str) -> Result<Value, String> {
    match (tag, value) {
        (DATE_TAG, Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|date| Value::Date(date.with_timezone(&Utc)))
            .map_err(|err| format!("invalid date at {path}: {err}")),
        (SET_TAG, Value::Array(items)) => Ok(Value::Set(items)),
        (MAP_TAG, Value::Array(entries)) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::Array(pair) if pair.len() == 2 => {
                    let mut pair = pair.into_iter();
                    match (pair.next(), pair.next()) {
                        (Some(key), Some(value)) => Ok((key, value)),
                        _ => Err(format!("map entry at {path} is not a pair")),
                    }
                }
                _ => Err(format!("map entry at {path} is not a pair")),
            })
            .collect::<Result<_, _>>()
            .map(Value::Map),
        (BIGINT_TAG, Value::String(s)) => s
            .parse::<i128>()
            .map(Value::BigInt)
            .map_err(|err| format!("invalid bigint at {path}: {err}")),
        (NUMBER_TAG, Value::String(s)) => match s.as_str() {
            "NaN" => Ok(Value::NonFinite(f64::NAN)),
            "Infinity" => Ok(Value::NonFinite(f64::INFINITY)),
            "-Infinity" => Ok(Value::NonFinite(f64::NEG_INFINITY)),
            other => Err(format!("invalid number {other:?} at {path}")),
        },
        (DATE_TAG | SET_TAG | MAP_TAG | BIGINT_TAG | NUMBER_TAG, other) => {
            Err(format!("{tag} annotation at {path} cannot apply to {}", other.kind()))
        }
        (unknown, _) => Err(format!("unknown type annotation {unknown:?} at {path}")),
    }
}

// == Paths ==
fn child_path(parent: &str, segment: &str) -> String {
    let mut path = String::with_capacity(parent.len() + segment.len() + 1);
    path.push_str(parent);
    path.push('.');
    for c in segment.chars() {
        if c == '.' || c == '\\' {
            path.push('\\');
        }
        path.push(c);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn roundtrip(value: &Value) -> Value {
        deserialize(serialize(value)).unwrap()
    }

    #[test]
    fn test_plain_json_has_no_meta() {
        let value = Value::from(json!({"id": 1, "name": "Alice"}));
        let document = serialize(&value);
        assert!(document.get("meta").is_none());
        assert_eq!(document["json"], json!({"id": 1, "name": "Alice"}));
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_root_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let document = serialize(&Value::Date(date));
        assert_eq!(
            document,
            json!({"json": "2024-01-01T00:00:00Z", "meta": {"values": {"$": "Date"}}})
        );
        assert_eq!(roundtrip(&Value::Date(date)), Value::Date(date));
    }

    #[test]
    fn test_nested_map_with_date_keys() {
        let date = Utc.with_ymd_and_hms(2023, 6, 15, 12, 30, 0).unwrap();
        let mut fields = BTreeMap::new();
        fields.insert(
            "visits".to_string(),
            Value::Map(vec![
                (Value::Date(date), Value::from(3i64)),
                (Value::from("total"), Value::Set(vec![Value::BigInt(-7)])),
            ]),
        );
        let value = Value::Object(fields);

        let document = serialize(&value);
        assert_eq!(document["meta"]["values"]["$.visits"], "map");
        assert_eq!(document["meta"]["values"]["$.visits.0.0"], "Date");
        assert_eq!(document["meta"]["values"]["$.visits.1.1"], "set");
        assert_eq!(document["meta"]["values"]["$.visits.1.1.0"], "bigint");
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_dotted_keys_do_not_collide() {
        let date = Utc.with_ymd_and_hms(2020, 2, 29, 0, 0, 0).unwrap();
        let mut inner = BTreeMap::new();
        inner.insert("b".to_string(), Value::from("plain"));
        let mut fields = BTreeMap::new();
        fields.insert("a.b".to_string(), Value::Date(date));
        fields.insert("a".to_string(), Value::Object(inner));
        let value = Value::Object(fields);

        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_non_finite_numbers_are_annotated() {
        let value = Value::Array(vec![
            Value::from(f64::INFINITY),
            Value::from(f64::NEG_INFINITY),
            Value::from(2.5f64),
        ]);
        let document = serialize(&value);
        assert_eq!(document["json"], json!(["Infinity", "-Infinity", 2.5]));
        assert_eq!(document["meta"]["values"]["$.0"], "number");
        assert_eq!(document["meta"]["values"]["$.1"], "number");
        assert_eq!(roundtrip(&value), value);

        let document = serialize(&Value::from(f64::NAN));
        assert_eq!(document, json!({"json": "NaN", "meta": {"values": {"$": "number"}}}));
        assert!(matches!(deserialize(document).unwrap(), Value::NonFinite(n) if n.is_nan()));
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert!(deserialize(json!([1, 2])).is_err());
        assert!(deserialize(json!({"meta": {}})).is_err());
        assert!(deserialize(json!({"json": 1, "meta": {"values": {"$": "Date"}}})).is_err());
        assert!(deserialize(json!({"json": "x", "meta": {"values": {"$": "regexp"}}})).is_err());
        assert!(deserialize(json!({"json": [[1]], "meta": {"values": {"$": "map"}}})).is_err());
        assert!(deserialize(json!({"json": "1e999", "meta": {"values": {"$": "number"}}})).is_err());
    }
}
