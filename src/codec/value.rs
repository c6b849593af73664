//! Dynamic Value Module
//!
//! A structured value that can hold the non-JSON-native types (dates, maps
//! with arbitrary keys, sets, big integers) next to plain JSON data.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Number;

// == Value ==
/// A structured value as persisted by the Structured-JSON encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    /// `NaN` or an infinity, which a JSON number cannot carry
    NonFinite(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// A point in time, restored as a date rather than a string
    Date(DateTime<Utc>),
    /// Insertion-ordered key/value pairs; keys may be any value
    Map(Vec<(Value, Value)>),
    /// Insertion-ordered unique members
    Set(Vec<Value>),
    /// Integer wider than a JSON number can carry exactly
    BigInt(i128),
}

impl Value {
    // == Kind ==
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) | Value::NonFinite(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Date(_) => "Date",
            Value::Map(_) => "Map",
            Value::Set(_) => "Set",
            Value::BigInt(_) => "bigint",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    // == Plain JSON Projection ==
    /// Lowers the value to plain JSON, dropping type metadata.
    ///
    /// Dates become RFC 3339 strings, sets become arrays, maps whose keys are
    /// all strings become objects (other maps become `[key, value]` arrays) and
    /// big integers become numbers when they fit in 64 bits. Non-finite
    /// floats become `null`, as `serde_json` writes them.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::NonFinite(_) => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Date(date) => serde_json::Value::String(format_date(date)),
            Value::Map(pairs) => {
                if pairs.iter().all(|(k, _)| matches!(k, Value::String(_))) {
                    serde_json::Value::Object(
                        pairs
                            .iter()
                            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.to_json())))
                            .collect(),
                    )
                } else {
                    serde_json::Value::Array(
                        pairs
                            .iter()
                            .map(|(k, v)| serde_json::Value::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
            Value::BigInt(n) => {
                if let Ok(n) = i64::try_from(*n) {
                    serde_json::Value::from(n)
                } else if let Ok(n) = u64::try_from(*n) {
                    serde_json::Value::from(n)
                } else {
                    serde_json::Value::String(n.to_string())
                }
            }
        }
    }
}

/// Renders a date the way the structured encoding stores it.
pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// == Conversions ==
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::NonFinite(n), Value::Number)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}
