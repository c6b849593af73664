//! Codec Module
//!
//! Maps application values to a closed set of payload variants and encodes
//! those payloads for string-oriented and byte-oriented engines.

pub mod binary;
pub mod header;
pub mod msgpack;
pub mod structured;
pub mod text;
mod value;

#[cfg(test)]
mod property_tests;

use std::ops::Deref;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

pub use value::Value;

// == Payload ==
/// The encode step's output: exactly one of the supported representations.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes, stored unchanged (byte-oriented engines only)
    Binary(Bytes),
    /// A string, stored without JSON quoting
    Text(String),
    /// Anything else, stored as Structured-JSON
    Structured(Value),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Binary(_) => "binary",
            Payload::Text(_) => "string",
            Payload::Structured(value) => value.kind(),
        }
    }
}

// == Payload Mismatch ==
/// A payload could not be read as the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadMismatch {
    pub expected: &'static str,
    pub reason: String,
}

impl PayloadMismatch {
    fn unexpected(expected: &'static str, found: &Payload) -> Self {
        Self {
            expected,
            reason: format!("found {}", found.kind()),
        }
    }
}

// == Storable ==
/// A type that can be written to and read back from any adapter.
pub trait Storable: Sized + Send {
    /// Converts the value into its payload variant.
    fn into_payload(self) -> Result<Payload, serde_json::Error>;

    /// Reads the value back from a decoded payload.
    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch>;
}

impl Storable for Payload {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(self)
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        Ok(payload)
    }
}

impl Storable for String {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Text(self))
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Text(text) | Payload::Structured(Value::String(text)) => Ok(text),
            Payload::Binary(bytes) => String::from_utf8(bytes.to_vec()).map_err(|err| PayloadMismatch {
                expected: "String",
                reason: err.to_string(),
            }),
            other => Err(PayloadMismatch::unexpected("String", &other)),
        }
    }
}

impl Storable for Bytes {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Binary(self))
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Binary(bytes) => Ok(bytes),
            Payload::Text(text) => Ok(Bytes::from(text)),
            other => Err(PayloadMismatch::unexpected("Bytes", &other)),
        }
    }
}

impl Storable for Value {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(match self {
            Value::String(text) => Payload::Text(text),
            value => Payload::Structured(value),
        })
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Structured(value) => Ok(value),
            Payload::Text(text) => Ok(Value::String(text)),
            Payload::Binary(bytes) => String::from_utf8(bytes.to_vec())
                .map(Value::String)
                .map_err(|err| PayloadMismatch {
                    expected: "Value",
                    reason: err.to_string(),
                }),
        }
    }
}

impl Storable for DateTime<Utc> {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Structured(Value::Date(self)))
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Structured(Value::Date(date)) => Ok(date),
            Payload::Text(text) | Payload::Structured(Value::String(text)) => {
                DateTime::parse_from_rfc3339(&text)
                    .map(|date| date.with_timezone(&Utc))
                    .map_err(|err| PayloadMismatch {
                        expected: "DateTime",
                        reason: err.to_string(),
                    })
            }
            other => Err(PayloadMismatch::unexpected("DateTime", &other)),
        }
    }
}

impl Storable for bool {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Structured(Value::Bool(self)))
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Structured(Value::Bool(b)) => Ok(b),
            other => Err(PayloadMismatch::unexpected("bool", &other)),
        }
    }
}

macro_rules! impl_storable_number {
    ($ty:ty, $name:literal, $as:ident) => {
        impl Storable for $ty {
            fn into_payload(self) -> Result<Payload, serde_json::Error> {
                Ok(Payload::Structured(Value::from(self)))
            }

            fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
                match payload {
                    Payload::Structured(Value::Number(n)) => n.$as().ok_or_else(|| PayloadMismatch {
                        expected: $name,
                        reason: format!("{n} is out of range"),
                    }),
                    other => Err(PayloadMismatch::unexpected($name, &other)),
                }
            }
        }
    };
}

impl_storable_number!(i64, "i64", as_i64);
impl_storable_number!(u64, "u64", as_u64);

impl Storable for f64 {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Structured(Value::from(self)))
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        match payload {
            Payload::Structured(Value::NonFinite(n)) => Ok(n),
            Payload::Structured(Value::Number(n)) => n.as_f64().ok_or_else(|| PayloadMismatch {
                expected: "f64",
                reason: format!("{n} is out of range"),
            }),
            other => Err(PayloadMismatch::unexpected("f64", &other)),
        }
    }
}

// == Json Wrapper ==
/// Stores any serde type as Structured-JSON.
///
/// Rich types are only as rich as the type's serde impl: a `DateTime` field
/// round-trips because its `Deserialize` parses the stored string back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Storable for Json<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        serde_json::to_value(&self.0).and_then(|json| Value::from(json).into_payload())
    }

    fn from_payload(payload: Payload) -> Result<Self, PayloadMismatch> {
        let mismatch = |err: serde_json::Error| PayloadMismatch {
            expected: std::any::type_name::<T>(),
            reason: err.to_string(),
        };
        let inner = match payload {
            Payload::Structured(value) => serde_json::from_value(value.to_json()).map_err(mismatch)?,
            // Foreign text is tried as a JSON string first, then as a JSON document.
            Payload::Text(text) => serde_json::from_value(serde_json::Value::String(text.clone()))
                .or_else(|_| serde_json::from_str(&text))
                .map_err(mismatch)?,
            Payload::Binary(bytes) => serde_json::from_slice(&bytes).map_err(mismatch)?,
        };
        Ok(Json(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        name: String,
        joined: DateTime<Utc>,
    }

    #[test]
    fn test_string_payload_is_text() {
        assert_eq!(
            "hi".to_string().into_payload().unwrap(),
            Payload::Text("hi".into())
        );
        assert_eq!(
            Value::from("hi").into_payload().unwrap(),
            Payload::Text("hi".into())
        );
    }

    #[test]
    fn test_non_strings_are_structured() {
        assert!(matches!(42i64.into_payload().unwrap(), Payload::Structured(_)));
        assert!(matches!(true.into_payload().unwrap(), Payload::Structured(_)));
        assert!(matches!(
            Json(vec![1, 2]).into_payload().unwrap(),
            Payload::Structured(_)
        ));
        assert!(matches!(
            Bytes::from_static(b"x").into_payload().unwrap(),
            Payload::Binary(_)
        ));
    }

    #[test]
    fn test_json_struct_roundtrip() {
        let user = User {
            id: 1,
            name: "Alice".into(),
            joined: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let payload = Json(user.clone()).into_payload().unwrap();
        let restored = Json::<User>::from_payload(payload).unwrap();
        assert_eq!(restored.into_inner(), user);
    }

    #[test]
    fn test_json_reads_legacy_text() {
        let restored = Json::<Vec<u32>>::from_payload(Payload::Text("[1,2,3]".into())).unwrap();
        assert_eq!(*restored, vec![1, 2, 3]);

        let restored = Json::<String>::from_payload(Payload::Text("[1,2,3]".into())).unwrap();
        assert_eq!(*restored, "[1,2,3]");
    }

    #[test]
    fn test_mismatch_is_reported() {
        let err = i64::from_payload(Payload::Text("12".into())).unwrap_err();
        assert_eq!(err.expected, "i64");
        assert_eq!(err.reason, "found string");

        let err = bool::from_payload(Payload::Structured(Value::Null)).unwrap_err();
        assert_eq!(err.reason, "found null");
    }

    #[test]
    fn test_non_finite_f64_roundtrip() {
        for n in [f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(f64::from_payload(n.into_payload().unwrap()).unwrap(), n);
        }
        assert!(f64::from_payload(f64::NAN.into_payload().unwrap()).unwrap().is_nan());
        assert_eq!(f64::from_payload(0.25f64.into_payload().unwrap()).unwrap(), 0.25);
    }

    #[test]
    fn test_json_string_is_text() {
        assert_eq!(
            Json("hello".to_string()).into_payload().unwrap(),
            Payload::Text("hello".into())
        );
        let restored = Json::<String>::from_payload(Payload::Text("hello".into())).unwrap();
        assert_eq!(restored.into_inner(), "hello");
    }

    #[test]
    fn test_date_from_legacy_text() {
        let date = DateTime::<Utc>::from_payload(Payload::Text("2024-01-01T00:00:00Z".into())).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }
}
