//! MessagePack Codec
//!
//! Untagged MessagePack for byte-oriented engines shared with other
//! MessagePack clients. There is no header: strings, byte buffers, numbers,
//! arrays and maps use the native MessagePack types. Dates travel as the
//! timestamp extension (type -1) and sets as extension `0x73` wrapping a
//! packed array.
//!
//! Maps whose keys are all strings read back as [`Value::Object`], and big
//! integers read back as numbers; both are packed the same way.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rmpv::Value as Packed;

use crate::codec::{Payload, Value};
use crate::error::{DecodeError, EncodeError};

const TIMESTAMP_EXT: i8 = -1;
const SET_EXT: i8 = 0x73;

// == Encode ==
/// Packs a payload.
///
/// Fails for big integers outside the 64-bit range, which MessagePack
/// integers cannot carry.
pub fn encode(store: &'static str, payload: Payload) -> Result<Bytes, EncodeError> {
    let packed = match payload {
        Payload::Binary(bytes) => Packed::Binary(bytes.to_vec()),
        Payload::Text(text) => Packed::from(text),
        Payload::Structured(value) => {
            pack(value).map_err(|reason| EncodeError::Pack { store, reason })?
        }
    };
    write(&packed)
        .map(Bytes::from)
        .map_err(|reason| EncodeError::Pack { store, reason })
}

fn write(packed: &Packed) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, packed).map_err(|err| err.to_string())?;
    Ok(buf)
}

fn pack(value: Value) -> Result<Packed, String> {
    Ok(match value {
        Value::Null => Packed::Nil,
        Value::Bool(b) => Packed::Boolean(b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Packed::from(i),
            (_, Some(u), _) => Packed::from(u),
            (_, _, Some(f)) => Packed::F64(f),
            _ => return Err(format!("number {n} is not representable")),
        },
        Value::NonFinite(n) => Packed::F64(n),
        Value::String(s) => Packed::from(s),
        Value::Array(items) => Packed::Array(pack_all(items)?),
        Value::Object(fields) => Packed::Map(
            fields
                .into_iter()
                .map(|(key, field)| Ok((Packed::from(key), pack(field)?)))
                .collect::<Result<_, String>>()?,
        ),
        Value::Map(pairs) => Packed::Map(
            pairs
                .into_iter()
                .map(|(key, entry)| Ok((pack(key)?, pack(entry)?)))
                .collect::<Result<_, String>>()?,
        ),
        Value::Set(items) => Packed::Ext(SET_EXT, write(&Packed::Array(pack_all(items)?))?),
        Value::Date(date) => Packed::Ext(TIMESTAMP_EXT, timestamp_bytes(&date)),
        Value::BigInt(n) => {
            if let Ok(i) = i64::try_from(n) {
                Packed::from(i)
            } else if let Ok(u) = u64::try_from(n) {
                Packed::from(u)
            } else {
                return Err(format!("bigint {n} does not fit in 64 bits"));
            }
        }
    })
}

fn pack_all(items: Vec<Value>) -> Result<Vec<Packed>, String> {
    items.into_iter().map(pack).collect()
}

// Smallest of the 32, 64 and 96 bit timestamp layouts that holds the date.
fn timestamp_bytes(date: &DateTime<Utc>) -> Vec<u8> {
    let secs = date.timestamp();
    let nanos = date.timestamp_subsec_nanos().min(999_999_999);

    if secs >> 34 == 0 {
        let packed = (u64::from(nanos) << 34) | secs as u64;
        if packed >> 32 == 0 {
            (packed as u32).to_be_bytes().to_vec()
        } else {
            packed.to_be_bytes().to_vec()
        }
    } else {
        let mut buf = nanos.to_be_bytes().to_vec();
        buf.extend_from_slice(&secs.to_be_bytes());
        buf
    }
}

// == Decode ==
/// Unpacks a stored buffer.
///
/// A top-level string decodes to [`Payload::Text`], a top-level binary to
/// [`Payload::Binary`], anything else to [`Payload::Structured`].
pub fn decode(store: &'static str, data: Bytes) -> Result<Payload, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidPayload { store, reason };

    match read(&data).map_err(invalid)? {
        Packed::Binary(bytes) => Ok(Payload::Binary(Bytes::from(bytes))),
        Packed::String(text) => text
            .into_str()
            .map(Payload::Text)
            .ok_or(DecodeError::InvalidUtf8 { store }),
        other => unpack(other).map(Payload::Structured).map_err(invalid),
    }
}

fn read(data: &[u8]) -> Result<Packed, String> {
    let mut reader = data;
    let packed = rmpv::decode::read_value(&mut reader).map_err(|err| err.to_string())?;
    if !reader.is_empty() {
        return Err(format!("{} trailing bytes after value", reader.len()));
    }
    Ok(packed)
}

fn unpack(packed: Packed) -> Result<Value, String> {
    Ok(match packed {
        Packed::Nil => Value::Null,
        Packed::Boolean(b) => Value::Bool(b),
        Packed::Integer(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .ok_or("integer out of range")?,
        Packed::F32(n) => Value::from(f64::from(n)),
        Packed::F64(n) => Value::from(n),
        Packed::String(s) => Value::String(s.into_str().ok_or("string is not valid UTF-8")?),
        Packed::Binary(_) => return Err("nested binary values are not supported".to_string()),
        Packed::Array(items) => Value::Array(unpack_all(items)?),
        Packed::Map(pairs) => unpack_map(pairs)?,
        Packed::Ext(TIMESTAMP_EXT, data) => {
            Value::Date(read_timestamp(&data).ok_or("invalid timestamp extension")?)
        }
        Packed::Ext(SET_EXT, data) => match read(&data)? {
            Packed::Array(items) => Value::Set(unpack_all(items)?),
            _ => return Err("set extension does not wrap an array".to_string()),
        },
        Packed::Ext(kind, _) => return Err(format!("unsupported extension type {kind}")),
    })
}

fn unpack_all(items: Vec<Packed>) -> Result<Vec<Value>, String> {
    items.into_iter().map(unpack).collect()
}

fn unpack_map(pairs: Vec<(Packed, Packed)>) -> Result<Value, String> {
    let string_keys = pairs
        .iter()
        .all(|(key, _)| matches!(key, Packed::String(s) if s.is_str()));

    if string_keys {
        pairs
            .into_iter()
            .map(|(key, entry)| -> Result<(String, Value), String> {
                let key = match key {
                    Packed::String(s) => s.into_str(),
                    _ => None,
                };
                Ok((key.ok_or("map key is not a string")?, unpack(entry)?))
            })
            .collect::<Result<_, _>>()
            .map(Value::Object)
    } else {
        pairs
            .into_iter()
            .map(|(key, entry)| Ok((unpack(key)?, unpack(entry)?)))
            .collect::<Result<_, String>>()
            .map(Value::Map)
    }
}

fn read_timestamp(data: &[u8]) -> Option<DateTime<Utc>> {
    let (secs, nanos) = match data.len() {
        4 => (i64::from(u32::from_be_bytes(data.try_into().ok()?)), 0),
        8 => {
            let packed = u64::from_be_bytes(data.try_into().ok()?);
            ((packed & 0x3_FFFF_FFFF) as i64, (packed >> 34) as u32)
        }
        12 => (
            i64::from_be_bytes(data[4..].try_into().ok()?),
            u32::from_be_bytes(data[..4].try_into().ok()?),
        ),
        _ => return None,
    };
    DateTime::from_timestamp(secs, nanos)
}
