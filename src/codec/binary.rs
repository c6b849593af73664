//! Binary Codec
//!
//! `[BINARY_HEADER(3)] [tag(1)] [payload...]` for byte-oriented engines.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::header::{BinaryTag, BINARY_HEADER, BINARY_PREFIX_LEN};
use crate::codec::{structured, Payload, Value};
use crate::error::{DecodeError, EncodeError};

// == Encode ==
/// Encodes a payload as a tagged byte buffer.
pub fn encode(store: &'static str, payload: Payload) -> Result<Bytes, EncodeError> {
    let (tag, body) = match payload {
        Payload::Binary(bytes) => (BinaryTag::RawBinary, bytes),
        Payload::Text(text) | Payload::Structured(Value::String(text)) => {
            (BinaryTag::PlainString, Bytes::from(text))
        }
        Payload::Structured(value) => (
            BinaryTag::Structured,
            serde_json::to_vec(&structured::serialize(&value))
                .map(Bytes::from)
                .map_err(|source| EncodeError::Serialize { store, source })?,
        ),
    };

    let mut encoded = BytesMut::with_capacity(BINARY_PREFIX_LEN + body.len());
    encoded.put_slice(&BINARY_HEADER);
    encoded.put_u8(tag as u8);
    encoded.put_slice(&body);
    Ok(encoded.freeze())
}

// == Decode ==
/// Decodes a stored byte buffer.
///
/// Buffers that do not start with the header followed by a tag are returned
/// unchanged as [`Payload::Binary`].
pub fn decode(store: &'static str, data: Bytes) -> Result<Payload, DecodeError> {
    if !is_custom_format(&data) {
        return Ok(Payload::Binary(data));
    }
    let tag = data[BINARY_HEADER.len()];
    let body = data.slice(BINARY_PREFIX_LEN..);

    match BinaryTag::try_from(tag) {
        Ok(BinaryTag::RawBinary) => Ok(Payload::Binary(body)),
        Ok(BinaryTag::PlainString) => String::from_utf8(body.to_vec())
            .map(Payload::Text)
            .map_err(|_| DecodeError::InvalidUtf8 { store }),
        Ok(BinaryTag::Structured) => {
            let document: serde_json::Value =
                serde_json::from_slice(&body).map_err(|err| DecodeError::InvalidPayload {
                    store,
                    reason: err.to_string(),
                })?;
            structured::deserialize(document)
                .map(Payload::Structured)
                .map_err(|reason| DecodeError::InvalidPayload { store, reason })
        }
        Err(unknown) => Err(DecodeError::UnknownTag {
            store,
            tag: unknown.to_string(),
        }),
    }
}

fn is_custom_format(data: &[u8]) -> bool {
    data.len() >= BINARY_PREFIX_LEN && data.starts_with(&BINARY_HEADER)
}
