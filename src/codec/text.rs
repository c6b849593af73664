//! Text Codec
//!
//! `<TEXT_HEADER><tag><payload>` for engines that only store strings.

use crate::codec::header::{TextTag, TEXT_HEADER};
use crate::codec::{structured, Payload, Value};
use crate::error::{DecodeError, EncodeError};

// == Encode ==
/// Encodes a payload as a tagged string.
///
/// Raw binary payloads have no text representation and are rejected.
pub fn encode(store: &'static str, payload: Payload) -> Result<String, EncodeError> {
    let (tag, body) = match payload {
        Payload::Text(text) | Payload::Structured(Value::String(text)) => {
            (TextTag::PlainString, text)
        }
        Payload::Structured(value) => (
            TextTag::Structured,
            serde_json::to_string(&structured::serialize(&value))
                .map_err(|source| EncodeError::Serialize { store, source })?,
        ),
        Payload::Binary(_) => {
            return Err(EncodeError::UnsupportedPayload {
                store,
                kind: "binary",
            })
        }
    };

    let mut encoded = String::with_capacity(TEXT_HEADER.len() + 1 + body.len());
    encoded.push_str(TEXT_HEADER);
    encoded.push(tag.as_char());
    encoded.push_str(&body);
    Ok(encoded)
}

// == Decode ==
/// Decodes a stored string.
///
/// Strings that do not start with the header followed by a tag are returned
/// unchanged as [`Payload::Text`].
pub fn decode(store: &'static str, data: String) -> Result<Payload, DecodeError> {
    let Some(tag) = data
        .strip_prefix(TEXT_HEADER)
        .and_then(|rest| rest.chars().next())
    else {
        return Ok(Payload::Text(data));
    };
    let body = &data[TEXT_HEADER.len() + tag.len_utf8()..];

    match TextTag::try_from(tag) {
        Ok(TextTag::PlainString) => Ok(Payload::Text(body.to_string())),
        Ok(TextTag::Structured) => {
            let document: serde_json::Value =
                serde_json::from_str(body).map_err(|err| DecodeError::InvalidPayload {
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
