//! Error types for the keyed stores
//!
//! Provides unified error handling using thiserror. Absence of a key is never
//! an error; it is reported as `None` / `false` by the adapters.

use thiserror::Error;

// == Decode Error ==
/// A stored blob carried the codec header but could not be turned back into a value.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The tag following the header is not one this codec writes
    #[error("[{store}] Unknown encoding type: {tag}")]
    UnknownTag { store: &'static str, tag: String },

    /// The Structured-JSON payload could not be parsed or restored
    #[error("[{store}] Failed to parse JSON payload: {reason}")]
    InvalidPayload { store: &'static str, reason: String },

    /// A PlainString payload was not valid UTF-8
    #[error("[{store}] Text payload is not valid UTF-8")]
    InvalidUtf8 { store: &'static str },

    /// The stored payload decoded fine but cannot be read as the requested type
    #[error("[{store}] Cannot read stored value as {expected}: {reason}")]
    TypeMismatch {
        store: &'static str,
        expected: &'static str,
        reason: String,
    },
}

// == Encode Error ==
/// A value could not be turned into a storable blob.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Serializing the value to JSON failed
    #[error("[{store}] Failed to serialize value: {source}")]
    Serialize {
        store: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The value has no MessagePack representation
    #[error("[{store}] Failed to pack value: {reason}")]
    Pack { store: &'static str, reason: String },

    /// The backing engine cannot represent this kind of payload
    #[error("[{store}] {kind} payloads are not supported by this storage")]
    UnsupportedPayload {
        store: &'static str,
        kind: &'static str,
    },
}

// == Adapter Error ==
/// Failure reported by a backing engine, propagated unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Engine could not be reached (connection loss, network error)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Engine refused the write because it ran out of space
    #[error("Storage quota exceeded: {used} of {limit} bytes in use")]
    QuotaExceeded { used: usize, limit: usize },

    /// Engine rejected the request arguments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Internal engine error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Store Error ==
/// Unified error type returned by adapters and keyed stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_store() {
        let err = DecodeError::UnknownTag {
            store: "RemoteStorage",
            tag: "7".to_string(),
        };
        assert_eq!(err.to_string(), "[RemoteStorage] Unknown encoding type: 7");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: StoreError = AdapterError::Unavailable("connection reset".into()).into();
        assert_eq!(err.to_string(), "Storage unavailable: connection reset");
        assert!(matches!(err, StoreError::Adapter(AdapterError::Unavailable(_))));
    }
}
