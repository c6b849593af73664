//! Storage Module
//!
//! Capability traits shared by every adapter, and the adapters that
//! implement them over an in-process cache, a string-only local storage and
//! an asynchronous remote engine (tagged binary or MessagePack values).
//!
//! Capabilities are split so that expiry is only reachable on adapters that
//! support it:
//! - [`KeyValueStore`] / [`ExpiringStore`] for synchronous engines
//! - [`AsyncKeyValueStore`] / [`AsyncExpiringStore`] for networked engines

mod local;
mod memory;
mod msgpack;
mod remote;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::codec::{Payload, Storable};
use crate::error::{DecodeError, EncodeError, Result};

pub use local::{LocalAdapter, MemoryWebStorage, WebStorage};
pub use memory::MemoryAdapter;
pub use msgpack::MsgpackAdapter;
pub use remote::{LoopbackEngine, RemoteAdapter, RemoteEngine};

// == Store Names ==
/// Names used to label codec errors per adapter.
pub const MEMORY_STORE: &str = "MemoryStorage";
pub const LOCAL_STORE: &str = "LocalStorage";
pub const REMOTE_STORE: &str = "RemoteStorage";
pub const MSGPACK_STORE: &str = "MsgpackStorage";

// == TTL Status ==
/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// Key does not exist or has already expired
    Missing,
    /// Key exists and never expires
    Persistent,
    /// Key expires after the given duration
    Expires(Duration),
}

impl TtlStatus {
    /// Redis-style seconds: `-2` missing, `-1` no expiry, otherwise the
    /// remaining time rounded to the nearest second.
    pub fn as_seconds(&self) -> i64 {
        match self {
            TtlStatus::Missing => -2,
            TtlStatus::Persistent => -1,
            TtlStatus::Expires(remaining) => {
                ((remaining.as_millis() + 500) / 1000).min(i64::MAX as u128) as i64
            }
        }
    }

    /// Interprets a Redis `TTL` reply.
    pub fn from_seconds(seconds: i64) -> Self {
        match seconds {
            -1 => TtlStatus::Persistent,
            s if s < 0 => TtlStatus::Missing,
            s => TtlStatus::Expires(Duration::from_secs(s as u64)),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self {
            TtlStatus::Expires(remaining) => Some(*remaining),
            _ => None,
        }
    }
}

// == Synchronous Capabilities ==
/// Base capability: read, write, check and delete single keys.
pub trait KeyValueStore {
    /// Fetches and decodes a value; `None` if the key is absent.
    fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>>;

    /// Checks for the key without decoding its value.
    fn has_item(&self, key: &str) -> Result<bool>;

    /// Encodes and stores a value, overwriting any previous one.
    fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()>;

    /// Deletes the key; returns whether something was removed.
    fn remove_item(&self, key: &str) -> Result<bool>;
}

/// Optional capability: per-key expiry.
pub trait ExpiringStore: KeyValueStore {
    fn get_item_ttl(&self, key: &str) -> Result<TtlStatus>;

    /// Stores a value that stops being retrievable after `ttl_seconds`.
    fn set_item_with_ttl<V: Storable>(&self, key: &str, ttl_seconds: u64, value: V) -> Result<()>;
}

// == Asynchronous Capabilities ==
/// Base capability of networked engines; every call is a suspension point.
#[async_trait]
pub trait AsyncKeyValueStore: Send + Sync {
    async fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>>;

    async fn has_item(&self, key: &str) -> Result<bool>;

    async fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<bool>;
}

/// Optional expiry capability of networked engines.
#[async_trait]
pub trait AsyncExpiringStore: AsyncKeyValueStore {
    async fn get_item_ttl(&self, key: &str) -> Result<TtlStatus>;

    async fn set_item_with_ttl<V: Storable>(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: V,
    ) -> Result<()>;
}

// == Expiry Purge ==
/// Engines that can drop expired entries eagerly, driven by the cleanup task.
pub trait ExpiryPurge: Send + Sync {
    /// Removes expired entries and returns how many were dropped.
    fn purge_expired(&self) -> usize;
}

// == Payload Helpers ==
/// Converts a value into its payload, labelling serialization failures.
pub(crate) fn to_payload<V: Storable>(store: &'static str, value: V) -> Result<Payload> {
    value
        .into_payload()
        .map_err(|source| EncodeError::Serialize { store, source }.into())
}

/// Reads a decoded payload as `V`, labelling type mismatches.
pub(crate) fn from_payload<V: Storable>(store: &'static str, key: &str, payload: Payload) -> Result<V> {
    V::from_payload(payload).map_err(|mismatch| {
        warn!(store, key, reason = %mismatch.reason, "stored value has unexpected type");
        DecodeError::TypeMismatch {
            store,
            expected: mismatch.expected,
            reason: mismatch.reason,
        }
        .into()
    })
}
