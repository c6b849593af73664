//! Remote Adapter
//!
//! Asynchronous adapter over a Redis-like engine that stores byte buffers.
//! Every value passes through the binary codec. Engine failures propagate
//! unchanged; nothing is retried here.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::MemoryCache;
use crate::codec::{binary, Storable};
use crate::config::Config;
use crate::error::{AdapterError, Result};
use crate::storage::{
    from_payload, to_payload, AsyncExpiringStore, AsyncKeyValueStore, ExpiryPurge, TtlStatus,
    REMOTE_STORE,
};

// == Remote Engine ==
/// The transport-level surface of a remote key-value service.
#[async_trait]
pub trait RemoteEngine: Send + Sync {
    async fn get_buffer(&self, key: &str) -> std::result::Result<Option<Bytes>, AdapterError>;

    async fn set_buffer(&self, key: &str, value: Bytes) -> std::result::Result<(), AdapterError>;

    /// Stores a buffer that expires after `ttl_seconds` (Redis `SETEX`).
    async fn set_buffer_ex(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: Bytes,
    ) -> std::result::Result<(), AdapterError>;

    /// Deletes a key, returning the number of keys removed.
    async fn delete(&self, key: &str) -> std::result::Result<u64, AdapterError>;

    async fn exists(&self, key: &str) -> std::result::Result<bool, AdapterError>;

    /// Redis `TTL` reply: `-2` missing, `-1` no expiry, otherwise seconds left.
    async fn ttl(&self, key: &str) -> std::result::Result<i64, AdapterError>;
}

// == Remote Adapter ==
/// Handle to a shared remote engine connection. Clones share the engine.
#[derive(Debug)]
pub struct RemoteAdapter<E> {
    engine: Arc<E>,
}

impl<E> Clone for RemoteAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: RemoteEngine> RemoteAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self::from_shared(Arc::new(engine))
    }

    pub fn from_shared(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// The underlying engine, for commands this adapter does not wrap.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[async_trait]
impl<E: RemoteEngine> AsyncKeyValueStore for RemoteAdapter<E> {
    async fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>> {
        let Some(raw) = self.engine.get_buffer(key).await? else {
            return Ok(None);
        };
        let payload = binary::decode(REMOTE_STORE, raw).map_err(|err| {
            warn!(key, error = %err, "failed to decode remote value");
            err
        })?;
        from_payload(REMOTE_STORE, key, payload).map(Some)
    }

    async fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.engine.exists(key).await?)
    }

    async fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()> {
        let encoded = binary::encode(REMOTE_STORE, to_payload(REMOTE_STORE, value)?)?;
        self.engine.set_buffer(key, encoded).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        Ok(self.engine.delete(key).await? == 1)
    }
}

#[async_trait]
impl<E: RemoteEngine> AsyncExpiringStore for RemoteAdapter<E> {
    async fn get_item_ttl(&self, key: &str) -> Result<TtlStatus> {
        Ok(TtlStatus::from_seconds(self.engine.ttl(key).await?))
    }

    async fn set_item_with_ttl<V: Storable>(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: V,
    ) -> Result<()> {
        let encoded = binary::encode(REMOTE_STORE, to_payload(REMOTE_STORE, value)?)?;
        debug!(key, ttl_seconds, "writing expiring remote value");
        self.engine.set_buffer_ex(key, ttl_seconds, encoded).await?;
        Ok(())
    }
}

// == Loopback Engine ==
/// In-process [`RemoteEngine`] backed by a [`MemoryCache`] of byte buffers.
///
/// Follows Redis reply conventions, so it can stand in for a real server in
/// tests and single-process deployments.
#[derive(Debug)]
pub struct LoopbackEngine {
    cache: Mutex<MemoryCache<Bytes>>,
}

impl LoopbackEngine {
    /// Creates an engine holding up to `max_entries` keys, none expiring by default.
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Mutex::new(MemoryCache::new(max_entries, None)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            cache: Mutex::new(MemoryCache::from_config(config)),
        }
    }
}

#[async_trait]
impl RemoteEngine for LoopbackEngine {
    async fn get_buffer(&self, key: &str) -> std::result::Result<Option<Bytes>, AdapterError> {
        Ok(self.cache.lock().get(key))
    }

    async fn set_buffer(&self, key: &str, value: Bytes) -> std::result::Result<(), AdapterError> {
        self.cache.lock().set(key.to_string(), value, None)
    }

    async fn set_buffer_ex(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: Bytes,
    ) -> std::result::Result<(), AdapterError> {
        if ttl_seconds == 0 {
            return Err(AdapterError::InvalidRequest(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        self.cache
            .lock()
            .set(key.to_string(), value, Some(ttl_seconds))
    }

    async fn delete(&self, key: &str) -> std::result::Result<u64, AdapterError> {
        Ok(u64::from(self.cache.lock().remove(key)))
    }

    async fn exists(&self, key: &str) -> std::result::Result<bool, AdapterError> {
        Ok(self.cache.lock().contains(key))
    }

    async fn ttl(&self, key: &str) -> std::result::Result<i64, AdapterError> {
        Ok(self.cache.lock().ttl(key).as_seconds())
    }
}

impl ExpiryPurge for LoopbackEngine {
    fn purge_expired(&self) -> usize {
        self.cache.lock().purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::header::BINARY_HEADER;
    use crate::codec::Value;
    use crate::error::{DecodeError, StoreError};
    use std::time::Duration;

    fn adapter() -> RemoteAdapter<LoopbackEngine> {
        RemoteAdapter::new(LoopbackEngine::new(100))
    }

    #[tokio::test]
    async fn test_bytes_and_strings_roundtrip() {
        let adapter = adapter();
        adapter.set_item("raw", Bytes::from_static(&[0, 1, 2])).await.unwrap();
        adapter.set_item("text", "hello".to_string()).await.unwrap();

        assert_eq!(
            adapter.get_item::<Bytes>("raw").await.unwrap(),
            Some(Bytes::from_static(&[0, 1, 2]))
        );
        assert_eq!(
            adapter.get_item::<String>("text").await.unwrap().as_deref(),
            Some("hello")
        );

        let stored = adapter.engine().get_buffer("text").await.unwrap().unwrap();
        assert_eq!(&stored[..3], &BINARY_HEADER);
    }

    #[tokio::test]
    async fn test_legacy_buffer_passthrough() {
        let adapter = adapter();
        adapter
            .engine()
            .set_buffer("legacy", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(
            adapter.get_item::<Bytes>("legacy").await.unwrap(),
            Some(Bytes::from_static(b"hello"))
        );
        assert_eq!(
            adapter.get_item::<String>("legacy").await.unwrap().as_deref(),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn test_unknown_tag_is_fatal() {
        let adapter = adapter();
        adapter
            .engine()
            .set_buffer("bad", Bytes::from_static(&[0xE2, 0x81, 0xA0, 42]))
            .await
            .unwrap();

        assert!(matches!(
            adapter.get_item::<Value>("bad").await,
            Err(StoreError::Decode(DecodeError::UnknownTag { store: REMOTE_STORE, .. }))
        ));
        assert!(adapter.has_item("bad").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_and_ttl() {
        let adapter = adapter();
        adapter.set_item_with_ttl("k", 30, 7i64).await.unwrap();
        adapter.set_item("p", 8i64).await.unwrap();

        let ttl = adapter.get_item_ttl("k").await.unwrap();
        assert!(ttl.remaining().is_some_and(|d| d <= Duration::from_secs(30)));
        assert_eq!(adapter.get_item_ttl("p").await.unwrap(), TtlStatus::Persistent);
        assert_eq!(adapter.get_item_ttl("none").await.unwrap(), TtlStatus::Missing);

        assert!(adapter.remove_item("k").await.unwrap());
        assert!(!adapter.remove_item("k").await.unwrap());
        assert_eq!(adapter.get_item::<i64>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected() {
        let err = adapter()
            .set_item_with_ttl("k", 0, true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Adapter(AdapterError::InvalidRequest(_))));
    }
}
