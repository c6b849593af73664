//! MessagePack Adapter
//!
//! Asynchronous adapter over the same [`RemoteEngine`] as [`RemoteAdapter`],
//! storing values as plain MessagePack instead of the tagged binary format.
//! Use it when other MessagePack clients read or write the same keys.
//!
//! [`RemoteAdapter`]: crate::storage::RemoteAdapter

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::codec::{msgpack, Storable};
use crate::error::Result;
use crate::storage::{
    from_payload, to_payload, AsyncExpiringStore, AsyncKeyValueStore, RemoteEngine, TtlStatus,
    MSGPACK_STORE,
};

// == Msgpack Adapter ==
/// Handle to a shared remote engine whose values are MessagePack documents.
#[derive(Debug)]
pub struct MsgpackAdapter<E> {
    engine: Arc<E>,
}

impl<E> Clone for MsgpackAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: RemoteEngine> MsgpackAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self::from_shared(Arc::new(engine))
    }

    pub fn from_shared(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[async_trait]
impl<E: RemoteEngine> AsyncKeyValueStore for MsgpackAdapter<E> {
    async fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>> {
        let Some(raw) = self.engine.get_buffer(key).await? else {
            return Ok(None);
        };
        let payload = msgpack::decode(MSGPACK_STORE, raw).map_err(|err| {
            warn!(key, error = %err, "failed to unpack remote value");
            err
        })?;
        from_payload(MSGPACK_STORE, key, payload).map(Some)
    }

    async fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.engine.exists(key).await?)
    }

    async fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()> {
        let packed = msgpack::encode(MSGPACK_STORE, to_payload(MSGPACK_STORE, value)?)?;
        self.engine.set_buffer(key, packed).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        Ok(self.engine.delete(key).await? == 1)
    }
}

#[async_trait]
impl<E: RemoteEngine> AsyncExpiringStore for MsgpackAdapter<E> {
    async fn get_item_ttl(&self, key: &str) -> Result<TtlStatus> {
        Ok(TtlStatus::from_seconds(self.engine.ttl(key).await?))
    }

    async fn set_item_with_ttl<V: Storable>(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: V,
    ) -> Result<()> {
        let packed = msgpack::encode(MSGPACK_STORE, to_payload(MSGPACK_STORE, value)?)?;
        debug!(key, ttl_seconds, "writing expiring msgpack value");
        self.engine.set_buffer_ex(key, ttl_seconds, packed).await?;
        Ok(())
    }
}
