//! Memory Adapter
//!
//! Synchronous adapter over the bounded [`MemoryCache`]. Payloads are held by
//! value, so no codec runs and no header is written.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{CacheStats, MemoryCache};
use crate::codec::{Payload, Storable};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{
    from_payload, to_payload, ExpiringStore, ExpiryPurge, KeyValueStore, TtlStatus, MEMORY_STORE,
};

// == Memory Adapter ==
/// Handle to a shared in-process cache. Clones share the same cache.
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    cache: Arc<Mutex<MemoryCache<Payload>>>,
}

impl MemoryAdapter {
    /// Creates an adapter over a fresh cache.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity before LRU eviction kicks in
    /// * `default_ttl` - TTL in seconds for entries written with `set_item`
    pub fn new(max_entries: usize, default_ttl: Option<u64>) -> Self {
        Self::from_cache(MemoryCache::new(max_entries, default_ttl))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_cache(MemoryCache::from_config(config))
    }

    pub fn from_cache(cache: MemoryCache<Payload>) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    fn store<V: Storable>(&self, key: &str, ttl: Option<u64>, value: V) -> Result<()> {
        let payload = to_payload(MEMORY_STORE, value)?;
        self.cache.lock().set(key.to_string(), payload, ttl)?;
        Ok(())
    }
}

impl KeyValueStore for MemoryAdapter {
    fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>> {
        let Some(payload) = self.cache.lock().get(key) else {
            return Ok(None);
        };
        from_payload(MEMORY_STORE, key, payload).map(Some)
    }

    fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.cache.lock().contains(key))
    }

    fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()> {
        self.store(key, None, value)
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        Ok(self.cache.lock().remove(key))
    }
}

impl ExpiringStore for MemoryAdapter {
    fn get_item_ttl(&self, key: &str) -> Result<TtlStatus> {
        Ok(self.cache.lock().ttl(key))
    }

    fn set_item_with_ttl<V: Storable>(&self, key: &str, ttl_seconds: u64, value: V) -> Result<()> {
        self.store(key, Some(ttl_seconds), value)
    }
}

impl ExpiryPurge for MemoryAdapter {
    fn purge_expired(&self) -> usize {
        self.cache.lock().purge_expired()
    }
}
