//! Local Adapter
//!
//! Synchronous adapter over a string-keyed, string-valued storage with the
//! shape of the Web Storage API. Every value passes through the text codec.
//! There is no expiry on this engine, so the adapter only implements
//! [`KeyValueStore`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::codec::{text, Storable};
use crate::config::Config;
use crate::error::{AdapterError, Result};
use crate::storage::{from_payload, to_payload, KeyValueStore, LOCAL_STORE};

// == Web Storage ==
/// A synchronous string store such as a browser's `localStorage`.
pub trait WebStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores a string; may fail when the storage quota is exhausted.
    fn set_item(&self, key: &str, value: String) -> std::result::Result<(), AdapterError>;

    fn remove_item(&self, key: &str);

    fn clear(&self);

    fn length(&self) -> usize;
}

// == Memory Web Storage ==
#[derive(Debug, Default)]
struct StorageState {
    items: HashMap<String, String>,
    used_bytes: usize,
}

/// In-process [`WebStorage`] with an optional byte quota over keys and values.
#[derive(Debug, Default)]
pub struct MemoryWebStorage {
    state: Mutex<StorageState>,
    quota_bytes: Option<usize>,
}

impl MemoryWebStorage {
    /// Creates an unbounded storage.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            state: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            state: Mutex::default(),
            quota_bytes: config.local_quota_bytes,
        }
    }

    /// Bytes currently occupied by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.state.lock().used_bytes
    }
}

impl WebStorage for MemoryWebStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.state.lock().items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> std::result::Result<(), AdapterError> {
        let mut state = self.state.lock();
        let replaced = state
            .items
            .get(key)
            .map_or(0, |old| key.len() + old.len());
        let used = state.used_bytes - replaced + key.len() + value.len();

        if let Some(limit) = self.quota_bytes {
            if used > limit {
                return Err(AdapterError::QuotaExceeded {
                    used: state.used_bytes,
                    limit,
                });
            }
        }

        state.items.insert(key.to_string(), value);
        state.used_bytes = used;
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        let mut state = self.state.lock();
        if let Some(old) = state.items.remove(key) {
            state.used_bytes -= key.len() + old.len();
        }
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.items.clear();
        state.used_bytes = 0;
    }

    fn length(&self) -> usize {
        self.state.lock().items.len()
    }
}

// == Local Adapter ==
/// Handle to a shared [`WebStorage`]. Clones share the same storage.
#[derive(Debug)]
pub struct LocalAdapter<S = MemoryWebStorage> {
    storage: Arc<S>,
}

impl<S> Clone for LocalAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl LocalAdapter<MemoryWebStorage> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(MemoryWebStorage::from_config(config))
    }
}

impl<S: WebStorage> LocalAdapter<S> {
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(storage))
    }

    pub fn from_shared(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// The wrapped storage, for raw access outside the codec.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Removes every item, encoded or not.
    pub fn clear(&self) {
        self.storage.clear();
    }

    pub fn len(&self) -> usize {
        self.storage.length()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: WebStorage> KeyValueStore for LocalAdapter<S> {
    fn get_item<V: Storable>(&self, key: &str) -> Result<Option<V>> {
        let Some(raw) = self.storage.get_item(key) else {
            return Ok(None);
        };
        let payload = text::decode(LOCAL_STORE, raw).map_err(|err| {
            warn!(key, error = %err, "failed to decode local value");
            err
        })?;
        from_payload(LOCAL_STORE, key, payload).map(Some)
    }

    fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.storage.get_item(key).is_some())
    }

    fn set_item<V: Storable>(&self, key: &str, value: V) -> Result<()> {
        let encoded = text::encode(LOCAL_STORE, to_payload(LOCAL_STORE, value)?)?;
        self.storage.set_item(key, encoded)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        let existed = self.storage.get_item(key).is_some();
        self.storage.remove_item(key);
        Ok(existed)
    }
}
