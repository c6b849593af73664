//! Memory Cache Module
//!
//! Bounded in-process engine combining HashMap storage with LRU eviction and
//! TTL expiration. Values are held by value; nothing is serialized.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheStats, LruTracker, DEFAULT_MAX_KEY_LENGTH};
use crate::config::Config;
use crate::error::AdapterError;
use crate::storage::TtlStatus;

// == Memory Cache ==
/// Bounded key-value cache with LRU eviction and per-entry TTL.
#[derive(Debug)]
pub struct MemoryCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Usage counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL applied to entries written without one, None = never expire
    default_ttl: Option<Duration>,
    /// Longest accepted key in bytes
    max_key_length: usize,
}

impl<V> MemoryCache<V> {
    // == Constructor ==
    /// Creates a new MemoryCache with the given capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL in seconds for entries written without one
    pub fn new(max_entries: usize, default_ttl: Option<u64>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl: default_ttl.map(Duration::from_secs),
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }

    /// Creates a MemoryCache sized by the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_entries, config.default_ttl).with_max_key_length(config.max_key_length)
    }

    pub fn with_max_key_length(mut self, max_key_length: usize) -> Self {
        self.max_key_length = max_key_length;
        self
    }

    // == Set ==
    /// Stores a value, overwriting any previous one and resetting its TTL.
    ///
    /// If the cache is at capacity, the least recently used entry is evicted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in seconds (uses the default TTL if None)
    pub fn set(&mut self, key: String, value: V, ttl: Option<u64>) -> Result<(), AdapterError> {
        if key.len() > self.max_key_length {
            return Err(AdapterError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                self.max_key_length
            )));
        }
        if ttl == Some(0) {
            return Err(AdapterError::InvalidRequest(
                "TTL must be at least one second".to_string(),
            ));
        }

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted_key) => {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(AdapterError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let effective_ttl = ttl.map(Duration::from_secs).or(self.default_ttl);
        self.entries
            .insert(key.clone(), CacheEntry::new(value, effective_ttl));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Contains ==
    /// Checks for a live entry without touching recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Remove ==
    /// Removes an entry. Returns true if a live entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        self.lru.remove(key);
        self.stats.set_total_entries(self.entries.len());
        !entry.is_expired()
    }

    // == TTL ==
    /// Reports the remaining lifetime of an entry.
    pub fn ttl(&self, key: &str) -> TtlStatus {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => match entry.ttl_remaining() {
                Some(remaining) => TtlStatus::Expires(remaining),
                None => TtlStatus::Persistent,
            },
            _ => TtlStatus::Missing,
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns a snapshot of the usage counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }
}

impl<V: Clone> MemoryCache<V> {
    // == Get ==
    /// Returns a copy of a live value and marks it most recently used.
    ///
    /// Expired entries are removed on access and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let value = entry.value.clone();
        self.stats.record_hit();
        self.lru.touch(key);
        Some(value)
    }
}
