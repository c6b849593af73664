//! Configuration Module
//!
//! Handles loading the tunables of the in-process engines from environment variables.

use std::env;
use std::str::FromStr;

/// Tunables for the memory cache, the local string storage and the cleanup task.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the memory cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for memory entries set without one, None = never expire
    pub default_ttl: Option<u64>,
    /// Longest key, in bytes, the memory cache accepts
    pub max_key_length: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Byte quota of the local string storage, None = unlimited
    pub local_quota_bytes: Option<usize>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `KEYED_CACHE_MAX_ENTRIES` - Maximum memory entries (default: 1000)
    /// - `KEYED_CACHE_DEFAULT_TTL` - Default TTL in seconds, 0 disables (default: 0)
    /// - `KEYED_CACHE_MAX_KEY_LENGTH` - Maximum key length in bytes (default: 256)
    /// - `KEYED_CACHE_CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `KEYED_CACHE_LOCAL_QUOTA` - Local storage quota in bytes, 0 disables (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("KEYED_CACHE_MAX_ENTRIES", defaults.max_entries),
            default_ttl: match env_or("KEYED_CACHE_DEFAULT_TTL", 0u64) {
                0 => None,
                ttl => Some(ttl),
            },
            max_key_length: env_or("KEYED_CACHE_MAX_KEY_LENGTH", defaults.max_key_length),
            cleanup_interval: env_or("KEYED_CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval),
            local_quota_bytes: match env::var("KEYED_CACHE_LOCAL_QUOTA")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
            {
                Some(0) => None,
                Some(quota) => Some(quota),
                None => defaults.local_quota_bytes,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: None,
            max_key_length: 256,
            cleanup_interval: 1,
            local_quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
