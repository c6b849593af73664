//! Cache Module
//!
//! In-process bounded engine with TTL expiration and LRU eviction, wrapped by
//! the memory adapter and the loopback remote engine.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::MemoryCache;

// == Public Constants ==
/// Default maximum key length in bytes
pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;
