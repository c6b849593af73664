//! LRU Tracker Module
//!
//! Least Recently Used ordering for cache eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a fresh tick; the smallest tick is the
/// least recently used key. Touch, remove and evict are all `O(log n)`.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Monotonic access counter
    tick: u64,
    /// Last access tick per key
    ticks: HashMap<String, u64>,
    /// Keys ordered by last access, oldest first
    order: BTreeMap<u64, String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if new.
    pub fn touch(&mut self, key: &str) {
        self.tick += 1;
        match self.ticks.get_mut(key) {
            Some(tick) => {
                if let Some(owned) = self.order.remove(tick) {
                    self.order.insert(self.tick, owned);
                }
                *tick = self.tick;
            }
            None => {
                self.ticks.insert(key.to_string(), self.tick);
                self.order.insert(self.tick, key.to_string());
            }
        }
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Least recently used key, without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first_key_value().map(|(_, key)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(keys: &[&str]) -> LruTracker {
        let mut lru = LruTracker::new();
        for key in keys {
            lru.touch(key);
        }
        lru
    }

    #[test]
    fn test_lru_insertion_order() {
        let mut lru = tracker(&["a", "b", "c"]);

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("a"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("a"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("b"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("c"));
        assert_eq!(lru.evict_oldest(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_touch_refreshes_key() {
        // a, b, c then a, c, b: final order oldest first is a, c, b
        let mut lru = tracker(&["a", "b", "c", "a", "c", "b"]);

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.evict_oldest().as_deref(), Some("a"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("c"));
        assert_eq!(lru.evict_oldest().as_deref(), Some("b"));
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = tracker(&["key1", "key2", "key3"]);

        lru.remove("key1");
        lru.remove("missing");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key1"));
        assert_eq!(lru.peek_oldest(), Some("key2"));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = tracker(&["x", "y"]);
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }
}
