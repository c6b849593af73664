//! Keyed store over a synchronous adapter.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::Storable;
use crate::error::Result;
use crate::storage::{ExpiringStore, KeyValueStore, TtlStatus};

// == Factory ==
/// Binds an adapter and a value type; call [`with_key`](Self::with_key) to
/// choose the key derivation.
pub struct KeyedStoreFactory<S, V> {
    adapter: S,
    _value: PhantomData<fn() -> V>,
}

/// Starts a keyed store over a synchronous adapter.
///
/// ```
/// use keyed_cache::{keyed_store, Json, MemoryAdapter};
///
/// let adapter = MemoryAdapter::new(100, None);
/// let users = keyed_store::<Json<Vec<String>>, _>(adapter).with_key(|id: u32| format!("user:{id}"));
///
/// users.set_item(Json(vec!["admin".into()]), 7).unwrap();
/// assert_eq!(users.resolve_key(7), "user:7");
/// assert!(users.has_item(7).unwrap());
/// ```
pub fn keyed_store<V, S>(adapter: S) -> KeyedStoreFactory<S, V> {
    KeyedStoreFactory {
        adapter,
        _value: PhantomData,
    }
}

impl<S: Clone, V> KeyedStoreFactory<S, V> {
    /// Produces a store whose every operation addresses `key_fn(args)`.
    pub fn with_key<A, F>(&self, key_fn: F) -> KeyedStore<S, V, A, F>
    where
        F: Fn(A) -> String,
    {
        KeyedStore {
            adapter: self.adapter.clone(),
            key_fn,
            _marker: PhantomData,
        }
    }
}

// == Keyed Store ==
/// A typed view of one adapter, addressed through one key function.
///
/// Holds no data. `A` is the argument tuple shared by every operation, so a
/// `get_item(args)` always reads the key the matching `set_item(value, args)`
/// wrote.
pub struct KeyedStore<S, V, A, F> {
    adapter: S,
    key_fn: F,
    _marker: PhantomData<fn(A) -> V>,
}

impl<S, V, A, F> KeyedStore<S, V, A, F>
where
    F: Fn(A) -> String,
{
    /// Derives the storage key without touching storage.
    pub fn resolve_key(&self, args: A) -> String {
        (self.key_fn)(args)
    }

    pub fn adapter(&self) -> &S {
        &self.adapter
    }
}

impl<S, V, A, F> KeyedStore<S, V, A, F>
where
    S: KeyValueStore,
    V: Storable,
    F: Fn(A) -> String,
{
    /// Returns the stored value, or `None` if nothing is stored under the key.
    pub fn get_item(&self, args: A) -> Result<Option<V>> {
        self.adapter.get_item(&self.resolve_key(args))
    }

    pub fn has_item(&self, args: A) -> Result<bool> {
        self.adapter.has_item(&self.resolve_key(args))
    }

    pub fn set_item(&self, value: V, args: A) -> Result<()> {
        self.adapter.set_item(&self.resolve_key(args), value)
    }

    /// Returns whether something was removed.
    pub fn remove_item(&self, args: A) -> Result<bool> {
        self.adapter.remove_item(&self.resolve_key(args))
    }
}

impl<S, V, A, F> KeyedStore<S, V, A, F>
where
    S: ExpiringStore,
    V: Storable,
    F: Fn(A) -> String,
{
    pub fn get_item_ttl(&self, args: A) -> Result<TtlStatus> {
        self.adapter.get_item_ttl(&self.resolve_key(args))
    }

    pub fn set_item_with_ttl(&self, ttl_seconds: u64, value: V, args: A) -> Result<()> {
        self.adapter
            .set_item_with_ttl(&self.resolve_key(args), ttl_seconds, value)
    }
}

impl<S: fmt::Debug, V, A, F> fmt::Debug for KeyedStore<S, V, A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedStore")
            .field("adapter", &self.adapter)
            .field("value", &std::any::type_name::<V>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Json;
    use crate::storage::{LocalAdapter, MemoryAdapter, MemoryWebStorage};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    fn user(id: u32, name: &str) -> Json<User> {
        Json(User {
            id,
            name: name.to_string(),
        })
    }

    #[test]
    fn test_set_get_remove() {
        let users = keyed_store::<Json<User>, _>(MemoryAdapter::new(100, None))
            .with_key(|id: u32| format!("user:{id}"));

        users.set_item(user(1, "Alice"), 1).unwrap();
        assert_eq!(users.get_item(1).unwrap(), Some(user(1, "Alice")));
        assert_eq!(users.get_item(999).unwrap(), None);

        assert!(users.remove_item(1).unwrap());
        assert_eq!(users.get_item(1).unwrap(), None);
        assert!(!users.has_item(1).unwrap());
    }

    #[test]
    fn test_resolve_key_matches_storage_key() {
        let adapter = MemoryAdapter::new(100, None);
        let sessions = keyed_store::<String, _>(adapter.clone())
            .with_key(|(org, id): (&'static str, u64)| format!("session:{org}:{id}"));

        assert_eq!(sessions.resolve_key(("acme", 5)), "session:acme:5");
        sessions.set_item("token".into(), ("acme", 5)).unwrap();
        assert_eq!(
            adapter.get_item::<String>("session:acme:5").unwrap().as_deref(),
            Some("token")
        );
    }

    #[test]
    fn test_ttl_methods_on_expiring_adapter() {
        let counters = keyed_store::<i64, _>(MemoryAdapter::new(100, None))
            .with_key(|name: &'static str| format!("counter:{name}"));

        counters.set_item_with_ttl(60, 3, "hits").unwrap();
        assert!(matches!(counters.get_item_ttl("hits").unwrap(), TtlStatus::Expires(_)));
        assert_eq!(counters.get_item_ttl("misses").unwrap(), TtlStatus::Missing);
    }

    #[test]
    fn test_local_adapter_store() {
        let prefs = keyed_store::<Json<User>, _>(LocalAdapter::new(MemoryWebStorage::new()))
            .with_key(|id: u32| format!("prefs:{id}"));

        prefs.set_item(user(2, "Bob"), 2).unwrap();
        assert!(prefs.has_item(2).unwrap());
        assert_eq!(prefs.get_item(2).unwrap(), Some(user(2, "Bob")));
        assert!(format!("{prefs:?}").starts_with("KeyedStore"));
    }
}
