//! Keyed store over an asynchronous adapter.
//!
//! Same contract as [`KeyedStore`](super::KeyedStore); every operation is a
//! single awaited adapter call, with the key resolved before the first await.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::Storable;
use crate::error::Result;
use crate::storage::{AsyncExpiringStore, AsyncKeyValueStore, TtlStatus};

// == Factory ==
pub struct AsyncKeyedStoreFactory<S, V> {
    adapter: S,
    _value: PhantomData<fn() -> V>,
}

/// Starts a keyed store over an asynchronous adapter.
pub fn async_keyed_store<V, S>(adapter: S) -> AsyncKeyedStoreFactory<S, V> {
    AsyncKeyedStoreFactory {
        adapter,
        _value: PhantomData,
    }
}

impl<S: Clone, V> AsyncKeyedStoreFactory<S, V> {
    pub fn with_key<A, F>(&self, key_fn: F) -> AsyncKeyedStore<S, V, A, F>
    where
        F: Fn(A) -> String,
    {
        AsyncKeyedStore {
            adapter: self.adapter.clone(),
            key_fn,
            _marker: PhantomData,
        }
    }
}

// == Async Keyed Store ==
pub struct AsyncKeyedStore<S, V, A, F> {
    adapter: S,
    key_fn: F,
    _marker: PhantomData<fn(A) -> V>,
}

impl<S, V, A, F> AsyncKeyedStore<S, V, A, F>
where
    F: Fn(A) -> String,
{
    pub fn resolve_key(&self, args: A) -> String {
        (self.key_fn)(args)
    }

    pub fn adapter(&self) -> &S {
        &self.adapter
    }
}

impl<S, V, A, F> AsyncKeyedStore<S, V, A, F>
where
    S: AsyncKeyValueStore,
    V: Storable,
    F: Fn(A) -> String,
{
    pub async fn get_item(&self, args: A) -> Result<Option<V>> {
        let key = self.resolve_key(args);
        self.adapter.get_item(&key).await
    }

    pub async fn has_item(&self, args: A) -> Result<bool> {
        let key = self.resolve_key(args);
        self.adapter.has_item(&key).await
    }

    pub async fn set_item(&self, value: V, args: A) -> Result<()> {
        let key = self.resolve_key(args);
        self.adapter.set_item(&key, value).await
    }

    pub async fn remove_item(&self, args: A) -> Result<bool> {
        let key = self.resolve_key(args);
        self.adapter.remove_item(&key).await
    }
}

impl<S, V, A, F> AsyncKeyedStore<S, V, A, F>
where
    S: AsyncExpiringStore,
    V: Storable,
    F: Fn(A) -> String,
{
    pub async fn get_item_ttl(&self, args: A) -> Result<TtlStatus> {
        let key = self.resolve_key(args);
        self.adapter.get_item_ttl(&key).await
    }

    pub async fn set_item_with_ttl(&self, ttl_seconds: u64, value: V, args: A) -> Result<()> {
        let key = self.resolve_key(args);
        self.adapter.set_item_with_ttl(&key, ttl_seconds, value).await
    }
}

impl<S: fmt::Debug, V, A, F> fmt::Debug for AsyncKeyedStore<S, V, A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncKeyedStore")
            .field("adapter", &self.adapter)
            .field("value", &std::any::type_name::<V>())
            .finish_non_exhaustive()
    }
}
