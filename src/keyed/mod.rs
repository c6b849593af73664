//! Keyed Store Module
//!
//! Typed facades that bind one adapter to one key-derivation function.

mod async_store;
mod sync_store;

pub use async_store::{async_keyed_store, AsyncKeyedStore, AsyncKeyedStoreFactory};
pub use sync_store::{keyed_store, KeyedStore, KeyedStoreFactory};
