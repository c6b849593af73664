//! Keyed Cache - typed keyed stores over heterogeneous key-value engines
//!
//! Wraps an in-process LRU cache, a string-only local storage and an
//! asynchronous remote engine behind one capability interface, with a codec
//! that lets structured values (dates, maps, sets, byte buffers) survive
//! string and byte oriented storage. Remote values can also be stored as
//! plain MessagePack.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod keyed;
pub mod storage;
pub mod tasks;
pub mod telemetry;

pub use codec::{Json, Payload, Storable, Value};
pub use config::Config;
pub use error::{AdapterError, DecodeError, EncodeError, Result, StoreError};
pub use keyed::{async_keyed_store, keyed_store, AsyncKeyedStore, KeyedStore};
pub use storage::{
    AsyncExpiringStore, AsyncKeyValueStore, ExpiringStore, ExpiryPurge, KeyValueStore,
    LocalAdapter, LoopbackEngine, MemoryAdapter, MemoryWebStorage, MsgpackAdapter, RemoteAdapter,
    RemoteEngine, TtlStatus, WebStorage,
};
pub use tasks::{spawn_cleanup_task, spawn_cleanup_task_from_config};
