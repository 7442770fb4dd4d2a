//! Persistence Service
//!
//! Holds the current ISS dataset behind the [`SnapshotStore`] contract.
//! Three backends:
//! - `memory`: in-process, lost on restart
//! - `snapshot`: versioned, checksummed snapshot files (durable)
//! - `redis_store`: shared Redis instance
//!
//! [`open_store`] builds the configured backend.

pub mod config;
pub mod memory;
pub mod redis_store;
pub mod snapshot;
pub mod store;

pub use config::{open_store, FileStorageConfig, RedisStorageConfig, StorageConfig};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use snapshot::FileStore;
pub use store::{SnapshotStore, StoreError};
