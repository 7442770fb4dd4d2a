//! Storage configuration and factory.
//!
//! Services pick a backend with [`StorageConfig`] and obtain it as a trait
//! object through [`open_store`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::memory::MemoryStore;
use crate::redis_store::RedisStore;
use crate::snapshot::FileStore;
use crate::store::{SnapshotStore, StoreError};

/// Default number of on-disk snapshot generations to keep.
pub const DEFAULT_RETAIN: usize = 3;

/// Default prefix for Redis keys.
pub const DEFAULT_KEY_PREFIX: &str = "iss";

/// Which backend holds the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    InMemory,
    File(FileStorageConfig),
    Redis(RedisStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Redis(RedisStorageConfig::default())
    }
}

/// Snapshot directory settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStorageConfig {
    pub dir: PathBuf,
    /// zstd-compress snapshot files.
    pub compress: bool,
    /// Generations kept after each load (minimum 1).
    pub retain: usize,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".data/snapshots"),
            compress: true,
            retain: DEFAULT_RETAIN,
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisStorageConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    pub key_prefix: String,
    pub connect_timeout: Duration,
}

impl Default for RedisStorageConfig {
    fn default() -> Self {
        Self {
            host: "redis-db".to_string(),
            port: 6379,
            password: None,
            db: 0,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Creates a store for the given configuration.
///
/// No I/O happens here; backends connect or read lazily on first use.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn SnapshotStore>, StoreError> {
    let store: Arc<dyn SnapshotStore> = match config {
        StorageConfig::InMemory => Arc::new(MemoryStore::new()),
        StorageConfig::File(file) => {
            Arc::new(FileStore::new(file.dir.clone(), file.compress, file.retain))
        }
        StorageConfig::Redis(redis) => Arc::new(RedisStore::new(redis)?),
    };
    info!(backend = store.backend(), "Snapshot store opened");
    Ok(store)
}
