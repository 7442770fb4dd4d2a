//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use feed::DEFAULT_FEED_URL;
use persistence::config::{DEFAULT_KEY_PREFIX, DEFAULT_RETAIN};
use persistence::{FileStorageConfig, RedisStorageConfig, StorageConfig};

use crate::resolver::DEFAULT_GEOCODER_URL;

/// Where the dataset is kept.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    Redis,
}

/// CLI arguments for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "iss-tracker")]
#[command(about = "ISS state-vector tracker HTTP API")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ISS_LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    pub listen_addr: SocketAddr,

    /// Storage backend
    #[arg(long, env = "ISS_STORAGE", value_enum, default_value = "redis")]
    pub storage: StorageKind,

    #[arg(long, env = "REDIS_HOST", default_value = "redis-db")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_PASSWORD")]
    pub redis_password: Option<String>,

    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: i64,

    /// Prefix for every Redis key
    #[arg(long, env = "ISS_REDIS_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub redis_prefix: String,

    /// Snapshot directory for the file backend
    #[arg(long, env = "ISS_SNAPSHOT_DIR", default_value = ".data/snapshots")]
    pub snapshot_dir: PathBuf,

    /// Snapshot generations kept by the file backend
    #[arg(long, env = "ISS_SNAPSHOT_RETAIN", default_value_t = DEFAULT_RETAIN)]
    pub snapshot_retain: usize,

    /// Ephemeris document URL
    #[arg(long, env = "ISS_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    #[arg(long, env = "ISS_FEED_TIMEOUT_SECS", default_value_t = 30)]
    pub feed_timeout_secs: u64,

    /// Reverse geocoding endpoint; empty disables lookups
    #[arg(long, env = "ISS_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    pub geocoder_url: String,

    #[arg(long, env = "ISS_GEOCODER_TIMEOUT_SECS", default_value_t = 5)]
    pub geocoder_timeout_secs: u64,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "ISS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn storage_config(&self) -> StorageConfig {
        match self.storage {
            StorageKind::Memory => StorageConfig::InMemory,
            StorageKind::File => StorageConfig::File(FileStorageConfig {
                dir: self.snapshot_dir.clone(),
                retain: self.snapshot_retain,
                ..Default::default()
            }),
            StorageKind::Redis => StorageConfig::Redis(RedisStorageConfig {
                host: self.redis_host.clone(),
                port: self.redis_port,
                password: self.redis_password.clone(),
                db: self.redis_db,
                key_prefix: self.redis_prefix.clone(),
                ..Default::default()
            }),
        }
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }
}
