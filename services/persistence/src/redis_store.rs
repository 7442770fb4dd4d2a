//! Redis-backed store
//!
//! Key layout under a configurable prefix:
//! - `<prefix>:samples`: list of JSON samples in epoch order
//! - `<prefix>:index`: hash of epoch → JSON sample
//! - `<prefix>:meta`: sample count; present iff a dataset has been loaded
//!
//! `load` rewrites all three keys in one `MULTI/EXEC`. Every read is also
//! wrapped in `MULTI/EXEC` together with the meta check, so a reader never
//! observes a half-replaced dataset.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, info};
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::Sample;

use crate::config::RedisStorageConfig;
use crate::store::{SnapshotStore, StoreError};

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(format!("redis: {err}"))
}

fn decode(raw: &str) -> Result<Sample, StoreError> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Unavailable(format!("corrupt sample in redis: {e}")))
}

fn encode(sample: &Sample) -> Result<String, StoreError> {
    serde_json::to_string(sample)
        .map_err(|e| StoreError::Unavailable(format!("sample encoding failed: {e}")))
}

/// Key names derived from a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKeys {
    pub samples: String,
    pub index: String,
    pub meta: String,
}

impl RedisKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            samples: format!("{prefix}:samples"),
            index: format!("{prefix}:index"),
            meta: format!("{prefix}:meta"),
        }
    }
}

/// `LRANGE` bounds for a window; `stop` is inclusive, `-1` means the end.
pub(crate) fn list_bounds(limit: Option<usize>, offset: usize) -> (isize, isize) {
    let start = isize::try_from(offset).unwrap_or(isize::MAX);
    let stop = match limit {
        Some(n) if n > 0 => start.saturating_add(isize::try_from(n).unwrap_or(isize::MAX)) - 1,
        _ => -1,
    };
    (start, stop)
}

pub struct RedisStore {
    client: Client,
    keys: RedisKeys,
    connect_timeout: Duration,
    endpoint: String,
}

impl RedisStore {
    pub fn new(config: &RedisStorageConfig) -> Result<Self, StoreError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = Client::open(info).map_err(unavailable)?;
        Ok(Self {
            client,
            keys: RedisKeys::new(&config.key_prefix),
            connect_timeout: config.connect_timeout,
            endpoint: format!("{}:{}/{}", config.host, config.port, config.db),
        })
    }

    /// One connection per operation, dropped when the caller returns.
    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        match tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(result) => result.map_err(unavailable),
            Err(_) => Err(StoreError::Unavailable(format!(
                "redis connect to {} timed out after {:?}",
                self.endpoint, self.connect_timeout
            ))),
        }
    }
}

#[async_trait]
impl SnapshotStore for RedisStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        let mut con = self.connection().await?;
        con.exists(&self.keys.meta).await.map_err(unavailable)
    }

    async fn load(&self, dataset: Dataset) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(dataset.len());
        let mut entries = Vec::with_capacity(dataset.len());
        for sample in dataset.samples() {
            let json = encode(sample)?;
            entries.push((sample.epoch.to_string(), json.clone()));
            encoded.push(json);
        }

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(&self.keys.samples)
            .ignore()
            .del(&self.keys.index)
            .ignore();
        // RPUSH/HSET reject an empty argument list
        if !encoded.is_empty() {
            pipe.rpush(&self.keys.samples, &encoded)
                .ignore()
                .hset_multiple(&self.keys.index, &entries)
                .ignore();
        }
        pipe.set(&self.keys.meta, dataset.len()).ignore();

        let mut con = self.connection().await?;
        let _: () = pipe.query_async(&mut con).await.map_err(unavailable)?;

        info!(
            endpoint = %self.endpoint,
            samples = dataset.len(),
            "Dataset written to redis"
        );
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Sample>, StoreError> {
        self.range(None, 0).await
    }

    async fn range(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, StoreError> {
        let (start, stop) = list_bounds(limit, offset);
        let mut con = self.connection().await?;
        let (loaded, raw): (bool, Vec<String>) = redis::pipe()
            .atomic()
            .exists(&self.keys.meta)
            .lrange(&self.keys.samples, start, stop)
            .query_async(&mut con)
            .await
            .map_err(unavailable)?;

        if !loaded {
            return Err(StoreError::not_loaded());
        }
        debug!(start, stop, returned = raw.len(), "Redis range read");
        raw.iter().map(|s| decode(s)).collect()
    }

    async fn get(&self, epoch: &Epoch) -> Result<Sample, StoreError> {
        let mut con = self.connection().await?;
        let (loaded, raw): (bool, Option<String>) = redis::pipe()
            .atomic()
            .exists(&self.keys.meta)
            .hget(&self.keys.index, epoch.as_str())
            .query_async(&mut con)
            .await
            .map_err(unavailable)?;

        if !loaded {
            return Err(StoreError::not_loaded());
        }
        match raw {
            Some(json) => decode(&json),
            None => Err(StoreError::NotFound(epoch.to_string())),
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use types::sample::{Position, Velocity};

    /// LRANGE semantics on a plain slice (inclusive stop, negative from end).
    fn lrange<T: Clone>(items: &[T], start: isize, stop: isize) -> Vec<T> {
        let len = items.len() as isize;
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Vec::new();
        }
        items[start as usize..=stop as usize].to_vec()
    }

    fn config(port: u16) -> RedisStorageConfig {
        RedisStorageConfig {
            host: "127.0.0.1".to_string(),
            port,
            password: None,
            db: 0,
            key_prefix: "iss".to_string(),
            connect_timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_key_layout() {
        let keys = RedisKeys::new("iss");
        assert_eq!(keys.samples, "iss:samples");
        assert_eq!(keys.index, "iss:index");
        assert_eq!(keys.meta, "iss:meta");
    }

    #[test]
    fn test_list_bounds() {
        assert_eq!(list_bounds(None, 0), (0, -1));
        assert_eq!(list_bounds(Some(0), 3), (3, -1));
        assert_eq!(list_bounds(Some(10), 5), (5, 14));
        assert_eq!(list_bounds(Some(1), 0), (0, 0));
    }

    #[test]
    fn test_sample_json_round_trip() {
        let sample = Sample::new(
            Epoch::parse("2024-079T12:00:00.000Z").unwrap(),
            Position::new(-4389.9, 1234.5, 5051.2),
            Velocity::new(5.3836, -3.7658, -3.3285),
        );
        let json = encode(&sample).unwrap();
        assert!(json.contains("\"epoch\":\"2024-079T12:00:00.000Z\""));
        assert_eq!(decode(&json).unwrap(), sample);
    }

    #[test]
    fn test_corrupt_json_is_unavailable() {
        assert!(matches!(decode("{not json"), Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Grab a free port, then close it again
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = RedisStore::new(&config(port)).unwrap();
        assert_eq!(store.backend(), "redis");
        assert!(matches!(store.exists().await, Err(StoreError::Unavailable(_))));

        let epoch = Epoch::parse("2024-079T12:00:00.000Z").unwrap();
        assert!(matches!(store.get(&epoch).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.load(Dataset::empty()).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_list_bounds_match_window(
            len in 0usize..40,
            limit in proptest::option::of(0usize..50),
            offset in 0usize..60,
        ) {
            let items: Vec<usize> = (0..len).collect();
            let (start, stop) = list_bounds(limit, offset);
            let start_idx = offset.min(len);
            let end_idx = match limit {
                Some(n) if n > 0 => (start_idx + n).min(len),
                _ => len,
            };
            prop_assert_eq!(lrange(&items, start, stop), items[start_idx..end_idx].to_vec());
        }
    }
}
