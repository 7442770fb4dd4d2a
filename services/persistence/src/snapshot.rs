//! Snapshot System: durable dataset snapshots with integrity and compression
//!
//! Features:
//! - Full dataset serialization (samples in epoch order)
//! - SHA-256 integrity hash over the serialized samples
//! - Optional zstd compression
//! - Snapshot versioning for forward compatibility
//! - Atomic writes (tmp file → fsync → rename)
//! - Cleanup policy (keep last N snapshots)
//! - [`FileStore`]: a [`SnapshotStore`] backed by the newest snapshot on disk

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::Sample;

use crate::store::{lookup, SnapshotStore, StoreError};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Invalid dataset in snapshot: {0}")]
    InvalidDataset(String),

    #[error("No snapshots found")]
    NoSnapshots,
}

impl SnapshotError {
    /// The snapshot file was read but its contents are unusable.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SnapshotError::Serialization(_)
                | SnapshotError::IntegrityFailure { .. }
                | SnapshotError::UnsupportedVersion(_)
                | SnapshotError::Compression(_)
                | SnapshotError::InvalidDataset(_)
        )
    }
}

impl From<SnapshotError> for StoreError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::NoSnapshots => StoreError::not_loaded(),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

// ── Snapshot ────────────────────────────────────────────────────────

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A persisted dataset at a given generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Snapshot format version for forward compatibility.
    pub version: u32,
    /// Monotonic load counter; the highest generation on disk is current.
    pub generation: u64,
    /// Unix millisecond timestamp when the snapshot was taken.
    pub created_at: i64,
    /// Samples in epoch order.
    pub samples: Vec<Sample>,
    /// SHA-256 hash of the serialized samples.
    pub checksum: String,
}

impl DatasetSnapshot {
    /// Create a new snapshot with computed integrity hash.
    pub fn new(generation: u64, created_at: i64, dataset: &Dataset) -> Result<Self, SnapshotError> {
        let samples = dataset.samples().to_vec();
        let checksum = compute_hash(&samples)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            generation,
            created_at,
            samples,
            checksum,
        })
    }

    /// Verify the snapshot's integrity hash.
    pub fn verify_integrity(&self) -> Result<(), SnapshotError> {
        let actual = compute_hash(&self.samples)?;
        if actual != self.checksum {
            return Err(SnapshotError::IntegrityFailure {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Rebuild the dataset, re-checking ordering and uniqueness.
    pub fn into_dataset(self) -> Result<Dataset, SnapshotError> {
        Dataset::from_samples(self.samples).map_err(|e| SnapshotError::InvalidDataset(e.to_string()))
    }
}

/// Deterministic SHA-256 of the samples.
pub fn compute_hash(samples: &[Sample]) -> Result<String, SnapshotError> {
    let bytes = bincode::serialize(samples).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

// ── Snapshot Writer ─────────────────────────────────────────────────

/// Writes snapshots to disk with optional zstd compression.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    compress: bool,
}

impl SnapshotWriter {
    /// Create a new writer. `compress` enables zstd compression.
    pub fn new(dir: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            dir: dir.into(),
            compress,
        }
    }

    /// Write a snapshot atomically: serialize → compress → write tmp → fsync → rename.
    pub fn write(&self, snapshot: &DatasetSnapshot) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir)?;

        let data = bincode::serialize(snapshot)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        let (final_data, ext) = if self.compress {
            let compressed = zstd::encode_all(data.as_slice(), 3)
                .map_err(|e| SnapshotError::Compression(e.to_string()))?;
            (compressed, "snap.zst")
        } else {
            (data, "snap")
        };

        let filename = format!("snapshot-{:012}.{}", snapshot.generation, ext);
        let path = self.dir.join(&filename);
        let tmp_path = self.dir.join(format!("{}.tmp", filename));

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&final_data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        Ok(path)
    }
}

// ── Snapshot Loader ─────────────────────────────────────────────────

/// Loads snapshots from disk, verifying integrity.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    dir: PathBuf,
}

impl SnapshotLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load a specific snapshot file.
    pub fn load(&self, path: &Path) -> Result<DatasetSnapshot, SnapshotError> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let is_compressed = path.extension().map(|e| e == "zst").unwrap_or(false);

        let decompressed = if is_compressed {
            zstd::decode_all(data.as_slice())
                .map_err(|e| SnapshotError::Compression(e.to_string()))?
        } else {
            data
        };

        let snapshot: DatasetSnapshot = bincode::deserialize(&decompressed)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        snapshot.verify_integrity()?;

        Ok(snapshot)
    }

    /// Load the latest snapshot (highest generation).
    pub fn load_latest(&self) -> Result<DatasetSnapshot, SnapshotError> {
        let path = self.find_latest()?;
        self.load(&path)
    }

    /// Find the path to the latest snapshot.
    pub fn find_latest(&self) -> Result<PathBuf, SnapshotError> {
        self.list_snapshots()?
            .pop()
            .map(|(_, path)| path)
            .ok_or(SnapshotError::NoSnapshots)
    }

    /// Highest generation on disk, 0 when there are none.
    pub fn latest_generation(&self) -> Result<u64, SnapshotError> {
        Ok(self.list_snapshots()?.last().map(|(gen, _)| *gen).unwrap_or(0))
    }

    /// List all snapshots as (generation, path) pairs, ascending.
    pub fn list_snapshots(&self) -> Result<Vec<(u64, PathBuf)>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("snapshot-") && (name.ends_with(".snap") || name.ends_with(".snap.zst"))
            {
                if let Some(gen) = Self::parse_generation(&name) {
                    results.push((gen, entry.path()));
                }
            }
        }
        results.sort_by_key(|(gen, _)| *gen);
        Ok(results)
    }

    fn parse_generation(filename: &str) -> Option<u64> {
        let stripped = filename
            .trim_start_matches("snapshot-")
            .trim_end_matches(".snap.zst")
            .trim_end_matches(".snap");
        stripped.parse::<u64>().ok()
    }
}

// ── Snapshot Cleanup Policy ─────────────────────────────────────────

/// Policy for cleaning up old snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotCleanupPolicy {
    /// Maximum number of snapshots to retain.
    pub max_snapshots: usize,
}

impl SnapshotCleanupPolicy {
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Remove old snapshots, keeping only the most recent `max_snapshots`.
    pub fn cleanup(&self, dir: &Path) -> Result<Vec<PathBuf>, SnapshotError> {
        let loader = SnapshotLoader::new(dir);
        let snapshots = loader.list_snapshots()?;

        let mut removed = Vec::new();
        if snapshots.len() > self.max_snapshots {
            let to_remove = snapshots.len() - self.max_snapshots;
            for (_, path) in snapshots.iter().take(to_remove) {
                fs::remove_file(path)?;
                removed.push(path.clone());
            }
        }
        Ok(removed)
    }
}

// ── File Store ──────────────────────────────────────────────────────

/// Store backed by a snapshot directory.
///
/// The newest valid snapshot is the persisted dataset. It is read from disk
/// once and then served from memory; `load` writes a new generation before
/// swapping the in-memory copy, so a crash mid-write leaves the previous
/// generation intact.
pub struct FileStore {
    dir: PathBuf,
    writer: SnapshotWriter,
    cleanup: SnapshotCleanupPolicy,
    current: RwLock<Option<Arc<Dataset>>>,
    // Serializes writers so generations stay monotonic.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, compress: bool, retain: usize) -> Self {
        let dir = dir.into();
        Self {
            writer: SnapshotWriter::new(dir.clone(), compress),
            cleanup: SnapshotCleanupPolicy::new(retain),
            dir,
            current: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    fn cached(&self) -> Result<Option<Arc<Dataset>>, SnapshotError> {
        let guard = self.current.read().map_err(|_| lock_poisoned())?;
        Ok(guard.clone())
    }

    fn install(&self, dataset: Arc<Dataset>) -> Result<(), SnapshotError> {
        let mut guard = self.current.write().map_err(|_| lock_poisoned())?;
        *guard = Some(dataset);
        Ok(())
    }

    /// Install `dataset` unless a load got there first; returns the winner.
    fn install_if_empty(&self, dataset: Arc<Dataset>) -> Result<Arc<Dataset>, SnapshotError> {
        let mut guard = self.current.write().map_err(|_| lock_poisoned())?;
        Ok(guard.get_or_insert(dataset).clone())
    }

    /// Cached dataset, reading the newest snapshot from disk on first use.
    async fn current(&self) -> Result<Arc<Dataset>, SnapshotError> {
        if let Some(dataset) = self.cached()? {
            return Ok(dataset);
        }

        let loader = SnapshotLoader::new(self.dir.clone());
        let dataset = tokio::task::spawn_blocking(move || {
            loader.load_latest().and_then(DatasetSnapshot::into_dataset)
        })
        .await
        .map_err(|e| SnapshotError::Io(io::Error::other(format!("snapshot read task failed: {e}"))))??;

        debug!(dir = %self.dir.display(), samples = dataset.len(), "Snapshot read from disk");
        self.install_if_empty(Arc::new(dataset))
    }
}

fn lock_poisoned() -> SnapshotError {
    SnapshotError::Io(io::Error::other("file store lock poisoned"))
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn exists(&self) -> Result<bool, StoreError> {
        match self.current().await {
            Ok(_) => Ok(true),
            Err(SnapshotError::NoSnapshots) => Ok(false),
            // Unreadable snapshots count as absent; the next load supersedes them.
            Err(err) if err.is_corruption() => {
                warn!(dir = %self.dir.display(), error = %err, "Ignoring unreadable snapshot");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn load(&self, dataset: Dataset) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let dir = self.dir.clone();
        let writer = self.writer.clone();
        let cleanup = self.cleanup.clone();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        let (dataset, generation, path) = tokio::task::spawn_blocking(move || {
            let generation = SnapshotLoader::new(&dir).latest_generation()? + 1;
            let snapshot = DatasetSnapshot::new(generation, created_at, &dataset)?;
            let path = writer.write(&snapshot)?;
            let removed = cleanup.cleanup(&dir)?;
            if !removed.is_empty() {
                debug!(removed = removed.len(), "Old snapshots removed");
            }
            Ok::<_, SnapshotError>((dataset, generation, path))
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("snapshot write task failed: {e}")))??;

        info!(
            generation,
            samples = dataset.len(),
            path = %path.display(),
            "Dataset snapshot written"
        );
        self.install(Arc::new(dataset))?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Sample>, StoreError> {
        Ok(self.current().await?.samples().to_vec())
    }

    async fn range(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Sample>, StoreError> {
        Ok(self.current().await?.window(limit, offset).to_vec())
    }

    async fn get(&self, epoch: &Epoch) -> Result<Sample, StoreError> {
        let dataset = self.current().await?;
        lookup(&dataset, epoch)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// ── Tests ───────────────────────────────────────────────────────────
