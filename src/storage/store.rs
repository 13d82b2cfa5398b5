//! Sharded Key-Value Store
//!
//! The [`Store`] facade routes every key to one shard and runs the operation
//! against that shard's lock alone. No operation ever holds two shard locks,
//! so there is no lock ordering to get wrong.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                               │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │            │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │            │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bulk operations (`truncate`, `entry_count`) visit shards in parallel and
//! combine results through a single atomic counter.
//!
//! ## Expiry
//!
//! Expiry is lazy. An expired entry is invisible to `get`/`has` and is
//! removed when one of them runs into it; otherwise it stays in memory until
//! overwritten, deleted, truncated, or left out of a snapshot.

use super::entry::Entry;
use super::router::HashRouter;
use super::shard::Shard;
use crate::codec::{self, CodecError, Decode, Encode};
use crate::error::Result;
use crate::persistence::snapshot::{self, DecodedSnapshot, LoadReport, SaveReport};
use bytes::Bytes;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Default snapshot file used by [`Store::save_default`] and
/// [`Store::load_default`].
pub const DEFAULT_SNAPSHOT_PATH: &str = "shardkv.snap";

/// Configuration for a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of shards, fixed for the life of the store (minimum 1)
    pub shard_count: usize,

    /// Snapshot file used when no explicit path is given
    pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

impl StoreConfig {
    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }
}

/// An in-process key-value store partitioned into independently locked
/// shards.
///
/// # Thread Safety
///
/// `Store` is `Send + Sync`; share it across threads or tasks with an `Arc`.
///
/// # Example
///
/// ```
/// use shardkv::Store;
/// use std::time::Duration;
///
/// let store = Store::new(4);
/// store.set("name", "Ariz", None).unwrap();
/// store.set("session", &42i64, Some(Duration::from_secs(60))).unwrap();
///
/// let name: Option<String> = store.get_as("name").unwrap();
/// assert_eq!(name.as_deref(), Some("Ariz"));
/// assert!(store.has("session"));
/// assert_eq!(store.entry_count(), 2);
/// ```
pub struct Store {
    shards: Vec<Shard>,
    router: HashRouter,
    config: StoreConfig,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &self.shards.len())
            .field("snapshot_path", &self.config.snapshot_path)
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

impl Store {
    /// Creates a store with `shard_count` shards and default settings
    /// otherwise.
    pub fn new(shard_count: usize) -> Self {
        Self::with_config(StoreConfig::default().with_shard_count(shard_count))
    }

    /// Creates a store from a configuration.
    pub fn with_config(mut config: StoreConfig) -> Self {
        config.shard_count = config.shard_count.max(1);
        let shards = (0..config.shard_count).map(|_| Shard::new()).collect();

        Self {
            shards,
            router: HashRouter::new(config.shard_count),
            config,
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    #[inline]
    pub fn shard_for(&self, key: &str) -> usize {
        self.router.route(key)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[inline]
    fn get_shard(&self, key: &str) -> &Shard {
        &self.shards[self.router.route(key)]
    }

    /// Gets the payload stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry found here is removed.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.get_entry(key).map(|entry| entry.payload)
    }

    /// Gets the full live entry for `key`, including its expiry.
    pub fn get_entry(&self, key: &str) -> Option<Entry> {
        let shard = self.get_shard(key);
        let entry = shard.get(key)?;
        let now = SystemTime::now();

        if entry.is_live(now) {
            return Some(entry);
        }

        shard.remove_if_expired(key, now);
        None
    }

    /// Gets and decodes the value stored under `key`.
    pub fn get_as<T: Decode>(&self, key: &str) -> std::result::Result<Option<T>, CodecError> {
        self.get(key).map(codec::from_bytes::<T>).transpose()
    }

    /// Decodes a payload previously returned by [`get`](Self::get).
    pub fn deserialize<T: Decode>(&self, payload: Bytes) -> std::result::Result<T, CodecError> {
        codec::from_bytes(payload)
    }

    /// Checks if a key exists and is not expired.
    pub fn has(&self, key: &str) -> bool {
        self.get_entry(key).is_some()
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// With a `ttl` the entry expires that long after this call. Encoding
    /// happens before any lock is taken; if it fails, the previous value (if
    /// any) is left untouched.
    pub fn set<V: Encode + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &V,
        ttl: Option<Duration>,
    ) -> std::result::Result<(), CodecError> {
        let payload = codec::to_bytes(value)?;
        self.set_raw(key, payload, ttl);
        Ok(())
    }

    /// Stores an already-encoded payload under `key`.
    pub fn set_raw(&self, key: impl Into<String>, payload: Bytes, ttl: Option<Duration>) {
        let key = key.into();
        let entry = match ttl {
            Some(ttl) => Entry::with_ttl(payload, ttl),
            None => Entry::new(payload),
        };
        self.get_shard(&key).put(key, entry);
    }

    /// Deletes a key. Returns `true` if the key was present (live or not).
    pub fn delete(&self, key: &str) -> bool {
        self.get_shard(key).delete(key)
    }

    /// Clears every shard.
    ///
    /// Shards are cleared in parallel, one lock at a time each, so a
    /// concurrent `set` may land in a shard after it was cleared.
    pub fn truncate(&self) {
        self.shards.par_iter().for_each(Shard::clear);
        debug!(shards = self.shards.len(), "Store truncated");
    }

    /// Number of stored entries across all shards.
    ///
    /// Counts entries that have expired but not been reclaimed yet.
    /// Saturates at `u32::MAX`.
    pub fn entry_count(&self) -> u32 {
        let total = AtomicU64::new(0);
        self.shards.par_iter().for_each(|shard| {
            total.fetch_add(shard.size() as u64, Ordering::Relaxed);
        });
        u32::try_from(total.load(Ordering::Relaxed)).unwrap_or(u32::MAX)
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.size() == 0)
    }

    /// Writes a snapshot of every live entry to `path`.
    ///
    /// This is a best-effort scan, not a consistent checkpoint: writes that
    /// race with the save may or may not be included.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<SaveReport> {
        snapshot::save(&self.shards, path.as_ref())
    }

    /// Loads a snapshot from `path` into this store.
    ///
    /// Records are merged into the current contents, each key re-routed
    /// through this store's router, so the snapshot may come from a store
    /// with a different shard count. If the load fails, nothing is inserted.
    /// Corrupt records are reported through [`LoadReport::warnings`].
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let decoded = snapshot::read(path)?;
        let report = self.apply_snapshot(decoded, SystemTime::now());

        info!(
            path = %path.display(),
            loaded = report.loaded,
            expired = report.expired,
            warnings = report.warnings,
            "Snapshot loaded"
        );
        Ok(report)
    }

    /// Inserts every decoded record still live at `now`.
    fn apply_snapshot(&self, decoded: DecodedSnapshot, now: SystemTime) -> LoadReport {
        let mut report = LoadReport {
            warnings: decoded.warnings,
            ..LoadReport::default()
        };

        for record in decoded.records {
            let entry = Entry::with_expiry(
                record.data,
                super::entry::from_unix_seconds(record.expire_unix),
            );
            if !entry.is_live(now) {
                report.expired += 1;
                continue;
            }
            self.get_shard(&record.key).put(record.key, entry);
            report.loaded += 1;
        }
        report
    }

    /// Saves to the configured snapshot path.
    pub fn save_default(&self) -> Result<SaveReport> {
        self.save(&self.config.snapshot_path)
    }

    /// Loads from the configured snapshot path.
    pub fn load_default(&self) -> Result<LoadReport> {
        self.load(&self.config.snapshot_path)
    }
}
