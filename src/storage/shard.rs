//! A single independently-locked partition of the keyspace.

use super::entry::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

/// A single shard containing a portion of the key-entry pairs.
///
/// Every method takes the lock for exactly the duration of the in-memory
/// operation and never calls out while holding it. A panic cannot leave the
/// map half-updated, so a poisoned lock is recovered rather than propagated.
#[derive(Debug, Default)]
pub struct Shard {
    data: RwLock<HashMap<String, Entry>>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the entry stored under `key`, live or not.
    ///
    /// The copy shares the payload buffer, so this never copies value bytes.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.read().get(key).cloned()
    }

    /// Stores `entry` under `key`, returning the entry it replaced.
    pub fn put(&self, key: String, entry: Entry) -> Option<Entry> {
        self.write().insert(key, entry)
    }

    /// Removes `key`. Returns `true` if something was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Removes `key` only if it is still expired at `now`.
    ///
    /// The predicate is re-evaluated under the write lock, so a fresh value
    /// written between a reader's check and this call is kept.
    pub fn remove_if_expired(&self, key: &str, now: SystemTime) -> bool {
        let mut data = self.write();
        match data.get(key) {
            Some(entry) if !entry.is_live(now) => {
                data.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Copies out every entry that is live at `now`.
    ///
    /// The read lock is released before the copy is returned, so callers can
    /// do slow work (compression, file I/O) without blocking writers.
    pub fn snapshot_live_entries(&self, now: SystemTime) -> Vec<(String, Entry)> {
        let data = self.read();
        data.iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn size(&self) -> usize {
        self.read().len()
    }
}
