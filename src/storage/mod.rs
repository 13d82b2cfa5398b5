//! Storage Module
//!
//! This module provides the in-memory side of ShardKV: a sharded key-value
//! store with per-key TTL.
//!
//! ## Architecture
//!
//! ```text
//!            key
//!             │
//!             ▼
//!      ┌─────────────┐
//!      │ HashRouter  │  FNV-1a(key) % shard_count
//!      └──────┬──────┘
//!             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...N     │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │            │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: Keys can have time-to-live expiry
//! - **Lazy Expiry**: Expired keys are hidden on access and removed then
//!
//! ## Example
//!
//! ```
//! use shardkv::storage::Store;
//! use std::time::Duration;
//!
//! let store = Store::new(8);
//!
//! store.set("name", "Ariz", None).unwrap();
//! assert!(store.has("name"));
//!
//! store.set("session", "token123", Some(Duration::from_secs(3600))).unwrap();
//! assert_eq!(store.entry_count(), 2);
//! ```

pub mod entry;
pub mod router;
pub mod shard;
pub mod store;

// Re-export commonly used types
pub use entry::Entry;
pub use router::HashRouter;
pub use shard::Shard;
pub use store::{Store, StoreConfig, DEFAULT_SHARD_COUNT, DEFAULT_SNAPSHOT_PATH};
