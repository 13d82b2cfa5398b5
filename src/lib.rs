//! # ShardKV - An In-Process Sharded Key-Value Store
//!
//! ShardKV keeps opaque byte payloads under string keys, spread over a fixed
//! number of independently locked shards, with optional per-key TTL and
//! whole-store snapshots to a compressed binary file.
//!
//! ## Features
//!
//! - **Sharded Storage**: One `RwLock` per shard; keys on different shards
//!   never contend
//! - **Deterministic Routing**: FNV-1a, so a snapshot can be loaded into a
//!   store with any shard count
//! - **TTL Support**: Absolute expiry times, evaluated lazily on every read
//! - **Snapshots**: Versioned, gzip-compressed record stream
//! - **Typed Values**: A small tagged codec turns values into payloads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              ShardKV                                    │
//! │                                                                         │
//! │  caller ──> Store ──> HashRouter ──> Shard (RwLock<HashMap>)            │
//! │               │                                                         │
//! │               │ set / get_as                                            │
//! │               ▼                                                         │
//! │            codec (Encode / Decode)                                      │
//! │               │                                                         │
//! │               │ save / load                                             │
//! │               ▼                                                         │
//! │         persistence ──> gzip ──> snapshot file                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use shardkv::Store;
//! use std::time::Duration;
//!
//! let store = Store::new(4);
//! store.set("a", "1", None).unwrap();
//! store.set("b", "2", Some(Duration::from_millis(1500))).unwrap();
//! store.save("snap.bin").unwrap();
//!
//! // A store with a different shard count can read the same file
//! let fresh = Store::new(2);
//! let report = fresh.load("snap.bin").unwrap();
//! assert_eq!(report.loaded, 2);
//! assert_eq!(fresh.get_as::<String>("a").unwrap().as_deref(), Some("1"));
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: Router, shards, entries and the `Store` facade
//! - [`codec`]: Tagged binary encoding of values
//! - [`persistence`]: Snapshot format and save/load
//! - [`error`]: Error types
//!
//! ## Guarantees and Non-Guarantees
//!
//! - No operation holds more than one shard lock at a time.
//! - No shard lock is held during file I/O or compression.
//! - `save` is not a consistent checkpoint: writes racing with it may or may
//!   not be captured, and the file is overwritten in place.

pub mod codec;
pub mod error;
pub mod persistence;
pub mod storage;

// Re-export commonly used types for convenience
pub use codec::{CodecError, Decode, Encode};
pub use error::{Result, StoreError};
pub use persistence::{LoadReport, SaveReport, SNAPSHOT_VERSION};
pub use storage::{Entry, HashRouter, Store, StoreConfig};

/// Version of ShardKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
