//! Snapshot Persistence
//!
//! Whole-store binary snapshots: a versioned, gzip-compressed stream of
//! length-prefixed records. See [`format`] for the byte layout and
//! [`snapshot`] for the save/load pipeline.
//!
//! Snapshots are not crash-atomic: the destination file is overwritten in
//! place.

pub mod format;
pub mod snapshot;

pub use format::SNAPSHOT_VERSION;
pub use snapshot::{LoadReport, SaveReport};
