//! Error types for store operations.

use crate::codec::CodecError;
use std::io;
use thiserror::Error;

/// Errors returned by [`Store`](crate::storage::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem open/read/write/flush failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot file could not be interpreted (unreadable header,
    /// oversized field on save, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The snapshot was written with a version this build cannot read.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u64),

    /// A value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Returns true for the validation family (bad header or version).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::UnsupportedVersion(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
