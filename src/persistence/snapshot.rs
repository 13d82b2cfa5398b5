//! Snapshot Save/Load
//!
//! A snapshot is the framed record stream from [`format`](super::format)
//! wrapped in a single gzip member.
//!
//! ## Save
//!
//! ```text
//!  Shard 0 ──worker──┐
//!  Shard 1 ──worker──┼──> channel ──> record writer ──> gzip ──> BufWriter ──> file
//!  Shard N ──worker──┘
//! ```
//!
//! Each worker copies its shard's live entries under a brief read lock and
//! hands the batch to the collector. Compression and file I/O happen with no
//! shard lock held.
//!
//! Save is a best-effort scan, not a checkpoint: a `set` or `delete` that
//! runs concurrently with a save may or may not be reflected in the file,
//! and records appear in no particular order.
//!
//! ## Load
//!
//! Load decodes the whole file before anything is inserted. A torn or
//! corrupt record is counted as a warning and ends the scan, since length
//! fields are the only framing and nothing after a bad one can be trusted.

use super::format::{self, RawRecord, SNAPSHOT_VERSION};
use crate::error::{Result, StoreError};
use crate::storage::entry::Entry;
use crate::storage::shard::Shard;
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::thread;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Records written
    pub records: u64,
    /// Uncompressed bytes written, including the version field
    pub bytes: u64,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records inserted into the store
    pub loaded: u64,
    /// Records skipped because they expired after the snapshot was taken
    pub expired: u64,
    /// Corrupt or torn records encountered
    pub warnings: u32,
}

impl LoadReport {
    /// Returns true if the load finished without corruption warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings == 0
    }
}

/// A record whose key has been validated as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub key: String,
    pub expire_unix: i64,
    pub data: Bytes,
}

/// A snapshot decoded into memory, not yet applied to a store.
#[derive(Debug, Default)]
pub struct DecodedSnapshot {
    pub records: Vec<SnapshotRecord>,
    pub warnings: u32,
}

/// Errors that mean the data itself is bad rather than the filesystem.
fn is_corruption(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput
    )
}

/// Writes a snapshot of all live entries to `path`, replacing the file.
pub fn save(shards: &[Shard], path: &Path) -> Result<SaveReport> {
    let file = File::create(path)?;
    let (report, mut writer) = write_snapshot(shards, BufWriter::new(file), SystemTime::now())?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        records = report.records,
        bytes = report.bytes,
        "Snapshot saved"
    );
    Ok(report)
}

/// Streams a compressed snapshot of every entry live at `now` into `writer`.
///
/// Returns the writer after the gzip stream has been finished, so the caller
/// can flush or sync it.
pub fn write_snapshot<W: Write>(
    shards: &[Shard],
    writer: W,
    now: SystemTime,
) -> Result<(SaveReport, W)> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    format::write_version(&mut encoder, SNAPSHOT_VERSION)?;

    let mut report = SaveReport {
        records: 0,
        bytes: 8,
    };

    // One slot per shard: every worker sends exactly one batch, so no worker
    // ever blocks on a collector that stopped early.
    let (tx, rx) = crossbeam_channel::bounded::<Vec<(String, Entry)>>(shards.len().max(1));

    thread::scope(|scope| -> Result<()> {
        for shard in shards {
            let tx = tx.clone();
            scope.spawn(move || {
                if let Err(e) = tx.send(shard.snapshot_live_entries(now)) {
                    // The collector stopped on a write error
                    debug!(dropped = e.into_inner().len(), "Snapshot collector closed");
                }
            });
        }
        drop(tx);

        // Owned by the collector so a failed write disconnects the workers
        let rx = rx;
        for batch in rx.iter() {
            for (key, entry) in batch {
                let written = format::write_record(
                    &mut encoder,
                    &key,
                    entry.expire_unix_seconds(),
                    &entry.payload,
                )?;
                report.records += 1;
                report.bytes += written as u64;
            }
        }
        Ok(())
    })?;

    let writer = encoder.finish()?;
    Ok((report, writer))
}

/// Reads and decodes the snapshot at `path`.
pub fn read(path: &Path) -> Result<DecodedSnapshot> {
    let file = File::open(path)?;
    read_snapshot(BufReader::new(file))
}

/// Decodes a compressed snapshot stream.
///
/// Fails only if the header is missing, unreadable or of the wrong version,
/// or if the underlying reader fails for a reason other than bad data.
pub fn read_snapshot<R: Read>(reader: R) -> Result<DecodedSnapshot> {
    let mut decoder = GzDecoder::new(reader);

    let version = match format::read_version(&mut decoder) {
        Ok(version) => version,
        Err(e) if is_corruption(&e) => {
            return Err(StoreError::Validation(format!(
                "unreadable snapshot header: {}",
                e
            )))
        }
        Err(e) => return Err(e.into()),
    };
    if version != SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }

    let mut decoded = DecodedSnapshot::default();
    loop {
        match format::read_record(&mut decoder) {
            Ok(None) => break,
            Ok(Some(RawRecord {
                key,
                expire_unix,
                data,
            })) => match String::from_utf8(key) {
                Ok(key) => decoded.records.push(SnapshotRecord {
                    key,
                    expire_unix,
                    data,
                }),
                Err(e) => {
                    // Framing is intact, only this record is unusable
                    let err = e.utf8_error();
                    decoded.warnings += 1;
                    warn!(
                        record = decoded.records.len(),
                        error = %err,
                        "Skipping snapshot record with non UTF-8 key"
                    );
                }
            },
            Err(e) if is_corruption(&e) => {
                decoded.warnings += 1;
                warn!(
                    recovered = decoded.records.len(),
                    error = %e,
                    "Corrupt snapshot record, ignoring the rest of the file"
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(decoded)
}
