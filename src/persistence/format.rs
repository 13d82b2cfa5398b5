//! Snapshot stream framing.
//!
//! ```text
//! stream := VERSION(u64 BE) RECORD*
//! RECORD := KEYLEN(u32 BE) KEY(KEYLEN bytes, UTF-8)
//!           EXPIRE(i64 BE, unix seconds; 0 = never expires)
//!           DATALEN(u32 BE) DATA(DATALEN bytes)
//! ```
//!
//! These helpers work on the uncompressed stream; compression is layered on
//! top by the snapshot module. Length fields are the only framing, so once a
//! record is cut short nothing after it can be located.

use crate::error::{Result, StoreError};
use bytes::Bytes;
use std::io::{self, Read, Write};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Fixed bytes per record besides the key and data: KEYLEN + EXPIRE + DATALEN.
pub const RECORD_OVERHEAD: usize = 4 + 8 + 4;

/// A record as read from the stream, before the key is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: Vec<u8>,
    pub expire_unix: i64,
    pub data: Bytes,
}

pub fn write_version<W: Write>(writer: &mut W, version: u64) -> io::Result<()> {
    writer.write_all(&version.to_be_bytes())
}

pub fn read_version<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn frame_len(len: usize, field: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| StoreError::Validation(format!("{} of {} bytes exceeds u32 framing", field, len)))
}

/// Appends one record. Returns the number of bytes written.
pub fn write_record<W: Write>(
    writer: &mut W,
    key: &str,
    expire_unix: i64,
    data: &[u8],
) -> Result<usize> {
    let key_len = frame_len(key.len(), "key")?;
    let data_len = frame_len(data.len(), "payload")?;

    writer.write_all(&key_len.to_be_bytes())?;
    writer.write_all(key.as_bytes())?;

    let mut middle = [0u8; 12];
    middle[..8].copy_from_slice(&expire_unix.to_be_bytes());
    middle[8..].copy_from_slice(&data_len.to_be_bytes());
    writer.write_all(&middle)?;
    writer.write_all(data)?;

    Ok(RECORD_OVERHEAD + key.len() + data.len())
}

/// Reads the KEYLEN field, distinguishing a clean end of stream (no bytes
/// at all) from a length cut short.
fn read_key_len<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated key length",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(u32::from_be_bytes(buf)))
}

/// Reads exactly `len` bytes without trusting `len` for the allocation.
fn read_sized<R: Read>(reader: &mut R, len: u32, field: &str) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut out)?;
    if out.len() != len as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("truncated {}: expected {} bytes, got {}", field, len, out.len()),
        ));
    }
    Ok(out)
}

/// Reads the next record.
///
/// Returns `Ok(None)` at a clean end of stream. A stream that ends inside a
/// record yields an `UnexpectedEof` error.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<Option<RawRecord>> {
    let key_len = match read_key_len(reader)? {
        Some(len) => len,
        None => return Ok(None),
    };
    let key = read_sized(reader, key_len, "key")?;

    let mut expire = [0u8; 8];
    reader.read_exact(&mut expire)?;

    let mut data_len = [0u8; 4];
    reader.read_exact(&mut data_len)?;
    let data = read_sized(reader, u32::from_be_bytes(data_len), "data")?;

    Ok(Some(RawRecord {
        key,
        expire_unix: i64::from_be_bytes(expire),
        data: Bytes::from(data),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_record_layout() {
        let mut out = Vec::new();
        let written = write_record(&mut out, "ab", 7, b"xyz").unwrap();

        assert_eq!(written, out.len());
        assert_eq!(
            out,
            vec![
                0, 0, 0, 2, b'a', b'b', // key
                0, 0, 0, 0, 0, 0, 0, 7, // expire
                0, 0, 0, 3, b'x', b'y', b'z', // data
            ]
        );
    }

    #[test]
    fn test_version_layout() {
        let mut out = Vec::new();
        write_version(&mut out, SNAPSHOT_VERSION).unwrap();
        assert_eq!(out, vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(read_version(&mut Cursor::new(out)).unwrap(), 1);
    }

    #[test]
    fn test_read_records_until_clean_end() {
        let mut out = Vec::new();
        write_record(&mut out, "a", 0, b"1").unwrap();
        write_record(&mut out, "b", -5, b"").unwrap();

        let mut reader = Cursor::new(out);
        let first = read_record(&mut reader).unwrap().unwrap();
        assert_eq!(first.key, b"a");
        assert_eq!(first.expire_unix, 0);
        assert_eq!(first.data, Bytes::from("1"));

        let second = read_record(&mut reader).unwrap().unwrap();
        assert_eq!(second.expire_unix, -5);
        assert!(second.data.is_empty());

        assert!(read_record(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_truncation_at_every_field() {
        let mut full = Vec::new();
        write_record(&mut full, "key", 42, b"payload").unwrap();

        // Every proper prefix except the empty one is a torn record
        for cut in 1..full.len() {
            let mut reader = Cursor::new(full[..cut].to_vec());
            let err = read_record(&mut reader).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof, "cut at {}", cut);
        }
    }

    #[test]
    fn test_huge_length_does_not_allocate_up_front() {
        let mut raw = u32::MAX.to_be_bytes().to_vec();
        raw.extend_from_slice(b"short");
        let err = read_record(&mut Cursor::new(raw)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
