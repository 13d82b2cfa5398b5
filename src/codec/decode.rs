//! Decoding half of the value codec.

use super::{tag, CodecError};
use bytes::{Buf, Bytes};

/// A value that can be read back out of a payload.
///
/// Implementations consume exactly one tagged value from the front of `buf`.
pub trait Decode: Sized {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError>;
}

#[inline]
fn need(buf: &Bytes, needed: usize) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::UnexpectedEnd {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Consumes the type tag and checks it against the expected one.
fn expect_tag(buf: &mut Bytes, expected: u8) -> Result<(), CodecError> {
    need(buf, 1)?;
    let found = buf.get_u8();
    if found == expected {
        return Ok(());
    }
    if tag::name(found) == "unknown" {
        return Err(CodecError::UnknownTag(found));
    }
    Err(CodecError::TypeMismatch {
        expected: tag::name(expected),
        found: tag::name(found),
    })
}

/// Reads a u32 length prefix and makes sure that many bytes follow.
fn take_sized(buf: &mut Bytes) -> Result<Bytes, CodecError> {
    need(buf, 4)?;
    let len = buf.get_u32() as usize;
    need(buf, len)?;
    Ok(buf.split_to(len))
}

impl Decode for bool {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::BOOL)?;
        need(buf, 1)?;
        match buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

impl Decode for i64 {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::I64)?;
        need(buf, 8)?;
        Ok(buf.get_i64())
    }
}

impl Decode for u64 {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::U64)?;
        need(buf, 8)?;
        Ok(buf.get_u64())
    }
}

impl Decode for f64 {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::F64)?;
        need(buf, 8)?;
        Ok(buf.get_f64())
    }
}

impl Decode for String {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::TEXT)?;
        let raw = take_sized(buf)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl Decode for Bytes {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::BLOB)?;
        take_sized(buf)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        expect_tag(buf, tag::LIST)?;
        need(buf, 4)?;
        let count = buf.get_u32() as usize;
        // Every element takes at least one byte, so a count larger than the
        // remaining payload is already known to be truncated.
        need(buf, count)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(buf)?);
        }
        Ok(items)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        need(buf, 1)?;
        match buf[0] {
            tag::NONE => {
                buf.advance(1);
                Ok(None)
            }
            tag::SOME => {
                buf.advance(1);
                T::decode(buf).map(Some)
            }
            // A bare value is accepted as `Some`, so a field can become
            // optional without rewriting stored payloads.
            _ => T::decode(buf).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_bytes;

    #[test]
    fn test_decode_truncated_text() {
        let mut payload = Bytes::from_static(&[tag::TEXT, 0, 0, 0, 5, b'a']);
        let err = String::decode(&mut payload).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEnd {
                needed: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut payload = Bytes::from_static(&[tag::TEXT, 0, 0, 0, 2, 0xC3, 0x28]);
        assert_eq!(
            String::decode(&mut payload).unwrap_err(),
            CodecError::InvalidUtf8
        );
    }

    #[test]
    fn test_decode_invalid_bool() {
        let mut payload = Bytes::from_static(&[tag::BOOL, 2]);
        assert_eq!(
            bool::decode(&mut payload).unwrap_err(),
            CodecError::InvalidBool(2)
        );
    }

    #[test]
    fn test_decode_list_count_beyond_payload() {
        let mut payload = Bytes::from_static(&[tag::LIST, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            Vec::<i64>::decode(&mut payload),
            Err(CodecError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_decode_blob_is_zero_copy_slice() {
        let mut payload = to_bytes(&Bytes::from_static(b"abc")).unwrap();
        let blob = Bytes::decode(&mut payload).unwrap();
        assert_eq!(&blob[..], b"abc");
        assert!(payload.is_empty());
    }

    #[test]
    fn test_option_accepts_bare_value() {
        let mut payload = to_bytes(&5i64).unwrap();
        assert_eq!(Option::<i64>::decode(&mut payload).unwrap(), Some(5));
    }

    #[test]
    fn test_decode_consumes_sequentially() {
        let mut raw = to_bytes(&1.5f64).unwrap().to_vec();
        raw.extend_from_slice(&to_bytes(&false).unwrap());
        let mut payload = Bytes::from(raw);
        assert_eq!(f64::decode(&mut payload).unwrap(), 1.5);
        assert!(!bool::decode(&mut payload).unwrap());
        assert!(payload.is_empty());
    }
}
