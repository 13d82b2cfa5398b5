//! Encoding half of the value codec.

use super::{tag, CodecError};
use bytes::{BufMut, Bytes, BytesMut};

/// A value that can be written into a payload.
///
/// Implementations append one complete tagged value to `buf`. The only
/// failure an encoder may report is a shape the format cannot represent,
/// such as a text or blob longer than `u32::MAX` bytes.
pub trait Encode {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;
}

/// Writes a u32 length prefix, rejecting lengths that do not fit.
fn put_len(buf: &mut BytesMut, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::TooLarge(len))?;
    buf.put_u32(len);
    Ok(())
}

impl Encode for bool {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::BOOL);
        buf.put_u8(u8::from(*self));
        Ok(())
    }
}

impl Encode for i64 {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::I64);
        buf.put_i64(*self);
        Ok(())
    }
}

impl Encode for u64 {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::U64);
        buf.put_u64(*self);
        Ok(())
    }
}

impl Encode for f64 {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::F64);
        buf.put_f64(*self);
        Ok(())
    }
}

impl Encode for str {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::TEXT);
        put_len(buf, self.len())?;
        buf.put_slice(self.as_bytes());
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.as_str().encode(buf)
    }
}

impl Encode for [u8] {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::BLOB);
        put_len(buf, self.len())?;
        buf.put_slice(self);
        Ok(())
    }
}

impl Encode for Bytes {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.as_ref().encode(buf)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(tag::LIST);
        put_len(buf, self.len())?;
        for item in self {
            item.encode(buf)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Some(inner) => {
                buf.put_u8(tag::SOME);
                inner.encode(buf)
            }
            None => {
                buf.put_u8(tag::NONE);
                Ok(())
            }
        }
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        (**self).encode(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<V: Encode + ?Sized>(value: &V) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_scalar_layout() {
        assert_eq!(encoded(&true), vec![tag::BOOL, 1]);
        assert_eq!(
            encoded(&-2i64),
            vec![tag::I64, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]
        );
        assert_eq!(encoded(&1u64), vec![tag::U64, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_text_layout() {
        assert_eq!(encoded("hi"), vec![tag::TEXT, 0, 0, 0, 2, b'h', b'i']);
        assert_eq!(encoded(&String::from("hi")), encoded("hi"));
    }

    #[test]
    fn test_blob_layout() {
        let raw: &[u8] = &[9, 8];
        assert_eq!(encoded(raw), vec![tag::BLOB, 0, 0, 0, 2, 9, 8]);
        assert_eq!(encoded(&Bytes::from_static(&[9, 8])), encoded(raw));
    }

    #[test]
    fn test_option_layout() {
        assert_eq!(encoded(&None::<bool>), vec![tag::NONE]);
        assert_eq!(encoded(&Some(false)), vec![tag::SOME, tag::BOOL, 0]);
    }
}
