//! Value Codec
//!
//! Turns typed values into the opaque byte payloads the store keeps, and back.
//! The store itself never looks inside a payload; it only length-prefixes it
//! when writing a snapshot.
//!
//! ## Wire Format
//!
//! Every value starts with a one-byte type tag:
//!
//! | Tag    | Type      | Body                                   |
//! |--------|-----------|----------------------------------------|
//! | `0x00` | none      | (empty)                                |
//! | `0x01` | some      | one nested value                       |
//! | `0x02` | bool      | 1 byte, `0` or `1`                     |
//! | `0x03` | i64       | 8 bytes, big-endian                    |
//! | `0x04` | u64       | 8 bytes, big-endian                    |
//! | `0x05` | f64       | 8 bytes, IEEE-754 bits, big-endian     |
//! | `0x06` | text      | u32 BE length + UTF-8 bytes            |
//! | `0x07` | blob      | u32 BE length + raw bytes              |
//! | `0x08` | list      | u32 BE element count + nested values   |
//!
//! The format is self-describing, so a decoder can report exactly which type
//! it found when the caller asked for another one.
//!
//! ## Example
//!
//! ```
//! use shardkv::codec::{from_bytes, to_bytes};
//!
//! let payload = to_bytes(&vec![String::from("a"), String::from("b")]).unwrap();
//! let back: Vec<String> = from_bytes(payload).unwrap();
//! assert_eq!(back, vec!["a", "b"]);
//! ```

pub mod decode;
pub mod encode;

pub use decode::Decode;
pub use encode::Encode;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Type tags used by the codec.
pub mod tag {
    pub const NONE: u8 = 0x00;
    pub const SOME: u8 = 0x01;
    pub const BOOL: u8 = 0x02;
    pub const I64: u8 = 0x03;
    pub const U64: u8 = 0x04;
    pub const F64: u8 = 0x05;
    pub const TEXT: u8 = 0x06;
    pub const BLOB: u8 = 0x07;
    pub const LIST: u8 = 0x08;

    /// Human-readable name of a tag, for error messages.
    pub fn name(tag: u8) -> &'static str {
        match tag {
            NONE => "none",
            SOME => "some",
            BOOL => "bool",
            I64 => "i64",
            U64 => "u64",
            F64 => "f64",
            TEXT => "text",
            BLOB => "blob",
            LIST => "list",
            _ => "unknown",
        }
    }
}

/// Errors that can occur while encoding or decoding a value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// A length does not fit the u32 length prefix
    #[error("value too large to encode: {0} bytes")]
    TooLarge(usize),

    /// The payload ended in the middle of a value
    #[error("unexpected end of payload: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// The payload holds a different type than the one requested
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The type tag is not part of the format
    #[error("unknown type tag: {0:#04x}")]
    UnknownTag(u8),

    /// A bool byte other than 0 or 1
    #[error("invalid bool byte: {0:#04x}")]
    InvalidBool(u8),

    /// Text payload is not valid UTF-8
    #[error("invalid UTF-8 in text value")]
    InvalidUtf8,

    /// A complete value was decoded but bytes were left over
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Encodes a value into a fresh payload.
pub fn to_bytes<V: Encode + ?Sized>(value: &V) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::new();
    value.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Decodes a payload into a value, requiring the payload to hold exactly one
/// value.
pub fn from_bytes<T: Decode>(mut payload: Bytes) -> Result<T, CodecError> {
    let value = T::decode(&mut payload)?;
    if !payload.is_empty() {
        return Err(CodecError::TrailingBytes(payload.len()));
    }
    Ok(value)
}
