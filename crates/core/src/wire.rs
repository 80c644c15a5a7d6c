//! Wire encoding for identities, built on postcard.
//!
//! Tag bytes are raw `u8`s and identifiers travel as their `namespace:path`
//! string, which postcard frames as `[length: varint][utf8 bytes]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{Identifier, IdentifierError};

/// Longest string accepted on the wire, in bytes.
pub const MAX_STRING_LEN: usize = 32_767;

/// Errors raised while encoding or decoding wire data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended before a value was complete.
    #[error("unexpected end of buffer")]
    Truncated,
    /// A length prefix was not a valid varint.
    #[error("malformed varint length prefix")]
    BadVarInt,
    /// A string was longer than [`MAX_STRING_LEN`].
    #[error("string length {0} exceeds maximum {}", MAX_STRING_LEN)]
    StringTooLong(usize),
    /// String bytes were not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// A string decoded fine but is not a valid identifier.
    #[error("invalid identifier on the wire: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
    /// A tag byte did not select any known encoding.
    #[error("unknown wire tag {0}")]
    UnknownTag(u8),
    /// Any other postcard failure.
    #[error("postcard: {0}")]
    Codec(postcard::Error),
}

impl From<postcard::Error> for WireError {
    fn from(err: postcard::Error) -> Self {
        match err {
            postcard::Error::DeserializeUnexpectedEnd => WireError::Truncated,
            postcard::Error::DeserializeBadVarint => WireError::BadVarInt,
            postcard::Error::DeserializeBadUtf8 => WireError::InvalidUtf8,
            other => WireError::Codec(other),
        }
    }
}

/// Append-only wire buffer.
#[derive(Debug, Default, Clone)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WireError> {
        let bytes = postcard::to_allocvec(value)?;
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.put(&value)
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        if value.len() > MAX_STRING_LEN {
            return Err(WireError::StringTooLong(value.len()));
        }
        self.put(value)
    }

    /// Write an identifier as its `namespace:path` string.
    pub fn write_identifier(&mut self, id: &Identifier) -> Result<(), WireError> {
        self.write_string(&id.to_string())
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over received wire bytes.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    rest: &'a [u8],
}

impl<'a> PacketReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    fn take<T: Deserialize<'a>>(&mut self) -> Result<T, WireError> {
        let (value, rest) = postcard::take_from_bytes::<T>(self.rest)?;
        self.rest = rest;
        Ok(value)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, WireError> {
        self.rest.first().copied().ok_or(WireError::Truncated)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        self.take()
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<&'a str, WireError> {
        let value: &'a str = self.take()?;
        if value.len() > MAX_STRING_LEN {
            return Err(WireError::StringTooLong(value.len()));
        }
        Ok(value)
    }

    /// Read an identifier string.
    pub fn read_identifier(&mut self) -> Result<Identifier, WireError> {
        let raw = self.read_string()?;
        Ok(Identifier::parse(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_is_a_varint() {
        let short = "a".repeat(127);
        let long = "b".repeat(128);
        let mut writer = PacketWriter::new();
        writer.write_string(&short).unwrap();
        writer.write_string(&long).unwrap();

        let bytes = writer.as_bytes();
        assert_eq!(bytes[0], 0x7F);
        assert_eq!(&bytes[128..130], &[0x80, 0x01]);

        let mut reader = PacketReader::new(bytes);
        assert_eq!(reader.read_string().unwrap(), short);
        assert_eq!(reader.read_string().unwrap(), long);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn tag_byte_is_raw() {
        let mut writer = PacketWriter::new();
        writer.write_u8(3).unwrap();
        writer.write_u8(255).unwrap();
        assert_eq!(writer.as_bytes(), &[3, 255]);
    }

    #[test]
    fn rejects_overlong_varint() {
        let data = [0xFF; 11];
        let mut reader = PacketReader::new(&data);
        assert_eq!(reader.read_string(), Err(WireError::BadVarInt));
    }

    #[test]
    fn rejects_truncated_string() {
        let data = [5, b'a', b'b'];
        let mut reader = PacketReader::new(&data);
        assert_eq!(reader.read_string(), Err(WireError::Truncated));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let data = [2, 0xC3, 0x28];
        let mut reader = PacketReader::new(&data);
        assert_eq!(reader.read_string(), Err(WireError::InvalidUtf8));
    }

    #[test]
    fn empty_buffer_is_truncated() {
        let mut reader = PacketReader::new(&[]);
        assert_eq!(reader.peek_u8(), Err(WireError::Truncated));
        assert_eq!(reader.read_u8(), Err(WireError::Truncated));
    }

    #[test]
    fn oversized_strings_are_refused() {
        let huge = "x".repeat(MAX_STRING_LEN + 1);
        let mut writer = PacketWriter::new();
        assert_eq!(
            writer.write_string(&huge),
            Err(WireError::StringTooLong(MAX_STRING_LEN + 1))
        );
        assert!(writer.as_bytes().is_empty());
    }

    #[test]
    fn identifier_is_written_as_string() {
        let id = Identifier::parse("mdm:water").unwrap();
        let mut writer = PacketWriter::new();
        writer.write_identifier(&id).unwrap();

        let bytes = writer.into_bytes();
        assert_eq!(bytes[0] as usize, "mdm:water".len());
        assert_eq!(&bytes[1..], b"mdm:water");

        let mut reader = PacketReader::new(&bytes);
        assert_eq!(reader.read_identifier().unwrap(), id);
    }
}
