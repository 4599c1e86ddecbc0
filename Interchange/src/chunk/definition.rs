//! Chunk definitions: immutable descriptors shared by every chunk of one identifier

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;

use super::ChunkIdentifier;
use crate::error::{Error, Result};

/// Size of the identifier + length header preceding every chunk
pub const HEADER_SIZE: u64 = 8;

/// Largest content length a 32-bit length field can carry
pub const MAX_CONTENT_LENGTH: u64 = 0xFFFF_FFFF;

/// Child offset of a type chunk: the 4-byte content type tag
pub const TYPE_CHILD_RELATIVE_OFFSET: u64 = 4;

/// Byte order of a chunk's length field and multi-byte content accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    pub fn read_u64(self, buf: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(buf),
            Endian::Big => BigEndian::read_u64(buf),
        }
    }

    pub fn write_u16(self, buf: &mut [u8], value: u16) {
        match self {
            Endian::Little => LittleEndian::write_u16(buf, value),
            Endian::Big => BigEndian::write_u16(buf, value),
        }
    }

    pub fn write_u32(self, buf: &mut [u8], value: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(buf, value),
            Endian::Big => BigEndian::write_u32(buf, value),
        }
    }

    pub fn write_u64(self, buf: &mut [u8], value: u64) {
        match self {
            Endian::Little => LittleEndian::write_u64(buf, value),
            Endian::Big => BigEndian::write_u64(buf, value),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => f.write_str("little-endian"),
            Endian::Big => f.write_str("big-endian"),
        }
    }
}

/// Common read-only view of definitions and chunk instances.
///
/// On a chunk instance `endian()` is the resolved byte order, including
/// anything inherited through its relation.
pub trait DefinitionInfo {
    fn identifier(&self) -> ChunkIdentifier;
    fn endian(&self) -> Option<Endian>;
    fn child_relative_offset(&self) -> u64;
}

/// Whether chunks of a definition hold children or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Type,
    Content,
}

/// Descriptor for every chunk carrying one identifier.
///
/// Definitions are plain constants; chunks copy the descriptor they were
/// built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkDefinition {
    identifier: ChunkIdentifier,
    kind: ChunkKind,
    endian: Option<Endian>,
    child_relative_offset: u64,
    max_content_length: u64,
}

impl ChunkDefinition {
    /// A container chunk whose content starts with a 4-byte content type.
    pub const fn type_chunk(identifier: ChunkIdentifier, endian: Option<Endian>) -> Self {
        Self {
            identifier,
            kind: ChunkKind::Type,
            endian,
            child_relative_offset: TYPE_CHILD_RELATIVE_OFFSET,
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }

    /// A raw-data chunk that inherits its byte order.
    pub const fn content(identifier: ChunkIdentifier) -> Self {
        Self {
            identifier,
            kind: ChunkKind::Content,
            endian: None,
            child_relative_offset: 0,
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }

    #[must_use]
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Reserve a fixed prefix in a content chunk. Type chunks always start
    /// their children after the 4-byte content type.
    #[must_use]
    pub const fn with_child_relative_offset(mut self, offset: u64) -> Self {
        assert!(matches!(self.kind, ChunkKind::Content), "type chunks reserve exactly the content type");
        assert!(offset <= self.max_content_length, "child offset exceeds maximum length");
        self.child_relative_offset = offset;
        self
    }

    /// Lower the maximum content length; values above 32 bits are capped.
    #[must_use]
    pub const fn with_max_content_length(mut self, max: u64) -> Self {
        let max = if max > MAX_CONTENT_LENGTH { MAX_CONTENT_LENGTH } else { max };
        assert!(self.child_relative_offset <= max, "maximum length below child offset");
        self.max_content_length = max;
        self
    }

    #[inline]
    pub const fn kind(&self) -> ChunkKind {
        self.kind
    }

    #[inline]
    pub const fn max_content_length(&self) -> u64 {
        self.max_content_length
    }

    /// Check a content length against `[child_relative_offset, max_content_length]`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidContentLength`] naming this definition and the
    /// chunk offset.
    ///
    /// [`Error::InvalidContentLength`]: crate::Error::InvalidContentLength
    pub fn validate_length(&self, length: u64, offset: u64) -> Result<u64> {
        if length < self.child_relative_offset || length > self.max_content_length {
            return Err(Error::InvalidContentLength {
                identifier: self.identifier,
                length,
                min: self.child_relative_offset,
                max: self.max_content_length,
                offset,
            });
        }
        Ok(length)
    }

    /// Resolve the byte order, falling back to the relation target's.
    pub fn resolve_endian(&self, inherited: Option<Endian>) -> Result<Endian> {
        self.endian.or(inherited).ok_or(Error::UndefinedEndianness {
            identifier: self.identifier,
        })
    }
}

impl DefinitionInfo for ChunkDefinition {
    fn identifier(&self) -> ChunkIdentifier {
        self.identifier
    }

    fn endian(&self) -> Option<Endian> {
        self.endian
    }

    fn child_relative_offset(&self) -> u64 {
        self.child_relative_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: ChunkDefinition = ChunkDefinition::content(ChunkIdentifier::from_const(*b"data"));

    #[test]
    fn test_length_bounds() {
        assert_eq!(DATA.validate_length(0, 0).unwrap(), 0);
        assert_eq!(DATA.validate_length(MAX_CONTENT_LENGTH, 0).unwrap(), MAX_CONTENT_LENGTH);

        let err = DATA.validate_length(MAX_CONTENT_LENGTH + 1, 36).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidContentLength { length, offset: 36, .. } if length == MAX_CONTENT_LENGTH + 1
        ));
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn test_type_chunk_minimum() {
        let riff = ChunkDefinition::type_chunk(ChunkIdentifier::from_const(*b"RIFF"), Some(Endian::Little));
        assert_eq!(riff.child_relative_offset(), 4);
        assert!(riff.validate_length(3, 0).is_err());
        assert!(riff.validate_length(4, 0).is_ok());
    }

    #[test]
    fn test_capped_maximum() {
        let small = DATA.with_max_content_length(16);
        assert!(small.validate_length(17, 0).is_err());
        assert_eq!(DATA.with_max_content_length(u64::MAX).max_content_length(), MAX_CONTENT_LENGTH);
    }

    #[test]
    fn test_endian_resolution() {
        assert_eq!(DATA.resolve_endian(Some(Endian::Big)).unwrap(), Endian::Big);
        assert_eq!(
            DATA.with_endian(Endian::Little).resolve_endian(Some(Endian::Big)).unwrap(),
            Endian::Little
        );
        assert!(matches!(DATA.resolve_endian(None), Err(Error::UndefinedEndianness { .. })));
    }

    #[test]
    fn test_endian_accessors() {
        let mut buf = [0u8; 8];
        Endian::Big.write_u32(&mut buf, 0x0102_0304);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(Endian::Little.read_u32(&buf), 0x0403_0201);
        Endian::Little.write_u64(&mut buf, 0x0807_0605_0403_0201);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Endian::Big.read_u16(&buf), 0x0102);
    }
}
