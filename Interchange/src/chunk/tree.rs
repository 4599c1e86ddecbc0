//! Chunk instances: type chunks own children, content chunks own bytes

use std::fmt;

use super::{
    ChunkDefinition, ChunkIdentifier, DefinitionInfo, Endian, HEADER_SIZE, Relation,
};
use crate::error::{Error, Result};

/// Bytes a chunk occupies on the wire: header, content and the IFF pad byte.
#[inline]
pub const fn serialized_size(content_length: u64) -> u64 {
    HEADER_SIZE + content_length + (content_length & 1)
}

/// A parsed or built chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum InterchangeChunk {
    Type(TypeChunk),
    Content(ContentChunk),
}

/// A container chunk: content type tag followed by child chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeChunk {
    pub(crate) definition: ChunkDefinition,
    pub(crate) content_length: u64,
    pub(crate) relation: Relation,
    pub(crate) endian: Endian,
    pub(crate) content_type: ChunkIdentifier,
    pub(crate) children: Vec<InterchangeChunk>,
    pub(crate) read_only: bool,
    pub(crate) offset: u64,
}

/// A raw-data chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChunk {
    pub(crate) definition: ChunkDefinition,
    pub(crate) content_length: u64,
    pub(crate) relation: Relation,
    pub(crate) endian: Endian,
    pub(crate) bytes: Vec<u8>,
    pub(crate) read_only: bool,
    pub(crate) offset: u64,
}

impl InterchangeChunk {
    #[inline]
    pub fn definition(&self) -> &ChunkDefinition {
        match self {
            InterchangeChunk::Type(c) => &c.definition,
            InterchangeChunk::Content(c) => &c.definition,
        }
    }

    #[inline]
    pub fn content_length(&self) -> u64 {
        match self {
            InterchangeChunk::Type(c) => c.content_length,
            InterchangeChunk::Content(c) => c.content_length,
        }
    }

    #[inline]
    pub fn relation(&self) -> Relation {
        match self {
            InterchangeChunk::Type(c) => c.relation,
            InterchangeChunk::Content(c) => c.relation,
        }
    }

    /// Absolute position of the chunk header.
    #[inline]
    pub fn offset(&self) -> u64 {
        match self {
            InterchangeChunk::Type(c) => c.offset,
            InterchangeChunk::Content(c) => c.offset,
        }
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        match self {
            InterchangeChunk::Type(c) => c.read_only,
            InterchangeChunk::Content(c) => c.read_only,
        }
    }

    /// Resolved byte order of this chunk.
    #[inline]
    pub fn resolved_endian(&self) -> Endian {
        match self {
            InterchangeChunk::Type(c) => c.endian,
            InterchangeChunk::Content(c) => c.endian,
        }
    }

    /// Bytes this chunk occupies on the wire, pad byte included.
    pub fn serialized_size(&self) -> u64 {
        serialized_size(self.content_length())
    }

    pub fn as_type(&self) -> Option<&TypeChunk> {
        match self {
            InterchangeChunk::Type(c) => Some(c),
            InterchangeChunk::Content(_) => None,
        }
    }

    pub fn as_content(&self) -> Option<&ContentChunk> {
        match self {
            InterchangeChunk::Content(c) => Some(c),
            InterchangeChunk::Type(_) => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentChunk> {
        match self {
            InterchangeChunk::Content(c) => Some(c),
            InterchangeChunk::Type(_) => None,
        }
    }
}

impl DefinitionInfo for InterchangeChunk {
    fn identifier(&self) -> ChunkIdentifier {
        self.definition().identifier()
    }

    fn endian(&self) -> Option<Endian> {
        Some(self.resolved_endian())
    }

    fn child_relative_offset(&self) -> u64 {
        self.definition().child_relative_offset()
    }
}

impl From<TypeChunk> for InterchangeChunk {
    fn from(chunk: TypeChunk) -> Self {
        InterchangeChunk::Type(chunk)
    }
}

impl From<ContentChunk> for InterchangeChunk {
    fn from(chunk: ContentChunk) -> Self {
        InterchangeChunk::Content(chunk)
    }
}

impl fmt::Display for InterchangeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeChunk::Type(c) => c.fmt(f),
            InterchangeChunk::Content(c) => c.fmt(f),
        }
    }
}

// =============================================================================
// Type chunks
// =============================================================================

impl TypeChunk {
    #[inline]
    pub fn definition(&self) -> &ChunkDefinition {
        &self.definition
    }

    #[inline]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    #[inline]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    #[inline]
    pub fn content_type(&self) -> ChunkIdentifier {
        self.content_type
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn resolved_endian(&self) -> Endian {
        self.endian
    }

    /// Children in encounter order.
    #[inline]
    pub fn children(&self) -> &[InterchangeChunk] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&InterchangeChunk> {
        self.children.get(index)
    }

    /// Mutable access to a child.
    ///
    /// # Errors
    /// Returns [`Error::ReadOnly`] if this chunk is read-only.
    ///
    /// [`Error::ReadOnly`]: crate::Error::ReadOnly
    pub fn child_mut(&mut self, index: usize) -> Result<Option<&mut InterchangeChunk>> {
        self.ensure_writable()?;
        Ok(self.children.get_mut(index))
    }

    /// First direct child with the given identifier.
    pub fn find(&self, identifier: ChunkIdentifier) -> Option<&InterchangeChunk> {
        self.children.iter().find(|c| c.identifier() == identifier)
    }

    /// First direct content child with the given identifier.
    pub fn find_content(&self, identifier: ChunkIdentifier) -> Option<&ContentChunk> {
        self.find(identifier).and_then(InterchangeChunk::as_content)
    }

    /// Index of the first direct child with the given identifier.
    pub fn position(&self, identifier: ChunkIdentifier) -> Option<usize> {
        self.children.iter().position(|c| c.identifier() == identifier)
    }

    /// Absolute position of the first child header.
    pub fn children_offset(&self) -> u64 {
        self.offset + HEADER_SIZE + self.definition.child_relative_offset()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly {
                identifier: self.definition.identifier(),
            });
        }
        Ok(())
    }
}

impl DefinitionInfo for TypeChunk {
    fn identifier(&self) -> ChunkIdentifier {
        self.definition.identifier()
    }

    fn endian(&self) -> Option<Endian> {
        Some(self.endian)
    }

    fn child_relative_offset(&self) -> u64 {
        self.definition.child_relative_offset()
    }
}

impl fmt::Display for TypeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[endianness={}; content-type={}; content-length={}; offset={}]",
            self.identifier(),
            self.endian,
            self.content_type,
            self.content_length,
            self.offset
        )
    }
}

// =============================================================================
// Content chunks
// =============================================================================

impl ContentChunk {
    #[inline]
    pub fn definition(&self) -> &ChunkDefinition {
        &self.definition
    }

    #[inline]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    #[inline]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn resolved_endian(&self) -> Endian {
        self.endian
    }

    /// The raw content, pad byte excluded.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Absolute position of the first content byte.
    pub fn content_offset(&self) -> u64 {
        self.offset + HEADER_SIZE
    }

    /// Mutable access to the whole content.
    ///
    /// # Errors
    /// Returns [`Error::ReadOnly`] if this chunk is read-only.
    ///
    /// [`Error::ReadOnly`]: crate::Error::ReadOnly
    pub fn content_mut(&mut self) -> Result<&mut [u8]> {
        self.ensure_writable()?;
        Ok(&mut self.bytes)
    }

    pub fn byte_at(&self, offset: u64) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn word_at(&self, offset: u64) -> Result<u16> {
        Ok(self.endian.read_u16(self.slice(offset, 2)?))
    }

    pub fn dword_at(&self, offset: u64) -> Result<u32> {
        Ok(self.endian.read_u32(self.slice(offset, 4)?))
    }

    pub fn qword_at(&self, offset: u64) -> Result<u64> {
        Ok(self.endian.read_u64(self.slice(offset, 8)?))
    }

    /// The `width` bytes starting at `offset`.
    pub fn bytes_at(&self, offset: u64, width: u64) -> Result<&[u8]> {
        self.slice(offset, width)
    }

    pub fn set_byte_at(&mut self, offset: u64, value: u8) -> Result<()> {
        self.slice_mut(offset, 1)?[0] = value;
        Ok(())
    }

    pub fn set_word_at(&mut self, offset: u64, value: u16) -> Result<()> {
        let endian = self.endian;
        endian.write_u16(self.slice_mut(offset, 2)?, value);
        Ok(())
    }

    pub fn set_dword_at(&mut self, offset: u64, value: u32) -> Result<()> {
        let endian = self.endian;
        endian.write_u32(self.slice_mut(offset, 4)?, value);
        Ok(())
    }

    pub fn set_qword_at(&mut self, offset: u64, value: u64) -> Result<()> {
        let endian = self.endian;
        endian.write_u64(self.slice_mut(offset, 8)?, value);
        Ok(())
    }

    /// Overwrite `data.len()` bytes starting at `offset`.
    pub fn set_bytes_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.slice_mut(offset, data.len() as u64)?.copy_from_slice(data);
        Ok(())
    }

    fn bounds(&self, offset: u64, width: u64) -> Result<std::ops::Range<usize>> {
        match offset.checked_add(width) {
            Some(end) if end <= self.content_length => Ok(offset as usize..end as usize),
            _ => Err(Error::AccessOutOfBounds {
                identifier: self.definition.identifier(),
                offset,
                width,
                length: self.content_length,
            }),
        }
    }

    fn slice(&self, offset: u64, width: u64) -> Result<&[u8]> {
        let range = self.bounds(offset, width)?;
        Ok(&self.bytes[range])
    }

    // Read-only is checked before bounds so a rejected write never touches the buffer.
    fn slice_mut(&mut self, offset: u64, width: u64) -> Result<&mut [u8]> {
        self.ensure_writable()?;
        let range = self.bounds(offset, width)?;
        Ok(&mut self.bytes[range])
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly {
                identifier: self.definition.identifier(),
            });
        }
        Ok(())
    }
}

impl DefinitionInfo for ContentChunk {
    fn identifier(&self) -> ChunkIdentifier {
        self.definition.identifier()
    }

    fn endian(&self) -> Option<Endian> {
        Some(self.endian)
    }

    fn child_relative_offset(&self) -> u64 {
        self.definition.child_relative_offset()
    }
}

impl fmt::Display for ContentChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[endianness={}; content-length={}; offset={}]",
            self.identifier(),
            self.endian,
            self.content_length,
            self.offset
        )
    }
}
