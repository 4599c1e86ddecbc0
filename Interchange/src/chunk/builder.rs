//! Builders: the only way to materialize chunks
//!
//! A [`TypeBuilder`] collects child builders and places the whole tree in one
//! `build()`, so every offset, relation and inherited byte order is fixed when
//! the chunk is created and never changes afterwards.

use super::{
    ChunkDefinition, ChunkIdentifier, ContentChunk, DefinitionInfo, Endian, HEADER_SIZE,
    InterchangeChunk, Relation, TypeChunk,
};
use crate::error::{Error, Result};

/// Where a chunk lands: header offset, relation and the byte order of its
/// relation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub offset: u64,
    pub relation: Relation,
    pub inherited: Option<Endian>,
}

impl Placement {
    /// A root chunk at the start of a stream.
    pub const ROOT: Placement = Placement {
        offset: 0,
        relation: Relation::Root,
        inherited: None,
    };

    /// A root chunk at an arbitrary absolute offset.
    pub const fn root_at(offset: u64) -> Self {
        Placement {
            offset,
            relation: Relation::Root,
            inherited: None,
        }
    }

    /// Index of the placed chunk within its own sequence.
    pub(crate) const fn index(&self) -> usize {
        match self.relation {
            Relation::Root | Relation::ChildOf(_) => 0,
            Relation::SiblingOf(previous) => previous + 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Content {
    Bytes(Vec<u8>),
    Zeroed(u64),
}

/// Builder for [`ContentChunk`]s.
#[derive(Debug, Clone)]
pub struct ContentBuilder {
    definition: ChunkDefinition,
    read_only: bool,
    content: Content,
}

impl ContentBuilder {
    pub fn new(definition: ChunkDefinition) -> Self {
        Self {
            definition,
            read_only: false,
            content: Content::Bytes(Vec::new()),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Take ownership of the content; its length becomes the content length.
    #[must_use]
    pub fn content(mut self, bytes: Vec<u8>) -> Self {
        self.content = Content::Bytes(bytes);
        self
    }

    /// Zero-filled content of the given length.
    #[must_use]
    pub fn content_length(mut self, length: u64) -> Self {
        self.content = Content::Zeroed(length);
        self
    }

    pub fn definition(&self) -> &ChunkDefinition {
        &self.definition
    }

    /// Build a root chunk at offset 0.
    ///
    /// # Errors
    /// Returns [`Error::InvalidContentLength`] if the content violates the
    /// definition's bounds and [`Error::UndefinedEndianness`] if the
    /// definition declares no byte order.
    ///
    /// [`Error::InvalidContentLength`]: crate::Error::InvalidContentLength
    /// [`Error::UndefinedEndianness`]: crate::Error::UndefinedEndianness
    pub fn build(self) -> Result<ContentChunk> {
        self.build_at(Placement::ROOT)
    }

    pub fn build_at(self, placement: Placement) -> Result<ContentChunk> {
        let endian = self.definition.resolve_endian(placement.inherited)?;
        let length = match &self.content {
            Content::Bytes(bytes) => bytes.len() as u64,
            Content::Zeroed(length) => *length,
        };
        self.definition.validate_length(length, placement.offset)?;
        let bytes = match self.content {
            Content::Bytes(bytes) => bytes,
            Content::Zeroed(length) => vec![0; length as usize],
        };

        Ok(ContentChunk {
            definition: self.definition,
            content_length: length,
            relation: placement.relation,
            endian,
            bytes,
            read_only: self.read_only,
            offset: placement.offset,
        })
    }
}

/// Builder for [`TypeChunk`]s.
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    definition: ChunkDefinition,
    read_only: bool,
    content_type: Option<ChunkIdentifier>,
    children: Vec<ChunkBuilder>,
}

impl TypeBuilder {
    pub fn new(definition: ChunkDefinition) -> Self {
        Self {
            definition,
            read_only: false,
            content_type: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: ChunkIdentifier) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Append a child; children are laid out in insertion order.
    #[must_use]
    pub fn child(mut self, child: impl Into<ChunkBuilder>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn definition(&self) -> &ChunkDefinition {
        &self.definition
    }

    /// Build a root chunk at offset 0.
    ///
    /// # Errors
    /// Returns [`Error::MissingContentType`] if no content type was set, or any
    /// error raised while building a child.
    ///
    /// [`Error::MissingContentType`]: crate::Error::MissingContentType
    pub fn build(self) -> Result<TypeChunk> {
        self.build_at(Placement::ROOT)
    }

    pub fn build_at(self, placement: Placement) -> Result<TypeChunk> {
        let endian = self.definition.resolve_endian(placement.inherited)?;
        let content_type = self.require_content_type()?;
        let first_child = placement.offset + HEADER_SIZE + self.definition.child_relative_offset();

        let mut next = first_child;
        let mut inherited = endian;
        let mut children = Vec::with_capacity(self.children.len());
        for (index, builder) in self.children.into_iter().enumerate() {
            let child = builder.build_at(Placement {
                offset: next,
                relation: Relation::for_position(index, Some(placement.index())),
                inherited: Some(inherited),
            })?;
            next += child.serialized_size();
            inherited = child.resolved_endian();
            children.push(child);
        }

        let content_length = self.definition.child_relative_offset() + (next - first_child);
        self.definition.validate_length(content_length, placement.offset)?;

        Ok(TypeChunk {
            definition: self.definition,
            content_length,
            relation: placement.relation,
            endian,
            content_type,
            children,
            read_only: self.read_only,
            offset: placement.offset,
        })
    }

    /// Finish a type chunk whose children were already materialized by the parser.
    pub(crate) fn finish_parsed(
        self,
        placement: Placement,
        endian: Endian,
        content_length: u64,
        children: Vec<InterchangeChunk>,
    ) -> Result<TypeChunk> {
        let content_type = self.require_content_type()?;
        self.definition.validate_length(content_length, placement.offset)?;
        Ok(TypeChunk {
            definition: self.definition,
            content_length,
            relation: placement.relation,
            endian,
            content_type,
            children,
            read_only: self.read_only,
            offset: placement.offset,
        })
    }

    fn require_content_type(&self) -> Result<ChunkIdentifier> {
        self.content_type.ok_or(Error::MissingContentType {
            identifier: self.definition.identifier(),
        })
    }
}

/// Either kind of builder, for mixed child lists.
#[derive(Debug, Clone)]
pub enum ChunkBuilder {
    Type(TypeBuilder),
    Content(ContentBuilder),
}

impl ChunkBuilder {
    pub fn build_at(self, placement: Placement) -> Result<InterchangeChunk> {
        match self {
            ChunkBuilder::Type(b) => b.build_at(placement).map(InterchangeChunk::Type),
            ChunkBuilder::Content(b) => b.build_at(placement).map(InterchangeChunk::Content),
        }
    }
}

impl From<TypeBuilder> for ChunkBuilder {
    fn from(builder: TypeBuilder) -> Self {
        ChunkBuilder::Type(builder)
    }
}

impl From<ContentBuilder> for ChunkBuilder {
    fn from(builder: ContentBuilder) -> Self {
        ChunkBuilder::Content(builder)
    }
}
