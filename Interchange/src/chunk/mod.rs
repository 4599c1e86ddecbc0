//! Generic IFF chunk model
//!
//! Chunks are either *type* chunks (a content type tag followed by child
//! chunks) or *content* chunks (raw bytes). Every chunk is described by a
//! [`ChunkDefinition`] and records its absolute offset and its [`Relation`]
//! to the chunk it was laid out after.

mod builder;
mod definition;
mod identifier;
mod relation;
mod tree;

pub use builder::{ChunkBuilder, ContentBuilder, Placement, TypeBuilder};
pub use definition::{
    ChunkDefinition, ChunkKind, DefinitionInfo, Endian, HEADER_SIZE, MAX_CONTENT_LENGTH,
    TYPE_CHILD_RELATIVE_OFFSET,
};
pub use identifier::{ChunkIdentifier, IDENTIFIER_SIZE};
pub use relation::{Relation, sibling_target, validate_relations};
pub use tree::{ContentChunk, InterchangeChunk, TypeChunk, serialized_size};
