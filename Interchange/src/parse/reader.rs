//! Chunk tree parsing
//!
//! Parsing is all-or-nothing: any structural or resolution failure drops
//! the partially built tree and returns the error.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use super::io::CountingReader;
use super::resolver::{ContentBuilderFactory, TypeBuilderFactory, TypeResolver};
use crate::chunk::{
    ChunkIdentifier, ContentBuilder, ContentChunk, DefinitionInfo, Endian, HEADER_SIZE, InterchangeChunk,
    Placement, Relation, TypeChunk, serialized_size,
};
use crate::error::{Error, Result};
use crate::options::ParseOptions;

/// Read every top-level chunk from a file.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be opened, or any error from
/// [`read_chunks`].
///
/// [`Error::Io`]: crate::Error::Io
pub fn read_chunks_from_path<P: AsRef<Path>>(
    path: P,
    resolver: &TypeResolver,
    options: &ParseOptions,
) -> Result<Vec<InterchangeChunk>> {
    let file = File::open(path)?;
    read_chunks(BufReader::new(file), resolver, options)
}

/// Parse every top-level chunk from bytes.
pub fn parse_chunks_bytes(
    data: &[u8],
    resolver: &TypeResolver,
    options: &ParseOptions,
) -> Result<Vec<InterchangeChunk>> {
    read_chunks(Cursor::new(data), resolver, options)
}

/// Parse every top-level chunk until the stream ends.
///
/// Top-level chunks must be type chunks known to `resolver`; consecutive
/// top-level chunks are siblings.
///
/// # Errors
/// Structural errors ([`Error::MalformedIdentifier`],
/// [`Error::InvalidContentLength`], [`Error::UnexpectedEof`],
/// [`Error::ChunkOverrun`], ...) for corrupt input, resolution errors
/// ([`Error::UnrecognizedType`], [`Error::UnrecognizedContentType`],
/// [`Error::UnrecognizedChunk`]) for input the resolver does not understand.
///
/// [`Error::MalformedIdentifier`]: crate::Error::MalformedIdentifier
/// [`Error::InvalidContentLength`]: crate::Error::InvalidContentLength
/// [`Error::UnexpectedEof`]: crate::Error::UnexpectedEof
/// [`Error::ChunkOverrun`]: crate::Error::ChunkOverrun
/// [`Error::UnrecognizedType`]: crate::Error::UnrecognizedType
/// [`Error::UnrecognizedContentType`]: crate::Error::UnrecognizedContentType
/// [`Error::UnrecognizedChunk`]: crate::Error::UnrecognizedChunk
pub fn read_chunks<R: Read>(
    reader: R,
    resolver: &TypeResolver,
    options: &ParseOptions,
) -> Result<Vec<InterchangeChunk>> {
    let mut parser = ChunkParser {
        input: CountingReader::new(reader),
        resolver,
        options,
    };
    let chunks = parser.parse_top_level()?;
    tracing::debug!(chunks = chunks.len(), bytes = parser.input.position(), "parsed chunk stream");
    Ok(chunks)
}

struct ChunkParser<'a, R> {
    input: CountingReader<R>,
    resolver: &'a TypeResolver,
    options: &'a ParseOptions,
}

impl<R: Read> ChunkParser<'_, R> {
    fn parse_top_level(&mut self) -> Result<Vec<InterchangeChunk>> {
        let mut chunks: Vec<InterchangeChunk> = Vec::new();

        while let Some(tag) = self.input.read_tag_or_end()? {
            let offset = self.input.position() - 4;
            let identifier = Self::identifier(tag, offset)?;
            let factory = self
                .resolver
                .get(identifier)
                .ok_or(Error::UnrecognizedType { identifier, offset })?;

            let placement = Placement {
                offset,
                relation: Relation::for_position(chunks.len(), None),
                inherited: chunks.last().map(InterchangeChunk::resolved_endian),
            };
            let chunk = self.parse_type(factory, placement, None)?;

            // Writers commonly drop the pad byte after the final chunk.
            if chunk.content_length() % 2 == 1 {
                self.input.skip_optional_byte()?;
            }
            chunks.push(InterchangeChunk::Type(chunk));
        }

        Ok(chunks)
    }

    /// Parse a type chunk whose identifier has been consumed.
    fn parse_type(
        &mut self,
        factory: &TypeBuilderFactory,
        placement: Placement,
        limit: Option<u64>,
    ) -> Result<TypeChunk> {
        let definition = factory.definition();
        let identifier = definition.identifier();
        let offset = placement.offset;
        let endian = definition.resolve_endian(placement.inherited)?;
        let length = self.read_length(endian)?;
        Self::check_within(identifier, offset, length, limit)?;
        definition.validate_length(length, offset)?;

        let mut tag = [0u8; 4];
        self.input.read_exact_or_eof(&mut tag, "content type")?;
        let content_type = ChunkIdentifier::from_bytes(tag).map_err(|_| Error::MalformedContentType {
            identifier,
            found: tag,
            offset,
        })?;
        let content_factory = factory.content_resolver().resolve(content_type).ok_or(
            Error::UnrecognizedContentType {
                identifier,
                content_type,
                offset,
            },
        )?;

        tracing::debug!(%identifier, %content_type, offset, length, "type chunk");

        let end = offset + HEADER_SIZE + length;
        let children =
            self.parse_children(content_factory, identifier, content_type, placement.index(), endian, end)?;

        factory
            .create_builder(self.options.read_only)
            .content_type(content_type)
            .finish_parsed(placement, endian, length, children)
    }

    fn parse_children(
        &mut self,
        factory: &ContentBuilderFactory,
        container: ChunkIdentifier,
        content_type: ChunkIdentifier,
        container_index: usize,
        container_endian: Endian,
        end: u64,
    ) -> Result<Vec<InterchangeChunk>> {
        let mut children: Vec<InterchangeChunk> = Vec::new();
        let mut inherited = container_endian;

        while self.input.position() < end {
            let offset = self.input.position();
            let available = end - offset;
            if available < HEADER_SIZE {
                return Err(Error::ChunkOverrun {
                    identifier: container,
                    offset,
                    needed: HEADER_SIZE,
                    available,
                });
            }

            let mut tag = [0u8; 4];
            self.input.read_exact_or_eof(&mut tag, "chunk header")?;
            let identifier = Self::identifier(tag, offset)?;
            let placement = Placement {
                offset,
                relation: Relation::for_position(children.len(), Some(container_index)),
                inherited: Some(inherited),
            };

            let read_only = self.options.read_only;
            let child = if let Some(builder) = factory.create_known(identifier, read_only) {
                InterchangeChunk::Content(self.parse_content(builder, placement, end)?)
            } else if let Some(nested) = self.resolver.get(identifier) {
                InterchangeChunk::Type(self.parse_type(nested, placement, Some(end))?)
            } else if let Some(builder) = (!self.options.strict)
                .then(|| factory.create_opaque(identifier, read_only))
                .flatten()
            {
                InterchangeChunk::Content(self.parse_content(builder, placement, end)?)
            } else {
                return Err(Error::UnrecognizedChunk {
                    identifier,
                    content_type,
                    offset,
                });
            };

            // The pad byte belongs to the container only when it fits inside it.
            if child.content_length() % 2 == 1 && self.input.position() < end {
                let mut pad = [0u8; 1];
                self.input.read_exact_or_eof(&mut pad, "pad byte")?;
            }

            inherited = child.resolved_endian();
            children.push(child);
        }

        Ok(children)
    }

    fn parse_content(
        &mut self,
        builder: ContentBuilder,
        placement: Placement,
        end: u64,
    ) -> Result<ContentChunk> {
        let definition = *builder.definition();
        let identifier = definition.identifier();
        let endian = definition.resolve_endian(placement.inherited)?;
        let length = self.read_length(endian)?;
        Self::check_within(identifier, placement.offset, length, Some(end))?;
        definition.validate_length(length, placement.offset)?;

        let bytes = self.input.read_owned(length, identifier.as_str())?;
        tracing::debug!(%identifier, offset = placement.offset, length, "content chunk");

        builder.content(bytes).build_at(placement)
    }

    fn read_length(&mut self, endian: Endian) -> Result<u64> {
        let mut raw = [0u8; 4];
        self.input.read_exact_or_eof(&mut raw, "chunk length")?;
        Ok(u64::from(endian.read_u32(&raw)))
    }

    // A child may omit its pad byte at the very end of its container, so only
    // the unpadded size must fit.
    fn check_within(identifier: ChunkIdentifier, offset: u64, length: u64, limit: Option<u64>) -> Result<()> {
        let Some(end) = limit else {
            return Ok(());
        };
        let unpadded = HEADER_SIZE + length;
        if offset + unpadded > end {
            return Err(Error::ChunkOverrun {
                identifier,
                offset,
                needed: serialized_size(length),
                available: end - offset,
            });
        }
        Ok(())
    }

    fn identifier(tag: [u8; 4], offset: u64) -> Result<ChunkIdentifier> {
        ChunkIdentifier::from_bytes(tag).map_err(|_| Error::MalformedIdentifier { found: tag, offset })
    }
}
