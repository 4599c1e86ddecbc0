//! Chunk tree serialization

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::io::CountingWriter;
use crate::chunk::{
    ContentChunk, DefinitionInfo, InterchangeChunk, TypeChunk, validate_relations,
};
use crate::error::{Error, Result};

/// Write a sequence of top-level chunks to a file.
///
/// # Errors
/// Returns an error if the file cannot be created or any chunk fails to
/// serialize.
pub fn write_chunks_to_path<P: AsRef<Path>>(path: P, chunks: &[InterchangeChunk]) -> Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let written = write_chunks(&mut writer, chunks)?;
    writer.flush()?;
    Ok(written)
}

/// Serialize a sequence of top-level chunks into memory.
pub fn serialize_chunks(chunks: &[InterchangeChunk]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_chunks(&mut out, chunks)?;
    Ok(out)
}

/// Write a sequence of top-level chunks; returns the bytes written.
///
/// # Errors
/// Returns [`Error::InvalidRelation`] if a relation does not match its
/// position and [`Error::ContentLengthMismatch`] if a recorded length
/// disagrees with the bytes present.
///
/// [`Error::InvalidRelation`]: crate::Error::InvalidRelation
/// [`Error::ContentLengthMismatch`]: crate::Error::ContentLengthMismatch
pub fn write_chunks<W: Write>(writer: &mut W, chunks: &[InterchangeChunk]) -> Result<u64> {
    validate_relations(chunks, None)?;
    let mut out = CountingWriter::new(writer);
    for chunk in chunks {
        write_into(&mut out, chunk, true)?;
    }
    tracing::debug!(chunks = chunks.len(), bytes = out.position(), "wrote chunk stream");
    Ok(out.position())
}

/// Write one chunk, pad byte included; returns the bytes written.
///
/// Read-only chunks are written like any other.
pub fn write_chunk<W: Write>(writer: &mut W, chunk: &InterchangeChunk) -> Result<u64> {
    let mut out = CountingWriter::new(writer);
    write_into(&mut out, chunk, true)?;
    Ok(out.position())
}

fn write_into<W: Write>(out: &mut CountingWriter<W>, chunk: &InterchangeChunk, pad: bool) -> Result<()> {
    match chunk {
        InterchangeChunk::Type(c) => write_type(out, c, pad),
        InterchangeChunk::Content(c) => write_content(out, c, pad),
    }
}

fn write_header<W: Write>(out: &mut CountingWriter<W>, chunk: &impl DefinitionInfo, length: u64) -> Result<()> {
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(chunk.identifier().as_bytes());
    // Resolved at construction, so always present on instances.
    let endian = chunk.endian().ok_or(Error::UndefinedEndianness {
        identifier: chunk.identifier(),
    })?;
    endian.write_u32(&mut header[4..], length as u32);
    out.write_all(&header)?;
    Ok(())
}

fn write_pad<W: Write>(out: &mut CountingWriter<W>, length: u64, pad: bool) -> Result<()> {
    if pad && length % 2 == 1 {
        out.write_all(&[0])?;
    }
    Ok(())
}

fn write_type<W: Write>(out: &mut CountingWriter<W>, chunk: &TypeChunk, pad: bool) -> Result<()> {
    let children: u64 = chunk.children().iter().map(InterchangeChunk::serialized_size).sum();
    let actual = chunk.child_relative_offset() + children;
    // Parsed containers may end right after an odd last child, without its pad byte.
    let unpadded_last = chunk
        .children()
        .last()
        .is_some_and(|last| last.content_length() % 2 == 1 && chunk.content_length() + 1 == actual);
    if actual != chunk.content_length() && !unpadded_last {
        return Err(Error::ContentLengthMismatch {
            identifier: chunk.identifier(),
            offset: chunk.offset(),
            declared: chunk.content_length(),
            actual,
        });
    }

    let start = out.position();
    write_header(out, chunk, chunk.content_length())?;
    out.write_all(chunk.content_type().as_bytes())?;
    let count = chunk.children().len();
    for (index, child) in chunk.children().iter().enumerate() {
        write_into(out, child, !(unpadded_last && index + 1 == count))?;
    }
    write_pad(out, chunk.content_length(), pad)?;

    tracing::debug!(
        identifier = %chunk.identifier(),
        content_type = %chunk.content_type(),
        bytes = out.position() - start,
        "wrote type chunk"
    );
    Ok(())
}

fn write_content<W: Write>(out: &mut CountingWriter<W>, chunk: &ContentChunk, pad: bool) -> Result<()> {
    let actual = chunk.bytes().len() as u64;
    if actual != chunk.content_length() {
        return Err(Error::ContentLengthMismatch {
            identifier: chunk.identifier(),
            offset: chunk.offset(),
            declared: chunk.content_length(),
            actual,
        });
    }

    write_header(out, chunk, chunk.content_length())?;
    out.write_all(chunk.bytes())?;
    write_pad(out, chunk.content_length(), pad)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{
        ChunkDefinition, ChunkIdentifier, ContentBuilder, Endian, TypeBuilder,
    };
    use crate::options::ParseOptions;
    use crate::parse::parse_chunks_bytes;
    use crate::riff::wave_resolver;
    use pretty_assertions::assert_eq;

    const DATA: ChunkDefinition =
        ChunkDefinition::content(ChunkIdentifier::from_const(*b"data")).with_endian(Endian::Little);

    #[test]
    fn test_data_chunk_wire_format() {
        let chunk = ContentBuilder::new(DATA)
            .content(vec![0x01, 0x02, 0x03, 0x04])
            .build()
            .unwrap();
        let bytes = serialize_chunks(&[chunk.into()]).unwrap();
        assert_eq!(
            bytes,
            vec![b'd', b'a', b't', b'a', 0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_odd_length_pad_not_counted() {
        let chunk: InterchangeChunk = ContentBuilder::new(DATA).content(vec![7; 3]).build().unwrap().into();
        let mut out = Vec::new();
        assert_eq!(write_chunk(&mut out, &chunk).unwrap(), 12);
        assert_eq!(&out[4..8], &[3, 0, 0, 0]);
        assert_eq!(out[11], 0);
        assert_eq!(chunk.content_length(), 3);
    }

    #[test]
    fn test_read_only_chunks_still_serialize() {
        let chunk = ContentBuilder::new(DATA).read_only(true).content(vec![1, 2]).build().unwrap();
        assert_eq!(serialize_chunks(&[chunk.into()]).unwrap().len(), 10);
    }

    #[test]
    fn test_big_endian_type_chunk() {
        let rifx = TypeBuilder::new(ChunkDefinition::type_chunk(
            ChunkIdentifier::from_const(*b"RIFX"),
            Some(Endian::Big),
        ))
        .content_type(ChunkIdentifier::from_const(*b"WAVE"))
        .child(ContentBuilder::new(ChunkDefinition::content(ChunkIdentifier::from_const(*b"abcd"))).content(vec![9]))
        .build()
        .unwrap();
        let bytes = serialize_chunks(&[rifx.into()]).unwrap();
        assert_eq!(&bytes[..12], b"RIFX\x00\x00\x00\x0eWAVE");
        assert_eq!(&bytes[12..], b"abcd\x00\x00\x00\x01\x09\x00");
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut chunk = ContentBuilder::new(DATA).content(vec![1, 2, 3, 4]).build().unwrap();
        chunk.bytes.pop();
        let err = serialize_chunks(&[chunk.into()]).unwrap_err();
        assert!(matches!(err, Error::ContentLengthMismatch { declared: 4, actual: 3, .. }));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_container_without_final_pad_rewrites() {
        // RIFF/WAVE whose odd-length last child ends the file without a pad byte.
        let mut data = b"RIFF\x0f\x00\x00\x00WAVEJUNK\x03\x00\x00\x00abc".to_vec();
        let parsed = parse_chunks_bytes(&data, &wave_resolver(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed[0].content_length(), 15);

        let rewritten = serialize_chunks(&parsed).unwrap();
        // Only the optional top-level pad byte is added.
        data.push(0);
        assert_eq!(rewritten, data);
        assert_eq!(rewritten.len() as u64, parsed[0].serialized_size());
        let reparsed = parse_chunks_bytes(&rewritten, &wave_resolver(), &ParseOptions::default()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_relation_mismatch_is_rejected() {
        let a = ContentBuilder::new(DATA).content(vec![1, 2]).build().unwrap();
        let b = ContentBuilder::new(DATA).content(vec![3, 4]).build().unwrap();
        // Both claim to be the root.
        let err = serialize_chunks(&[a.into(), b.into()]).unwrap_err();
        assert!(matches!(err, Error::InvalidRelation { .. }));
    }
}
