//! Error types for `Interchange`

use thiserror::Error;

use crate::chunk::ChunkIdentifier;

/// The error type for `Interchange` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file or stream operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Identifier Errors ====================
    /// Bytes supplied for a chunk identifier are not four printable ASCII characters.
    #[error("invalid chunk identifier {found:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected bytes.
        found: Vec<u8>,
        /// Why the bytes were rejected.
        reason: &'static str,
    },

    /// A chunk header read from a stream carries a malformed identifier.
    #[error("malformed chunk identifier {found:?} at offset {offset}")]
    MalformedIdentifier {
        /// The raw header bytes.
        found: [u8; 4],
        /// Absolute stream offset of the header.
        offset: u64,
    },

    /// A type chunk's sub-type tag is not a valid identifier.
    #[error("malformed content type {found:?} in {identifier} chunk at offset {offset}")]
    MalformedContentType {
        /// The enclosing type chunk.
        identifier: ChunkIdentifier,
        /// The raw sub-type bytes.
        found: [u8; 4],
        /// Absolute stream offset of the type chunk.
        offset: u64,
    },

    // ==================== Structural Errors ====================
    /// Content length outside `[child_relative_offset, max_content_length]`.
    #[error(
        "invalid content length {length} for {identifier} chunk at offset {offset} (expected {min}..={max})"
    )]
    InvalidContentLength {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
        /// The rejected length.
        length: u64,
        /// Smallest valid length.
        min: u64,
        /// Largest valid length.
        max: u64,
        /// Absolute offset of the chunk.
        offset: u64,
    },

    /// The stream ended before a header or content was complete.
    #[error("unexpected end of stream at offset {offset} while reading {context}")]
    UnexpectedEof {
        /// Offset at which the read started.
        offset: u64,
        /// What was being read.
        context: String,
    },

    /// A child chunk extends past the end of its enclosing type chunk.
    #[error(
        "{identifier} chunk at offset {offset} needs {needed} bytes but its container has {available} left"
    )]
    ChunkOverrun {
        /// The overrunning chunk.
        identifier: ChunkIdentifier,
        /// Absolute offset of the overrunning chunk.
        offset: u64,
        /// Bytes the chunk occupies including header and pad.
        needed: u64,
        /// Bytes remaining in the container.
        available: u64,
    },

    /// A relation does not point at the chunk it should.
    #[error("invalid relation on {identifier} chunk at offset {offset}: {reason}")]
    InvalidRelation {
        /// The chunk carrying the relation.
        identifier: ChunkIdentifier,
        /// Absolute offset of the chunk.
        offset: u64,
        /// Description of the inconsistency.
        reason: String,
    },

    /// Neither the definition nor any relation target declares an endianness.
    #[error("no endianness declared or inherited for {identifier} chunk")]
    UndefinedEndianness {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
    },

    /// A type builder was finished without a content type.
    #[error("{identifier} type chunk has no content type")]
    MissingContentType {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
    },

    // ==================== Resolution Errors ====================
    /// No type resolver is registered for a top-level identifier.
    #[error("no resolver for {identifier} chunk at offset {offset}")]
    UnrecognizedType {
        /// The unresolved identifier.
        identifier: ChunkIdentifier,
        /// Absolute offset of the chunk.
        offset: u64,
    },

    /// A type chunk's content type has no content resolver.
    #[error("unrecognized content type {content_type} in {identifier} chunk at offset {offset}")]
    UnrecognizedContentType {
        /// The enclosing type chunk.
        identifier: ChunkIdentifier,
        /// The unresolved content type.
        content_type: ChunkIdentifier,
        /// Absolute offset of the type chunk.
        offset: u64,
    },

    /// A child identifier is not known to the active content resolver.
    #[error("unrecognized {identifier} chunk in {content_type} content at offset {offset}")]
    UnrecognizedChunk {
        /// The unresolved identifier.
        identifier: ChunkIdentifier,
        /// Content type of the enclosing container.
        content_type: ChunkIdentifier,
        /// Absolute offset of the chunk.
        offset: u64,
    },

    // ==================== Precondition Errors ====================
    /// A mutating accessor was called on a read-only chunk.
    #[error("{identifier} chunk is read-only: cannot write data")]
    ReadOnly {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
    },

    /// A content accessor reaches past the end of the content.
    #[error(
        "access of {width} bytes at offset {offset} exceeds {identifier} content length {length}"
    )]
    AccessOutOfBounds {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
        /// Offset inside the content.
        offset: u64,
        /// Width of the access in bytes.
        width: u64,
        /// Content length of the chunk.
        length: u64,
    },

    /// A sample buffer cannot hold the requested slot.
    #[error("{codec}: {required} bytes needed at offset {offset}, buffer holds {available}")]
    SampleBufferTooSmall {
        /// Name of the codec.
        codec: &'static str,
        /// Byte offset of the slot.
        offset: usize,
        /// Bytes required from the offset onward.
        required: usize,
        /// Buffer length.
        available: usize,
    },

    /// A frame buffer is not a whole number of frames.
    #[error("incomplete frame: {samples} samples is not a multiple of {channels} channels")]
    IncompleteFrame {
        /// Number of samples supplied.
        samples: usize,
        /// Channels per frame.
        channels: usize,
    },

    /// The recorded content length disagrees with the bytes actually present.
    #[error(
        "{identifier} chunk at offset {offset} records {declared} content bytes but holds {actual}"
    )]
    ContentLengthMismatch {
        /// The chunk identifier.
        identifier: ChunkIdentifier,
        /// Absolute offset of the chunk.
        offset: u64,
        /// The recorded content length.
        declared: u64,
        /// The byte count actually available.
        actual: u64,
    },

    // ==================== WAVE Errors ====================
    /// A required chunk is absent.
    #[error("missing {identifier} chunk in {container}")]
    MissingChunk {
        /// The missing chunk.
        identifier: ChunkIdentifier,
        /// Content type of the container searched.
        container: ChunkIdentifier,
    },

    /// A chunk that may appear only once appears again.
    #[error("duplicate {identifier} chunk at offset {offset}")]
    DuplicateChunk {
        /// The duplicated chunk.
        identifier: ChunkIdentifier,
        /// Absolute offset of the second occurrence.
        offset: u64,
    },

    /// The "fmt " chunk is inconsistent.
    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    /// No codec handles the declared sample layout.
    #[error(
        "unsupported sample format: tag {format_tag:#06x}, {bytes_per_sample} bytes per sample, {valid_bits} valid bits"
    )]
    UnsupportedSampleFormat {
        /// The WAVE format tag (sub-format for extensible files).
        format_tag: u16,
        /// Container width of one sample.
        bytes_per_sample: u16,
        /// Significant bits per sample.
        valid_bits: u16,
    },

    /// The "fact" chunk claims more frames than "data" holds.
    #[error("fact chunk claims {fact_frames} frames but data holds {data_frames}")]
    FrameCountMismatch {
        /// Frames recorded in "fact".
        fact_frames: u64,
        /// Whole frames present in "data".
        data_frames: u64,
    },

    // ==================== Provider Errors ====================
    /// No provider accepts the URI.
    #[error("unsupported sound URI: {0}")]
    UnsupportedUri(String),

    /// The provider cannot produce the requested format.
    #[error("unsupported sound format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Corruption or inconsistency in the container structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::InvalidIdentifier { .. }
                | Error::MalformedIdentifier { .. }
                | Error::MalformedContentType { .. }
                | Error::InvalidContentLength { .. }
                | Error::UnexpectedEof { .. }
                | Error::ChunkOverrun { .. }
                | Error::InvalidRelation { .. }
                | Error::UndefinedEndianness { .. }
                | Error::MissingContentType { .. }
        )
    }

    /// The data is well-formed but not something the active resolvers understand.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedType { .. }
                | Error::UnrecognizedContentType { .. }
                | Error::UnrecognizedChunk { .. }
        )
    }

    /// Caller misuse such as mutating a read-only chunk or passing a short buffer.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::ReadOnly { .. }
                | Error::AccessOutOfBounds { .. }
                | Error::SampleBufferTooSmall { .. }
                | Error::IncompleteFrame { .. }
                | Error::ContentLengthMismatch { .. }
        )
    }

    /// Map an I/O failure during parsing, turning a short read into [`Error::UnexpectedEof`].
    pub(crate) fn from_read(err: std::io::Error, offset: u64, context: impl Into<String>) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof {
                offset,
                context: context.into(),
            }
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for `Interchange` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let eof = Error::UnexpectedEof {
            offset: 8,
            context: "chunk header".to_string(),
        };
        assert!(eof.is_structural());
        assert!(!eof.is_resolution());

        let unknown = Error::UnrecognizedType {
            identifier: ChunkIdentifier::from_const(*b"FORM"),
            offset: 0,
        };
        assert!(unknown.is_resolution());
        assert!(!unknown.is_structural());

        let ro = Error::ReadOnly {
            identifier: ChunkIdentifier::from_const(*b"data"),
        };
        assert!(ro.is_precondition());
        assert_eq!(ro.to_string(), "data chunk is read-only: cannot write data");
    }

    #[test]
    fn test_from_read_maps_short_reads() {
        let err = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert!(matches!(
            Error::from_read(err, 12, "content"),
            Error::UnexpectedEof { offset: 12, .. }
        ));

        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(Error::from_read(err, 0, "header"), Error::Io(_)));
    }
}
