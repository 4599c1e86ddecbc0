//! # Interchange
//!
//! A pure-Rust library for chunk-structured containers (IFF, RIFF, RIFX) and
//! the sample codecs that move audio between raw bytes and normalized
//! floating point.
//!
//! ## Components
//!
//! - **Chunk model** - identifiers, definitions, type/content chunks, builders
//! - **Parsing** - resolver-driven reading and writing of chunk streams
//! - **Sample codecs** - 8/16/24/32/64-bit integer and 32/64-bit float layouts,
//!   little- and big-endian
//! - **RIFF/WAVE** - "fmt ", "fact" and "data" adapters, `WaveReader`/`WaveWriter`
//! - **Providers** - URI-addressed sound sources and sinks
//!
//! ## Quick Start
//!
//! ### Reading a WAVE file
//!
//! ```no_run
//! use interchange::riff::WaveReader;
//!
//! let mut reader = WaveReader::open("input.wav")?;
//! println!("{} ({} frames)", reader.format(), reader.frame_count());
//! let samples = reader.read_all_f64()?;
//! # Ok::<(), interchange::Error>(())
//! ```
//!
//! ### Writing a WAVE file
//!
//! ```no_run
//! use interchange::riff::{AudioFormat, write_wave};
//!
//! let silence = vec![0.0; 2 * 44_100];
//! write_wave("silence.wav", AudioFormat::pcm(2, 44_100, 16), &silence)?;
//! # Ok::<(), interchange::Error>(())
//! ```
//!
//! ### Walking a chunk tree
//!
//! ```no_run
//! use interchange::prelude::*;
//!
//! let chunks = read_chunks_from_path("input.wav", &wave_resolver(), &ParseOptions::default())?;
//! for chunk in &chunks {
//!     println!("{chunk}");
//! }
//! # Ok::<(), interchange::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `interchange` command-line binary

pub mod chunk;
pub mod codec;
pub mod error;
pub mod options;
pub mod parse;
pub mod provider;
pub mod riff;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::options::{ParseOptions, WaveOptions};

    pub use crate::chunk::{
        ChunkBuilder, ChunkDefinition, ChunkIdentifier, ContentBuilder, ContentChunk, DefinitionInfo, Endian,
        InterchangeChunk, Relation, TypeBuilder, TypeChunk,
    };

    pub use crate::parse::{
        ContentBuilderFactory, ContentResolver, TypeBuilderFactory, TypeResolver, read_chunks,
        read_chunks_from_path, serialize_chunks, write_chunks, write_chunks_to_path,
    };

    pub use crate::codec::{CodecKind, SampleCodec};

    // RIFF/WAVE
    pub use crate::riff::{
        AudioFormat, ContainerFamily, SampleFormat, WaveReader, WaveWriter, wave_resolver, write_wave,
    };

    pub use crate::provider::{ProviderRegistry, SoundProvider, SoundSink, SoundSource, WaveFileProvider};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
