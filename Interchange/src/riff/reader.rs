//! WAVE reading
//!
//! A [`WaveReader`] parses the whole chunk tree up front, interprets "fmt ",
//! "fact" and "data", and then hands out frames from an in-memory cursor.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use super::format::{AudioFormat, read_fact};
use super::{DATA, FACT, FMT, RIFF, WAVE, wave_resolver};
use crate::chunk::{ChunkIdentifier, ContentChunk, DefinitionInfo, Endian, InterchangeChunk, TypeChunk};
use crate::codec::{SampleCodec, whole_frames};
use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::parse::{TypeResolver, read_chunks};

/// Decoded view of a RIFF or RIFX WAVE file.
#[derive(Debug, Clone)]
pub struct WaveReader {
    chunks: Vec<InterchangeChunk>,
    root: usize,
    data: usize,
    format: AudioFormat,
    codec: SampleCodec,
    frame_count: u64,
    position: u64,
}

impl WaveReader {
    /// Open a WAVE file with the standard resolver.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be opened, or any error from
    /// [`WaveReader::from_reader`].
    ///
    /// [`Error::Io`]: crate::Error::Io
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ParseOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening WAVE file {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), &wave_resolver(), options)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data), &wave_resolver(), &ParseOptions::default())
    }

    /// Parse a stream with a caller-supplied resolver.
    ///
    /// # Errors
    /// Any parse error from [`read_chunks`], plus:
    /// - [`Error::MissingChunk`] if there is no WAVE form, "fmt " or "data" chunk
    /// - [`Error::DuplicateChunk`] if "fmt ", "fact" or "data" repeats
    /// - [`Error::InvalidFormat`] / [`Error::UnsupportedSampleFormat`] from the "fmt " chunk
    /// - [`Error::FrameCountMismatch`] if "fact" claims more frames than "data" holds
    ///
    /// [`Error::MissingChunk`]: crate::Error::MissingChunk
    /// [`Error::DuplicateChunk`]: crate::Error::DuplicateChunk
    /// [`Error::InvalidFormat`]: crate::Error::InvalidFormat
    /// [`Error::UnsupportedSampleFormat`]: crate::Error::UnsupportedSampleFormat
    /// [`Error::FrameCountMismatch`]: crate::Error::FrameCountMismatch
    pub fn from_reader<R: Read>(reader: R, resolver: &TypeResolver, options: &ParseOptions) -> Result<Self> {
        Self::from_chunks(read_chunks(reader, resolver, options)?)
    }

    /// Interpret an already parsed chunk tree.
    pub fn from_chunks(chunks: Vec<InterchangeChunk>) -> Result<Self> {
        let root = chunks
            .iter()
            .position(|c| c.as_type().is_some_and(|t| t.content_type() == WAVE))
            .ok_or(Error::MissingChunk {
                identifier: RIFF,
                container: WAVE,
            })?;
        let Some(form) = chunks[root].as_type() else {
            return Err(Error::MissingChunk {
                identifier: RIFF,
                container: WAVE,
            });
        };

        let fmt = unique_content(form, FMT)?.ok_or(Error::MissingChunk {
            identifier: FMT,
            container: WAVE,
        })?;
        let fact = unique_content(form, FACT)?;
        let data_chunk = unique_content(form, DATA)?.ok_or(Error::MissingChunk {
            identifier: DATA,
            container: WAVE,
        })?;
        let data = form.position(DATA).unwrap_or_default();

        let format = AudioFormat::from_chunk(fmt)?;
        let codec = format.codec(form.resolved_endian())?;

        let block_align = format.bytes_per_frame() as u64;
        let data_frames = data_chunk.content_length() / block_align;
        let trailing = data_chunk.content_length() % block_align;
        if trailing != 0 {
            tracing::warn!(trailing, "data chunk ends with a partial frame");
        }

        let frame_count = match fact.map(read_fact).transpose()? {
            Some(fact_frames) if u64::from(fact_frames) > data_frames => {
                return Err(Error::FrameCountMismatch {
                    fact_frames: u64::from(fact_frames),
                    data_frames,
                });
            }
            Some(fact_frames) => {
                if u64::from(fact_frames) < data_frames {
                    tracing::warn!(fact_frames, data_frames, "fact chunk shortens playable frames");
                }
                u64::from(fact_frames)
            }
            None => data_frames,
        };

        tracing::info!(
            "Opened {} WAVE: {format}, {frame_count} frames, codec {codec}",
            form.identifier()
        );

        Ok(Self {
            chunks,
            root,
            data,
            format,
            codec,
            frame_count,
            position: 0,
        })
    }

    #[inline]
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    #[inline]
    pub fn codec(&self) -> SampleCodec {
        self.codec
    }

    /// Playable frames.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn remaining_frames(&self) -> u64 {
        self.frame_count - self.position
    }

    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.frame_count)
    }

    /// Byte order of the container.
    pub fn endian(&self) -> Endian {
        self.codec.endian()
    }

    /// Every top-level chunk in the file.
    pub fn chunks(&self) -> &[InterchangeChunk] {
        &self.chunks
    }

    /// The RIFF or RIFX chunk holding the WAVE form.
    pub fn form(&self) -> Option<&TypeChunk> {
        self.chunks.get(self.root).and_then(InterchangeChunk::as_type)
    }

    pub fn data_chunk(&self) -> Option<&ContentChunk> {
        self.form()
            .and_then(|form| form.child(self.data))
            .and_then(InterchangeChunk::as_content)
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Move the cursor to `frame`, clamped to the end.
    pub fn seek(&mut self, frame: u64) {
        self.position = frame.min(self.frame_count);
    }

    /// Decode interleaved frames into `out`; returns the frames read, zero at
    /// the end of the data.
    ///
    /// # Errors
    /// Returns [`Error::IncompleteFrame`] if `out` is not a whole number of
    /// frames.
    ///
    /// [`Error::IncompleteFrame`]: crate::Error::IncompleteFrame
    pub fn read_frames_f64(&mut self, out: &mut [f64]) -> Result<usize> {
        let (frames, samples, bytes) = self.next_block(out.len())?;
        self.codec.decode_f64_slice(bytes, &mut out[..samples])?;
        self.position += frames as u64;
        Ok(frames)
    }

    /// `f32` counterpart of [`read_frames_f64`](Self::read_frames_f64).
    pub fn read_frames_f32(&mut self, out: &mut [f32]) -> Result<usize> {
        let (frames, samples, bytes) = self.next_block(out.len())?;
        self.codec.decode_f32_slice(bytes, &mut out[..samples])?;
        self.position += frames as u64;
        Ok(frames)
    }

    /// Decode every remaining frame.
    pub fn read_all_f64(&mut self) -> Result<Vec<f64>> {
        let channels = usize::from(self.format.channels);
        let mut out = vec![0f64; self.remaining_frames() as usize * channels];
        let frames = self.read_frames_f64(&mut out)?;
        out.truncate(frames * channels);
        Ok(out)
    }

    fn next_block(&self, capacity: usize) -> Result<(usize, usize, &[u8])> {
        let channels = usize::from(self.format.channels);
        let wanted = whole_frames(capacity, channels)?;
        let frames = wanted.min(self.remaining_frames() as usize);
        let bytes_per_frame = self.format.bytes_per_frame();
        let start = self.position as usize * bytes_per_frame;
        let end = start + frames * bytes_per_frame;
        let bytes = self
            .data_chunk()
            .and_then(|data| data.bytes().get(start..end))
            .unwrap_or_default();
        Ok((frames, frames * channels, bytes))
    }
}

/// The only content child with `identifier`, if any.
fn unique_content(form: &TypeChunk, identifier: ChunkIdentifier) -> Result<Option<&ContentChunk>> {
    let mut found = form
        .children()
        .iter()
        .filter(|c| c.identifier() == identifier);
    let first = found.next();
    if let Some(duplicate) = found.next() {
        return Err(Error::DuplicateChunk {
            identifier,
            offset: duplicate.offset(),
        });
    }
    Ok(first.and_then(InterchangeChunk::as_content))
}
