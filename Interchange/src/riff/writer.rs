//! WAVE writing

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::format::{AudioFormat, FormatTag, fact_bytes};
use super::{ContainerFamily, DATA, DATA_DEFINITION, FACT_DEFINITION, FMT_DEFINITION, WAVE};
use crate::chunk::{ContentBuilder, Endian, MAX_CONTENT_LENGTH, TypeBuilder, TypeChunk};
use crate::codec::{SampleCodec, whole_frames};
use crate::error::{Error, Result};
use crate::parse::write_chunk;

/// Buffers encoded frames and emits a complete RIFF (or RIFX) file on
/// [`finish`](WaveWriter::finish).
pub struct WaveWriter<W: Write> {
    writer: W,
    format: AudioFormat,
    codec: SampleCodec,
    family: ContainerFamily,
    data: Vec<u8>,
    frames: u64,
}

impl<W: Write> WaveWriter<W> {
    /// Little-endian RIFF writer.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for inconsistent layouts and
    /// [`Error::UnsupportedSampleFormat`] if no codec writes `format`.
    ///
    /// [`Error::InvalidFormat`]: crate::Error::InvalidFormat
    /// [`Error::UnsupportedSampleFormat`]: crate::Error::UnsupportedSampleFormat
    pub fn new(writer: W, format: AudioFormat) -> Result<Self> {
        Self::with_endian(writer, format, Endian::Little)
    }

    /// Writer producing RIFF for little-endian and RIFX for big-endian.
    pub fn with_endian(writer: W, format: AudioFormat, endian: Endian) -> Result<Self> {
        format.validate()?;
        let codec = format.codec(endian)?;
        Ok(Self {
            writer,
            format,
            codec,
            family: ContainerFamily::for_endian(endian),
            data: Vec::new(),
            frames: 0,
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

    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Encode interleaved frames; returns the frames appended.
    ///
    /// # Errors
    /// Returns [`Error::IncompleteFrame`] if `samples` is not a whole number
    /// of frames and [`Error::InvalidContentLength`] once "data" would exceed
    /// the 32-bit size limit.
    ///
    /// [`Error::IncompleteFrame`]: crate::Error::IncompleteFrame
    /// [`Error::InvalidContentLength`]: crate::Error::InvalidContentLength
    pub fn write_frames_f64(&mut self, samples: &[f64]) -> Result<usize> {
        let frames = self.grow(samples.len())?;
        let start = self.data.len() - self.codec.encoded_len(samples.len());
        self.codec.encode_f64_slice(samples, &mut self.data[start..])?;
        self.frames += frames as u64;
        Ok(frames)
    }

    /// `f32` counterpart of [`write_frames_f64`](Self::write_frames_f64).
    pub fn write_frames_f32(&mut self, samples: &[f32]) -> Result<usize> {
        let frames = self.grow(samples.len())?;
        let start = self.data.len() - self.codec.encoded_len(samples.len());
        self.codec.encode_f32_slice(samples, &mut self.data[start..])?;
        self.frames += frames as u64;
        Ok(frames)
    }

    /// Write the file and flush; returns the bytes written.
    pub fn finish(mut self) -> Result<u64> {
        let form = self.build()?;
        let written = write_chunk(&mut self.writer, &form.into())?;
        self.writer.flush()?;
        tracing::debug!(frames = self.frames, bytes = written, "finished WAVE stream");
        Ok(written)
    }

    /// Append zeroed space for `samples` samples.
    fn grow(&mut self, samples: usize) -> Result<usize> {
        let frames = whole_frames(samples, usize::from(self.format.channels))?;
        let length = (self.data.len() + self.codec.encoded_len(samples)) as u64;
        if length > MAX_CONTENT_LENGTH {
            return Err(Error::InvalidContentLength {
                identifier: DATA,
                length,
                min: 0,
                max: MAX_CONTENT_LENGTH,
                offset: 0,
            });
        }
        self.data.resize(length as usize, 0);
        Ok(frames)
    }

    fn build(&mut self) -> Result<TypeChunk> {
        let endian = self.codec.endian();
        let mut form = TypeBuilder::new(self.family.definition())
            .content_type(WAVE)
            .child(ContentBuilder::new(FMT_DEFINITION).content(self.format.to_chunk_bytes(endian)));

        if self.format.format_tag() != FormatTag::Pcm {
            let frames = u32::try_from(self.frames).unwrap_or(u32::MAX);
            form = form.child(ContentBuilder::new(FACT_DEFINITION).content(fact_bytes(frames, endian)));
        }

        form.child(ContentBuilder::new(DATA_DEFINITION).content(std::mem::take(&mut self.data)))
            .build()
    }
}

/// Create a WAVE file for writing.
pub fn create_wave<P: AsRef<Path>>(path: P, format: AudioFormat) -> Result<WaveWriter<BufWriter<File>>> {
    let path = path.as_ref();
    tracing::debug!("Creating WAVE file {}", path.display());
    let file = File::create(path)?;
    WaveWriter::new(BufWriter::new(file), format)
}

/// Write `samples` as a complete WAVE file.
pub fn write_wave<P: AsRef<Path>>(path: P, format: AudioFormat, samples: &[f64]) -> Result<u64> {
    let mut writer = create_wave(path, format)?;
    writer.write_frames_f64(samples)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::{FACT, WaveReader};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_writes_plain_pcm_layout() {
        let mut out = Vec::new();
        let mut writer = WaveWriter::new(&mut out, AudioFormat::pcm(1, 8_000, 16)).unwrap();
        assert_eq!(writer.write_frames_f64(&[0.5, -0.5]).unwrap(), 2);
        assert_eq!(writer.finish().unwrap(), 50);

        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[4..8], &42u32.to_le_bytes());
        assert_eq!(&out[8..16], b"WAVEfmt ");
        assert_eq!(&out[38..42], b"data");
        assert_eq!(&out[46..], &[0x00, 0x40, 0x00, 0xC0]);
    }

    #[test]
    fn test_float_gets_fact_chunk() {
        let mut out = Vec::new();
        let mut writer = WaveWriter::new(&mut out, AudioFormat::float(2, 8_000, 32)).unwrap();
        writer.write_frames_f32(&[0.25, -0.25, 0.5, -0.5]).unwrap();
        writer.finish().unwrap();

        let reader = WaveReader::from_bytes(&out).unwrap();
        let form = reader.form().unwrap();
        assert_eq!(form.find_content(FACT).unwrap().dword_at(0).unwrap(), 2);
        assert_eq!(reader.frame_count(), 2);
    }

    #[test]
    fn test_rifx_roundtrip() {
        let mut out = Vec::new();
        let format = AudioFormat::pcm(1, 22_050, 24);
        let mut writer = WaveWriter::with_endian(&mut out, format, Endian::Big).unwrap();
        writer.write_frames_f64(&[0.5, -0.25]).unwrap();
        writer.finish().unwrap();

        assert_eq!(&out[0..4], b"RIFX");
        let mut reader = WaveReader::from_bytes(&out).unwrap();
        assert_eq!(reader.endian(), Endian::Big);
        assert_eq!(reader.read_all_f64().unwrap(), vec![0.5, -0.25]);
    }

    #[test]
    fn test_rejects_incomplete_frames() {
        let mut writer = WaveWriter::new(Vec::new(), AudioFormat::pcm(2, 8_000, 16)).unwrap();
        assert!(matches!(
            writer.write_frames_f64(&[0.0; 3]),
            Err(Error::IncompleteFrame { samples: 3, channels: 2 })
        ));
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn test_rejects_unwritable_formats() {
        assert!(matches!(
            WaveWriter::new(Vec::new(), AudioFormat::float(1, 8_000, 16)),
            Err(Error::UnsupportedSampleFormat { .. })
        ));
        assert!(matches!(
            WaveWriter::new(Vec::new(), AudioFormat::pcm(0, 8_000, 16)),
            Err(Error::InvalidFormat(_))
        ));
    }
}
