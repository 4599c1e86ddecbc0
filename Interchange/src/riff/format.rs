//! "fmt " and "fact" chunk adapters and codec selection
//!
//! Field layout of "fmt " (offsets in bytes):
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 2    | format tag                              |
//! | 2      | 2    | channels                                |
//! | 4      | 4    | sample rate                             |
//! | 8      | 4    | bytes per second                        |
//! | 12     | 2    | block align (bytes per frame)           |
//! | 14     | 2    | bits per sample (container)             |
//! | 16     | 2    | extension size                          |
//! | 18     | 2    | valid bits per sample (extensible)      |
//! | 20     | 4    | channel mask (extensible)               |
//! | 24     | 16   | sub-format GUID (extensible)            |

use std::fmt;

use serde::Serialize;

use crate::chunk::{ContentChunk, Endian};
use crate::codec::{CodecKind, SampleCodec};
use crate::error::{Error, Result};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the mandatory "fmt " fields
pub const FORMAT_SIZE_BASIC: usize = 16;
/// Size with an (empty) extension size field
pub const FORMAT_SIZE_WITH_EXTENSION_SIZE: usize = 18;
/// Size of the extensible form
pub const FORMAT_SIZE_EXTENSIBLE: usize = 40;
/// Extension size recorded by the extensible form
pub const EXTENSION_SIZE_EXTENSIBLE: u16 = 22;

const OFFSET_FORMAT_TAG: u64 = 0;
const OFFSET_CHANNELS: u64 = 2;
const OFFSET_SAMPLE_RATE: u64 = 4;
const OFFSET_BYTES_PER_SECOND: u64 = 8;
const OFFSET_BLOCK_ALIGN: u64 = 12;
const OFFSET_BITS_PER_SAMPLE: u64 = 14;
const OFFSET_EXTENSION_SIZE: u64 = 16;
const OFFSET_VALID_BITS: u64 = 18;
const OFFSET_CHANNEL_MASK: u64 = 20;
const OFFSET_SUB_FORMAT: u64 = 24;
const OFFSET_GUID_TAIL: usize = 26;

/// Bytes 2..16 of every `KSDATAFORMAT_SUBTYPE_*` GUID.
const SUB_FORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// WAVE format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatTag {
    Pcm,
    IeeeFloat,
    Extensible,
    Unknown(u16),
}

impl From<u16> for FormatTag {
    fn from(value: u16) -> Self {
        match value {
            WAVE_FORMAT_PCM => FormatTag::Pcm,
            WAVE_FORMAT_IEEE_FLOAT => FormatTag::IeeeFloat,
            WAVE_FORMAT_EXTENSIBLE => FormatTag::Extensible,
            other => FormatTag::Unknown(other),
        }
    }
}

impl From<FormatTag> for u16 {
    fn from(tag: FormatTag) -> Self {
        match tag {
            FormatTag::Pcm => WAVE_FORMAT_PCM,
            FormatTag::IeeeFloat => WAVE_FORMAT_IEEE_FLOAT,
            FormatTag::Extensible => WAVE_FORMAT_EXTENSIBLE,
            FormatTag::Unknown(other) => other,
        }
    }
}

/// Sample number representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Pcm,
    Float,
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::Pcm => f.write_str("PCM"),
            SampleFormat::Float => f.write_str("IEEE float"),
        }
    }
}

/// Audio layout declared by a "fmt " chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    pub sample_format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    /// Container width of one sample in bytes.
    pub bytes_per_sample: u16,
    /// Significant bits inside the container.
    pub valid_bits_per_sample: u16,
    /// Speaker positions; zero when unspecified.
    pub channel_mask: u32,
    /// Float samples stored in 24-bit integer units (Cool Edit).
    pub legacy_float_scaling: bool,
}

impl AudioFormat {
    /// Integer PCM with `bits` significant bits in the smallest container.
    pub fn pcm(channels: u16, sample_rate: u32, bits: u16) -> Self {
        Self {
            sample_format: SampleFormat::Pcm,
            channels,
            sample_rate,
            bytes_per_sample: bits.div_ceil(8),
            valid_bits_per_sample: bits,
            channel_mask: 0,
            legacy_float_scaling: false,
        }
    }

    /// IEEE float, 32 or 64 bits.
    pub fn float(channels: u16, sample_rate: u32, bits: u16) -> Self {
        Self {
            sample_format: SampleFormat::Float,
            ..Self::pcm(channels, sample_rate, bits)
        }
    }

    /// The WAVE layout a codec writes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFormat`] for codecs WAVE never selects
    /// (signed 8-bit, pre-padded 24-bit).
    ///
    /// [`Error::UnsupportedFormat`]: crate::Error::UnsupportedFormat
    pub fn for_codec(codec: SampleCodec, channels: u16, sample_rate: u32) -> Result<Self> {
        let format = match codec.kind() {
            CodecKind::Unsigned8 => Self::pcm(channels, sample_rate, 8),
            CodecKind::Signed16 => Self::pcm(channels, sample_rate, 16),
            CodecKind::Packed24 => Self::pcm(channels, sample_rate, 24),
            CodecKind::PostPadded24 => Self::pcm(channels, sample_rate, 24).with_container(4),
            CodecKind::Signed32 => Self::pcm(channels, sample_rate, 32),
            CodecKind::Signed64 => Self::pcm(channels, sample_rate, 64),
            CodecKind::Float32 => Self::float(channels, sample_rate, 32),
            CodecKind::Float64 => Self::float(channels, sample_rate, 64),
            CodecKind::Float32CoolEdit => Self {
                legacy_float_scaling: true,
                ..Self::float(channels, sample_rate, 24).with_container(4)
            },
            CodecKind::Signed8 | CodecKind::PrePadded24 => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} samples have no WAVE layout",
                    codec.name()
                )));
            }
        };
        Ok(format)
    }

    #[must_use]
    pub fn with_channel_mask(mut self, mask: u32) -> Self {
        self.channel_mask = mask;
        self
    }

    /// Widen the container while keeping the significant bits.
    #[must_use]
    pub fn with_container(mut self, bytes_per_sample: u16) -> Self {
        self.bytes_per_sample = bytes_per_sample;
        self
    }

    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bytes_per_sample)
    }

    #[inline]
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bytes_per_sample)
    }

    #[inline]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    /// Playback length of `frames` frames.
    pub fn duration_secs(&self, frames: u64) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            frames as f64 / f64::from(self.sample_rate)
        }
    }

    fn has_spare_bits(&self) -> bool {
        self.valid_bits_per_sample != self.bytes_per_sample * 8
    }

    /// Format tag this layout is written with.
    pub fn format_tag(&self) -> FormatTag {
        if self.legacy_float_scaling {
            FormatTag::IeeeFloat
        } else if self.has_spare_bits() || self.channel_mask != 0 {
            FormatTag::Extensible
        } else {
            self.base_tag()
        }
    }

    fn base_tag(&self) -> FormatTag {
        match self.sample_format {
            SampleFormat::Pcm => FormatTag::Pcm,
            SampleFormat::Float => FormatTag::IeeeFloat,
        }
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] describing the first inconsistency.
    ///
    /// [`Error::InvalidFormat`]: crate::Error::InvalidFormat
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(Error::InvalidFormat("zero channels".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidFormat("zero sample rate".to_string()));
        }
        if self.bytes_per_sample == 0 || self.valid_bits_per_sample == 0 {
            return Err(Error::InvalidFormat("zero-width samples".to_string()));
        }
        if self.valid_bits_per_sample > self.bytes_per_sample * 8 {
            return Err(Error::InvalidFormat(format!(
                "{} valid bits do not fit a {}-byte container",
                self.valid_bits_per_sample, self.bytes_per_sample
            )));
        }
        if self.channels.checked_mul(self.bytes_per_sample).is_none() {
            return Err(Error::InvalidFormat("frame size overflows block align".to_string()));
        }
        if self.channel_mask != 0 && self.channel_mask.count_ones() != u32::from(self.channels) {
            return Err(Error::InvalidFormat(format!(
                "channel mask {:#x} names {} speakers for {} channels",
                self.channel_mask,
                self.channel_mask.count_ones(),
                self.channels
            )));
        }
        Ok(())
    }

    /// The codec for this layout in the given byte order.
    pub fn codec(&self, endian: Endian) -> Result<SampleCodec> {
        select_codec(self, endian)
    }

    // =========================================================================
    // "fmt " chunk
    // =========================================================================

    /// Read the layout from a "fmt " chunk, in the chunk's byte order.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for truncated or inconsistent fields
    /// and [`Error::UnsupportedSampleFormat`] for compressed formats.
    ///
    /// [`Error::InvalidFormat`]: crate::Error::InvalidFormat
    /// [`Error::UnsupportedSampleFormat`]: crate::Error::UnsupportedSampleFormat
    pub fn from_chunk(chunk: &ContentChunk) -> Result<Self> {
        let length = chunk.content_length();
        if length < FORMAT_SIZE_BASIC as u64 {
            return Err(Error::InvalidFormat(format!(
                "fmt chunk holds {length} bytes, need {FORMAT_SIZE_BASIC}"
            )));
        }

        let tag = chunk.word_at(OFFSET_FORMAT_TAG)?;
        let channels = chunk.word_at(OFFSET_CHANNELS)?;
        let sample_rate = chunk.dword_at(OFFSET_SAMPLE_RATE)?;
        let block_align = chunk.word_at(OFFSET_BLOCK_ALIGN)?;
        let bits_per_sample = chunk.word_at(OFFSET_BITS_PER_SAMPLE)?;
        let extension_size = if length >= FORMAT_SIZE_WITH_EXTENSION_SIZE as u64 {
            chunk.word_at(OFFSET_EXTENSION_SIZE)?
        } else {
            0
        };

        if channels == 0 || block_align % channels != 0 {
            return Err(Error::InvalidFormat(format!(
                "block align {block_align} is not a whole number of samples for {channels} channels"
            )));
        }
        let container = block_align / channels;

        let extensible = FormatTag::from(tag) == FormatTag::Extensible;
        let (sub_format, valid_bits, channel_mask) = if extensible {
            if extension_size < EXTENSION_SIZE_EXTENSIBLE || length < FORMAT_SIZE_EXTENSIBLE as u64 {
                return Err(Error::InvalidFormat(format!(
                    "extensible fmt chunk holds {length} bytes, need {FORMAT_SIZE_EXTENSIBLE}"
                )));
            }
            let valid = chunk.word_at(OFFSET_VALID_BITS)?;
            (
                chunk.word_at(OFFSET_SUB_FORMAT)?,
                if valid == 0 { bits_per_sample } else { valid },
                chunk.dword_at(OFFSET_CHANNEL_MASK)?,
            )
        } else {
            (tag, bits_per_sample, 0)
        };

        let unsupported = || Error::UnsupportedSampleFormat {
            format_tag: sub_format,
            bytes_per_sample: container,
            valid_bits,
        };
        let sample_format = match FormatTag::from(sub_format) {
            FormatTag::Pcm => SampleFormat::Pcm,
            FormatTag::IeeeFloat => SampleFormat::Float,
            _ => return Err(unsupported()),
        };

        // 24 bits in a 4-byte slot without the extensible header is the Cool
        // Edit float layout, whatever the tag says.
        let legacy = !extensible && container == 4 && valid_bits == 24;

        let format = AudioFormat {
            sample_format: if legacy { SampleFormat::Float } else { sample_format },
            channels,
            sample_rate,
            bytes_per_sample: container,
            valid_bits_per_sample: valid_bits,
            channel_mask,
            legacy_float_scaling: legacy,
        };
        format.validate()?;

        let declared_rate = chunk.dword_at(OFFSET_BYTES_PER_SECOND)?;
        if declared_rate != format.byte_rate() {
            tracing::warn!(declared_rate, expected = format.byte_rate(), "fmt byte rate disagrees with layout");
        }
        Ok(format)
    }

    /// Serialize as "fmt " content in the given byte order.
    ///
    /// Layouts without spare bits or a channel mask use the 18-byte form,
    /// everything else the 40-byte extensible form.
    pub fn to_chunk_bytes(&self, endian: Endian) -> Vec<u8> {
        let tag = self.format_tag();
        let size = if tag == FormatTag::Extensible {
            FORMAT_SIZE_EXTENSIBLE
        } else {
            FORMAT_SIZE_WITH_EXTENSION_SIZE
        };
        let mut out = vec![0u8; size];
        let bits = if self.legacy_float_scaling {
            self.valid_bits_per_sample
        } else {
            self.bytes_per_sample * 8
        };

        endian.write_u16(&mut out[0..], u16::from(tag));
        endian.write_u16(&mut out[2..], self.channels);
        endian.write_u32(&mut out[4..], self.sample_rate);
        endian.write_u32(&mut out[8..], self.byte_rate());
        endian.write_u16(&mut out[12..], self.block_align());
        endian.write_u16(&mut out[14..], bits);

        if tag == FormatTag::Extensible {
            endian.write_u16(&mut out[16..], EXTENSION_SIZE_EXTENSIBLE);
            endian.write_u16(&mut out[18..], self.valid_bits_per_sample);
            endian.write_u32(&mut out[20..], self.channel_mask);
            endian.write_u16(&mut out[24..], u16::from(self.base_tag()));
            out[OFFSET_GUID_TAIL..].copy_from_slice(&SUB_FORMAT_GUID_TAIL);
        }
        out
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-bit ({} bytes), {} ch, {} Hz",
            self.sample_format, self.valid_bits_per_sample, self.bytes_per_sample, self.channels, self.sample_rate
        )?;
        if self.legacy_float_scaling {
            f.write_str(", Cool Edit scaling")?;
        }
        Ok(())
    }
}

/// Pick the codec for a layout. Total over every [`AudioFormat`]: anything
/// without a mapping is an error, never a fallthrough.
///
/// | format | container | valid bits | codec            |
/// |--------|-----------|------------|------------------|
/// | float  | 4         | legacy     | `FLOAT_COOLEDIT` |
/// | float  | 4         | 32         | `FLOAT`          |
/// | float  | 8         | 64         | `DOUBLE`         |
/// | PCM    | 1         | 1..=8      | `UNSIGNED_8`     |
/// | PCM    | 2         | 9..=16     | `SIGNED_16`      |
/// | PCM    | 3         | 17..=24    | `PACKED_24`      |
/// | PCM    | 4         | 17..=24    | `POST_PADDED_24` |
/// | PCM    | 4         | 25..=32    | `SIGNED_32`      |
/// | PCM    | 8         | 33..=64    | `SIGNED_64`      |
///
/// # Errors
/// Returns [`Error::UnsupportedSampleFormat`] for every other combination.
///
/// [`Error::UnsupportedSampleFormat`]: crate::Error::UnsupportedSampleFormat
pub fn select_codec(format: &AudioFormat, endian: Endian) -> Result<SampleCodec> {
    let valid = format.valid_bits_per_sample;
    let kind = match (format.sample_format, format.bytes_per_sample) {
        (SampleFormat::Float, 4) if format.legacy_float_scaling => Some(CodecKind::Float32CoolEdit),
        (SampleFormat::Float, 4) if valid == 32 => Some(CodecKind::Float32),
        (SampleFormat::Float, 8) if valid == 64 => Some(CodecKind::Float64),
        (SampleFormat::Pcm, 1) if (1..=8).contains(&valid) => Some(CodecKind::Unsigned8),
        (SampleFormat::Pcm, 2) if (9..=16).contains(&valid) => Some(CodecKind::Signed16),
        (SampleFormat::Pcm, 3) if (17..=24).contains(&valid) => Some(CodecKind::Packed24),
        (SampleFormat::Pcm, 4) if (17..=24).contains(&valid) => Some(CodecKind::PostPadded24),
        (SampleFormat::Pcm, 4) if (25..=32).contains(&valid) => Some(CodecKind::Signed32),
        (SampleFormat::Pcm, 8) if (33..=64).contains(&valid) => Some(CodecKind::Signed64),
        _ => None,
    };
    kind.map(|kind| SampleCodec::lookup(kind, endian))
        .ok_or(Error::UnsupportedSampleFormat {
            format_tag: u16::from(format.base_tag()),
            bytes_per_sample: format.bytes_per_sample,
            valid_bits: valid,
        })
}

// =============================================================================
// "fact" chunk
// =============================================================================

/// Size of a "fact" chunk
pub const FACT_SIZE: u64 = 4;

/// Frames per channel recorded in a "fact" chunk.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if the chunk is shorter than four bytes.
///
/// [`Error::InvalidFormat`]: crate::Error::InvalidFormat
pub fn read_fact(chunk: &ContentChunk) -> Result<u32> {
    if chunk.content_length() < FACT_SIZE {
        return Err(Error::InvalidFormat(format!(
            "fact chunk holds {} bytes, need {FACT_SIZE}",
            chunk.content_length()
        )));
    }
    chunk.dword_at(0)
}

/// "fact" content recording `frames` frames.
pub fn fact_bytes(frames: u32, endian: Endian) -> Vec<u8> {
    let mut out = vec![0u8; FACT_SIZE as usize];
    endian.write_u32(&mut out, frames);
    out
}
