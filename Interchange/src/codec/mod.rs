//! Sample codec engine
//!
//! Each [`SampleCodec`] converts between the canonical floating-point sample
//! domain and one on-disk sample layout. Codecs are stateless `Copy` values
//! taken from fixed tables, so they can be shared freely across threads.
//!
//! Integer codecs scale by `2^(bits-1)`, round to nearest and saturate;
//! float codecs store the IEEE-754 pattern as-is (the Cool Edit variant
//! pre-scales by 2^23).

mod bulk;
pub mod scales;

pub use bulk::{PARALLEL_THRESHOLD, whole_frames};

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;

use crate::chunk::Endian;
use crate::error::{Error, Result};

/// Number representation of a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    TwosComplement,
    Float,
}

/// Sample layout handled by a codec, independent of byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodecKind {
    /// 8-bit two's complement.
    Signed8,
    /// 8-bit offset binary (128 is silence), the WAVE convention.
    Unsigned8,
    Signed16,
    /// Three significant bytes, no padding.
    Packed24,
    /// Padding byte, then three significant bytes.
    PrePadded24,
    /// Three significant bytes, then a padding byte.
    PostPadded24,
    Signed32,
    Signed64,
    /// IEEE-754 single precision.
    Float32,
    /// IEEE-754 single precision in 24-bit integer units (Cool Edit).
    Float32CoolEdit,
    /// IEEE-754 double precision.
    Float64,
}

impl CodecKind {
    pub const ALL: [CodecKind; 11] = [
        CodecKind::Signed8,
        CodecKind::Unsigned8,
        CodecKind::Signed16,
        CodecKind::Packed24,
        CodecKind::PrePadded24,
        CodecKind::PostPadded24,
        CodecKind::Signed32,
        CodecKind::Signed64,
        CodecKind::Float32,
        CodecKind::Float32CoolEdit,
        CodecKind::Float64,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CodecKind::Signed8 => "SIGNED_8",
            CodecKind::Unsigned8 => "UNSIGNED_8",
            CodecKind::Signed16 => "SIGNED_16",
            CodecKind::Packed24 => "PACKED_24",
            CodecKind::PrePadded24 => "PRE_PADDED_24",
            CodecKind::PostPadded24 => "POST_PADDED_24",
            CodecKind::Signed32 => "SIGNED_32",
            CodecKind::Signed64 => "SIGNED_64",
            CodecKind::Float32 => "FLOAT",
            CodecKind::Float32CoolEdit => "FLOAT_COOLEDIT",
            CodecKind::Float64 => "DOUBLE",
        }
    }

    pub const fn scheme(self) -> Scheme {
        match self {
            CodecKind::Float32 | CodecKind::Float32CoolEdit | CodecKind::Float64 => Scheme::Float,
            _ => Scheme::TwosComplement,
        }
    }

    /// Significant bytes per sample.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            CodecKind::Signed8 | CodecKind::Unsigned8 => 1,
            CodecKind::Signed16 => 2,
            CodecKind::Packed24 | CodecKind::PrePadded24 | CodecKind::PostPadded24 => 3,
            CodecKind::Signed32 | CodecKind::Float32 | CodecKind::Float32CoolEdit => 4,
            CodecKind::Signed64 | CodecKind::Float64 => 8,
        }
    }

    /// Bytes between consecutive samples, padding included.
    pub const fn slot_bytes(self) -> usize {
        match self {
            CodecKind::PrePadded24 | CodecKind::PostPadded24 => 4,
            _ => self.bytes_per_sample(),
        }
    }

    /// Offset of the significant bytes inside a slot.
    const fn significant_offset(self) -> usize {
        match self {
            CodecKind::PrePadded24 => 1,
            _ => 0,
        }
    }
}

/// A codec: a sample layout in one byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SampleCodec {
    kind: CodecKind,
    endian: Endian,
}

pub const SIGNED_8: SampleCodec = SampleCodec::le(CodecKind::Signed8);
pub const UNSIGNED_8: SampleCodec = SampleCodec::le(CodecKind::Unsigned8);
pub const SIGNED_16: SampleCodec = SampleCodec::le(CodecKind::Signed16);
pub const PACKED_24: SampleCodec = SampleCodec::le(CodecKind::Packed24);
pub const PRE_PADDED_24: SampleCodec = SampleCodec::le(CodecKind::PrePadded24);
pub const POST_PADDED_24: SampleCodec = SampleCodec::le(CodecKind::PostPadded24);
pub const SIGNED_32: SampleCodec = SampleCodec::le(CodecKind::Signed32);
pub const SIGNED_64: SampleCodec = SampleCodec::le(CodecKind::Signed64);
pub const FLOAT: SampleCodec = SampleCodec::le(CodecKind::Float32);
pub const FLOAT_COOLEDIT: SampleCodec = SampleCodec::le(CodecKind::Float32CoolEdit);
pub const DOUBLE: SampleCodec = SampleCodec::le(CodecKind::Float64);

/// Every codec in little-endian byte order (the WAVE convention).
pub const LITTLE_ENDIAN_CODECS: [SampleCodec; 11] = table(Endian::Little);

/// Every codec in big-endian byte order (RIFX).
pub const BIG_ENDIAN_CODECS: [SampleCodec; 11] = table(Endian::Big);

const fn table(endian: Endian) -> [SampleCodec; 11] {
    let mut codecs = [SIGNED_8; 11];
    let mut i = 0;
    while i < codecs.len() {
        codecs[i] = SampleCodec {
            kind: CodecKind::ALL[i],
            endian,
        };
        i += 1;
    }
    codecs
}

impl SampleCodec {
    const fn le(kind: CodecKind) -> Self {
        Self {
            kind,
            endian: Endian::Little,
        }
    }

    /// The table entry for a layout in a byte order.
    pub fn lookup(kind: CodecKind, endian: Endian) -> SampleCodec {
        let codecs = match endian {
            Endian::Little => &LITTLE_ENDIAN_CODECS,
            Endian::Big => &BIG_ENDIAN_CODECS,
        };
        codecs
            .iter()
            .copied()
            .find(|c| c.kind == kind)
            .unwrap_or(SampleCodec { kind, endian })
    }

    #[inline]
    pub const fn kind(&self) -> CodecKind {
        self.kind
    }

    #[inline]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[inline]
    pub const fn scheme(&self) -> Scheme {
        self.kind.scheme()
    }

    #[inline]
    pub const fn bytes_per_sample(&self) -> usize {
        self.kind.bytes_per_sample()
    }

    #[inline]
    pub const fn slot_bytes(&self) -> usize {
        self.kind.slot_bytes()
    }

    /// Significant bits per sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.kind.bytes_per_sample() as u32 * 8
    }

    /// Whether samples carry the Cool Edit 2^23 pre-scale.
    #[inline]
    pub const fn is_legacy_scaled(&self) -> bool {
        matches!(self.kind, CodecKind::Float32CoolEdit)
    }

    /// Bits of precision a round trip preserves: the integer width, or the
    /// significand width for float codecs.
    pub const fn precision_bits(&self) -> u32 {
        match self.kind {
            CodecKind::Float32 | CodecKind::Float32CoolEdit => scales::F32_PRECISION_BITS,
            CodecKind::Float64 => scales::F64_PRECISION_BITS,
            _ => self.bits(),
        }
    }

    /// Round-trip tolerance for `f64` samples in `[-1.0, 1.0]`.
    pub fn epsilon(&self) -> f64 {
        scales::epsilon(self.precision_bits())
    }

    /// Round-trip tolerance for `f32` samples in `[-1.0, 1.0]`.
    pub fn epsilon_f32(&self) -> f64 {
        scales::epsilon(self.precision_bits().min(scales::F32_PRECISION_BITS))
    }

    /// Upper saturation value of integer codecs; float codecs do not clamp.
    pub fn ceiling(&self) -> Option<f64> {
        match self.scheme() {
            Scheme::TwosComplement => Some(scales::ceiling(self.bits())),
            Scheme::Float => None,
        }
    }

    // =========================================================================
    // Single samples
    // =========================================================================

    /// Encode one sample into the slot starting at `offset`.
    ///
    /// Integer codecs saturate out-of-range input; float codecs store it as is.
    ///
    /// # Errors
    /// Returns [`Error::SampleBufferTooSmall`] if the slot does not fit.
    ///
    /// [`Error::SampleBufferTooSmall`]: crate::Error::SampleBufferTooSmall
    pub fn encode_f64(&self, sample: f64, buffer: &mut [u8], offset: usize) -> Result<()> {
        let slot = self.slot_mut(buffer, offset)?;
        match self.kind {
            CodecKind::Float32 => self.put_f32(slot, sample as f32),
            CodecKind::Float32CoolEdit => self.put_f32(slot, (sample * scales::COOL_EDIT_SCALE) as f32),
            CodecKind::Float64 => self.put_f64(slot, sample),
            _ => self.put_int(slot, quantize(sample, self.bits())),
        }
        Ok(())
    }

    /// Decode the slot starting at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::SampleBufferTooSmall`] if the slot does not fit.
    ///
    /// [`Error::SampleBufferTooSmall`]: crate::Error::SampleBufferTooSmall
    pub fn decode_f64(&self, buffer: &[u8], offset: usize) -> Result<f64> {
        let slot = self.slot(buffer, offset)?;
        Ok(match self.kind {
            CodecKind::Float32 => f64::from(self.get_f32(slot)),
            CodecKind::Float32CoolEdit => f64::from(self.get_f32(slot)) / scales::COOL_EDIT_SCALE,
            CodecKind::Float64 => self.get_f64(slot),
            _ => self.get_int(slot) as f64 / scales::full_scale(self.bits()),
        })
    }

    /// Encode one `f32` sample.
    pub fn encode_f32(&self, sample: f32, buffer: &mut [u8], offset: usize) -> Result<()> {
        match self.kind {
            CodecKind::Float32 => {
                let slot = self.slot_mut(buffer, offset)?;
                self.put_f32(slot, sample);
                Ok(())
            }
            _ => self.encode_f64(f64::from(sample), buffer, offset),
        }
    }

    /// Decode one slot to `f32`.
    pub fn decode_f32(&self, buffer: &[u8], offset: usize) -> Result<f32> {
        match self.kind {
            CodecKind::Float32 => Ok(self.get_f32(self.slot(buffer, offset)?)),
            _ => Ok(self.decode_f64(buffer, offset)? as f32),
        }
    }

    fn check(&self, buffer_len: usize, offset: usize) -> Result<()> {
        let required = self.slot_bytes();
        if offset.checked_add(required).is_none_or(|end| end > buffer_len) {
            return Err(Error::SampleBufferTooSmall {
                codec: self.name(),
                offset,
                required,
                available: buffer_len,
            });
        }
        Ok(())
    }

    fn slot<'b>(&self, buffer: &'b [u8], offset: usize) -> Result<&'b [u8]> {
        self.check(buffer.len(), offset)?;
        Ok(&buffer[offset..offset + self.slot_bytes()])
    }

    fn slot_mut<'b>(&self, buffer: &'b mut [u8], offset: usize) -> Result<&'b mut [u8]> {
        self.check(buffer.len(), offset)?;
        Ok(&mut buffer[offset..offset + self.slot_bytes()])
    }

    // =========================================================================
    // Byte packing
    // =========================================================================

    fn put_int(&self, slot: &mut [u8], value: i64) {
        let width = self.bytes_per_sample();
        let start = self.kind.significant_offset();
        let significant = &mut slot[start..start + width];
        match self.kind {
            CodecKind::Unsigned8 => significant[0] = (value + 128) as u8,
            CodecKind::Signed8 => significant[0] = value as i8 as u8,
            _ => match self.endian {
                Endian::Little => LittleEndian::write_int(significant, value, width),
                Endian::Big => BigEndian::write_int(significant, value, width),
            },
        }
        if slot.len() > width {
            let pad = if start == 0 { width } else { 0 };
            slot[pad] = 0;
        }
    }

    fn get_int(&self, slot: &[u8]) -> i64 {
        let width = self.bytes_per_sample();
        let start = self.kind.significant_offset();
        let significant = &slot[start..start + width];
        match self.kind {
            CodecKind::Unsigned8 => i64::from(significant[0]) - 128,
            CodecKind::Signed8 => i64::from(significant[0] as i8),
            _ => match self.endian {
                Endian::Little => LittleEndian::read_int(significant, width),
                Endian::Big => BigEndian::read_int(significant, width),
            },
        }
    }

    fn put_f32(&self, slot: &mut [u8], value: f32) {
        match self.endian {
            Endian::Little => LittleEndian::write_f32(slot, value),
            Endian::Big => BigEndian::write_f32(slot, value),
        }
    }

    fn get_f32(&self, slot: &[u8]) -> f32 {
        match self.endian {
            Endian::Little => LittleEndian::read_f32(slot),
            Endian::Big => BigEndian::read_f32(slot),
        }
    }

    fn put_f64(&self, slot: &mut [u8], value: f64) {
        match self.endian {
            Endian::Little => LittleEndian::write_f64(slot, value),
            Endian::Big => BigEndian::write_f64(slot, value),
        }
    }

    fn get_f64(&self, slot: &[u8]) -> f64 {
        match self.endian {
            Endian::Little => LittleEndian::read_f64(slot),
            Endian::Big => BigEndian::read_f64(slot),
        }
    }
}

/// Scale, round to nearest and saturate to the `bits`-wide signed range.
#[inline]
fn quantize(sample: f64, bits: u32) -> i64 {
    let scale = scales::full_scale(bits);
    // NaN survives clamp and becomes 0 in the cast; 2^63 saturates to i64::MAX.
    (sample * scale).round().clamp(-scale, scale - 1.0) as i64
}

impl fmt::Display for SampleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.endian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_codecs() -> impl Iterator<Item = SampleCodec> {
        LITTLE_ENDIAN_CODECS.into_iter().chain(BIG_ENDIAN_CODECS)
    }

    fn roundtrip(codec: SampleCodec, x: f64) -> f64 {
        let mut buf = [0u8; 8];
        codec.encode_f64(x, &mut buf, 0).unwrap();
        codec.decode_f64(&buf, 0).unwrap()
    }

    fn roundtrip_f32(codec: SampleCodec, x: f32) -> f32 {
        let mut buf = [0u8; 8];
        codec.encode_f32(x, &mut buf, 0).unwrap();
        codec.decode_f32(&buf, 0).unwrap()
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(LITTLE_ENDIAN_CODECS.len(), CodecKind::ALL.len());
        for (le, be) in LITTLE_ENDIAN_CODECS.iter().zip(BIG_ENDIAN_CODECS.iter()) {
            assert_eq!(le.kind(), be.kind());
            assert_eq!(le.endian(), Endian::Little);
            assert_eq!(be.endian(), Endian::Big);
        }
        assert_eq!(SampleCodec::lookup(CodecKind::Signed16, Endian::Little), SIGNED_16);
        assert_eq!(PACKED_24.bytes_per_sample(), 3);
        assert_eq!(PACKED_24.slot_bytes(), 3);
        assert_eq!(POST_PADDED_24.bytes_per_sample(), 3);
        assert_eq!(POST_PADDED_24.slot_bytes(), 4);
        assert_eq!(FLOAT_COOLEDIT.scheme(), Scheme::Float);
        assert!(FLOAT_COOLEDIT.is_legacy_scaled());
        assert_eq!(UNSIGNED_8.scheme(), Scheme::TwosComplement);
    }

    #[test]
    fn test_full_scale_sixteen_bit_is_asymmetric() {
        let mut buf = [0u8; 2];
        SIGNED_16.encode_f64(1.0, &mut buf, 0).unwrap();
        assert_eq!(buf, [0xFF, 0x7F]);
        assert_eq!(SIGNED_16.decode_f64(&buf, 0).unwrap(), 32_767.0 / 32_768.0);

        SIGNED_16.encode_f64(-1.0, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x00, 0x80]);
        assert_eq!(SIGNED_16.decode_f64(&buf, 0).unwrap(), -1.0);
    }

    #[test]
    fn test_byte_layouts() {
        let x = 0x123456 as f64 / scales::SCALE_24;
        let mut buf = [0xAAu8; 4];

        PACKED_24.encode_f64(x, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x56, 0x34, 0x12, 0xAA]);

        POST_PADDED_24.encode_f64(x, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x56, 0x34, 0x12, 0x00]);

        PRE_PADDED_24.encode_f64(x, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x00, 0x56, 0x34, 0x12]);

        let be = SampleCodec::lookup(CodecKind::Packed24, Endian::Big);
        be.encode_f64(x, &mut buf, 1).unwrap();
        assert_eq!(buf, [0x00, 0x12, 0x34, 0x56]);
        assert_eq!(be.decode_f64(&buf, 1).unwrap(), x);
    }

    #[test]
    fn test_eight_bit_conventions() {
        let mut buf = [0u8; 1];
        UNSIGNED_8.encode_f64(0.0, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 128);
        UNSIGNED_8.encode_f64(-1.0, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 0);
        UNSIGNED_8.encode_f64(1.0, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 255);

        SIGNED_8.encode_f64(-1.0, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 0x80);
        SIGNED_8.encode_f64(0.5, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 64);
    }

    #[test]
    fn test_float_patterns() {
        let mut buf = [0u8; 8];
        FLOAT.encode_f64(0.5, &mut buf, 0).unwrap();
        assert_eq!(&buf[..4], &0.5f32.to_le_bytes());

        FLOAT_COOLEDIT.encode_f64(0.5, &mut buf, 0).unwrap();
        assert_eq!(&buf[..4], &4_194_304.0f32.to_le_bytes());
        assert_eq!(FLOAT_COOLEDIT.decode_f64(&buf, 0).unwrap(), 0.5);

        DOUBLE.encode_f64(-0.25, &mut buf, 0).unwrap();
        assert_eq!(buf, (-0.25f64).to_le_bytes());
    }

    #[test]
    fn test_idempotence_dense_sweep() {
        for codec in all_codecs() {
            let eps = codec.epsilon();
            let steps = 20_000;
            for i in 0..=steps {
                let x = -1.0 + 2.0 * f64::from(i) / f64::from(steps);
                let x = codec.ceiling().map_or(x, |c| x.min(c));
                let y = roundtrip(codec, x);
                assert!((y - x).abs() <= eps, "{codec}: {x} -> {y}");
            }
        }
    }

    #[test]
    fn test_idempotence_f32() {
        for codec in all_codecs() {
            let eps = codec.epsilon_f32();
            for i in -1000..=1000 {
                let x = i as f32 / 1000.0;
                let x = codec.ceiling().map_or(x, |c| x.min(c as f32));
                let y = roundtrip_f32(codec, x);
                assert!(f64::from((y - x).abs()) <= eps, "{codec}: {x} -> {y}");
            }
        }
    }

    #[test]
    fn test_integer_codecs_clamp() {
        for codec in all_codecs().filter(|c| c.scheme() == Scheme::TwosComplement) {
            let ceiling = codec.ceiling().unwrap();
            let eps = codec.epsilon();
            for x in [1.0, 1.5, 7.0, 1e300, f64::INFINITY] {
                let y = roundtrip(codec, x);
                assert!((y - ceiling).abs() <= eps, "{codec}: {x} -> {y}");
            }
            for x in [-1.0, -1.0001, -3.0, -1e300, f64::NEG_INFINITY] {
                assert_eq!(roundtrip(codec, x), -1.0, "{codec}: {x}");
            }
        }
    }

    #[test]
    fn test_float_codecs_do_not_clamp() {
        for codec in all_codecs().filter(|c| c.scheme() == Scheme::Float) {
            for x in [1.5, -3.25, 100.0, -1000.0] {
                let y = roundtrip(codec, x);
                assert!((y - x).abs() <= codec.epsilon() * x.abs(), "{codec}: {x} -> {y}");
            }
        }
    }

    #[test]
    fn test_nan_encodes_as_silence_for_integers() {
        assert_eq!(roundtrip(SIGNED_16, f64::NAN), 0.0);
        assert!(roundtrip(FLOAT, f64::NAN).is_nan());
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 5];
        assert!(SIGNED_32.encode_f64(0.0, &mut buf, 1).is_ok());
        let err = SIGNED_32.encode_f64(0.0, &mut buf, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::SampleBufferTooSmall { offset: 2, required: 4, available: 5, .. }
        ));
        assert!(err.is_precondition());
        assert!(POST_PADDED_24.decode_f64(&buf, 2).is_err());
        assert!(PACKED_24.decode_f64(&buf, 2).is_ok());
        assert!(SIGNED_8.decode_f64(&buf, usize::MAX).is_err());
        // A rejected encode leaves the buffer alone.
        let before = buf;
        assert!(DOUBLE.encode_f64(0.5, &mut buf, 0).is_err());
        assert_eq!(buf, before);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn codec_strategy() -> impl Strategy<Value = SampleCodec> {
            (0..LITTLE_ENDIAN_CODECS.len(), any::<bool>()).prop_map(|(i, big)| {
                if big { BIG_ENDIAN_CODECS[i] } else { LITTLE_ENDIAN_CODECS[i] }
            })
        }

        proptest! {
            #[test]
            fn roundtrip_within_epsilon(codec in codec_strategy(), x in -1.0f64..1.0) {
                let x = codec.ceiling().map_or(x, |c| x.min(c));
                let y = roundtrip(codec, x);
                prop_assert!((y - x).abs() <= codec.epsilon());
            }

            #[test]
            fn encode_is_idempotent(codec in codec_strategy(), x in -4.0f64..4.0) {
                let once = roundtrip(codec, x);
                prop_assert_eq!(roundtrip(codec, once), once);
            }

            #[test]
            fn integer_encode_saturates(codec in codec_strategy(), x in 1.0f64..1e12) {
                prop_assume!(codec.scheme() == Scheme::TwosComplement);
                let ceiling = codec.ceiling().unwrap_or(1.0);
                prop_assert!((roundtrip(codec, x) - ceiling).abs() <= codec.epsilon());
                prop_assert_eq!(roundtrip(codec, -x), -1.0);
            }

            #[test]
            fn float_scheme_scales_tolerance(codec in codec_strategy(), x in -1e6f64..1e6) {
                prop_assume!(codec.scheme() == Scheme::Float);
                let y = roundtrip(codec, x);
                prop_assert!((y - x).abs() <= codec.epsilon() * x.abs().max(1.0));
            }
        }
    }
}
