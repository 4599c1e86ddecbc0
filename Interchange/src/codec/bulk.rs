//! Bulk conversion of sample buffers
//!
//! Codecs carry no state, so large buffers are split across the rayon pool.

use rayon::prelude::*;

use super::SampleCodec;
use crate::error::{Error, Result};

/// Sample count above which conversion runs in parallel.
pub const PARALLEL_THRESHOLD: usize = 16 * 1024;

/// Number of whole frames in `samples` interleaved samples.
///
/// # Errors
/// Returns [`Error::IncompleteFrame`] if `samples` is not a multiple of
/// `channels`.
///
/// [`Error::IncompleteFrame`]: crate::Error::IncompleteFrame
pub fn whole_frames(samples: usize, channels: usize) -> Result<usize> {
    if channels == 0 || samples % channels != 0 {
        return Err(Error::IncompleteFrame { samples, channels });
    }
    Ok(samples / channels)
}

impl SampleCodec {
    /// Bytes needed to hold `samples` slots.
    pub fn encoded_len(&self, samples: usize) -> usize {
        samples * self.slot_bytes()
    }

    /// Encode `samples` into the front of `out`; returns the bytes written.
    ///
    /// # Errors
    /// Returns [`Error::SampleBufferTooSmall`] if `out` cannot hold every
    /// sample. Nothing is written in that case.
    ///
    /// [`Error::SampleBufferTooSmall`]: crate::Error::SampleBufferTooSmall
    pub fn encode_f64_slice(&self, samples: &[f64], out: &mut [u8]) -> Result<usize> {
        let len = self.reserve(samples.len(), out.len())?;
        let out = &mut out[..len];
        let slot = self.slot_bytes();
        if samples.len() >= PARALLEL_THRESHOLD {
            out.par_chunks_mut(slot)
                .zip(samples.par_iter())
                .try_for_each(|(dst, &s)| self.encode_f64(s, dst, 0))?;
        } else {
            for (dst, &s) in out.chunks_mut(slot).zip(samples) {
                self.encode_f64(s, dst, 0)?;
            }
        }
        Ok(len)
    }

    /// `f32` counterpart of [`encode_f64_slice`](Self::encode_f64_slice).
    pub fn encode_f32_slice(&self, samples: &[f32], out: &mut [u8]) -> Result<usize> {
        let len = self.reserve(samples.len(), out.len())?;
        let out = &mut out[..len];
        let slot = self.slot_bytes();
        if samples.len() >= PARALLEL_THRESHOLD {
            out.par_chunks_mut(slot)
                .zip(samples.par_iter())
                .try_for_each(|(dst, &s)| self.encode_f32(s, dst, 0))?;
        } else {
            for (dst, &s) in out.chunks_mut(slot).zip(samples) {
                self.encode_f32(s, dst, 0)?;
            }
        }
        Ok(len)
    }

    /// Decode enough slots from the front of `bytes` to fill `out`.
    ///
    /// # Errors
    /// Returns [`Error::SampleBufferTooSmall`] if `bytes` holds fewer than
    /// `out.len()` slots.
    ///
    /// [`Error::SampleBufferTooSmall`]: crate::Error::SampleBufferTooSmall
    pub fn decode_f64_slice(&self, bytes: &[u8], out: &mut [f64]) -> Result<usize> {
        let len = self.reserve(out.len(), bytes.len())?;
        let bytes = &bytes[..len];
        let slot = self.slot_bytes();
        if out.len() >= PARALLEL_THRESHOLD {
            out.par_iter_mut()
                .zip(bytes.par_chunks(slot))
                .try_for_each(|(dst, src)| self.decode_f64(src, 0).map(|v| *dst = v))?;
        } else {
            for (dst, src) in out.iter_mut().zip(bytes.chunks(slot)) {
                *dst = self.decode_f64(src, 0)?;
            }
        }
        Ok(out.len())
    }

    /// `f32` counterpart of [`decode_f64_slice`](Self::decode_f64_slice).
    pub fn decode_f32_slice(&self, bytes: &[u8], out: &mut [f32]) -> Result<usize> {
        let len = self.reserve(out.len(), bytes.len())?;
        let bytes = &bytes[..len];
        let slot = self.slot_bytes();
        if out.len() >= PARALLEL_THRESHOLD {
            out.par_iter_mut()
                .zip(bytes.par_chunks(slot))
                .try_for_each(|(dst, src)| self.decode_f32(src, 0).map(|v| *dst = v))?;
        } else {
            for (dst, src) in out.iter_mut().zip(bytes.chunks(slot)) {
                *dst = self.decode_f32(src, 0)?;
            }
        }
        Ok(out.len())
    }

    fn reserve(&self, samples: usize, available: usize) -> Result<usize> {
        let required = samples
            .checked_mul(self.slot_bytes())
            .filter(|&n| n <= available)
            .ok_or(Error::SampleBufferTooSmall {
                codec: self.name(),
                offset: 0,
                required: samples.saturating_mul(self.slot_bytes()),
                available,
            })?;
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DOUBLE, LITTLE_ENDIAN_CODECS, POST_PADDED_24, SIGNED_16};

    #[test]
    fn test_whole_frames() {
        assert_eq!(whole_frames(6, 2).unwrap(), 3);
        assert!(matches!(
            whole_frames(7, 2),
            Err(Error::IncompleteFrame { samples: 7, channels: 2 })
        ));
        assert!(whole_frames(0, 0).is_err());
    }

    #[test]
    fn test_slice_matches_single_sample_path() {
        let samples: Vec<f64> = (0..100).map(|i| (f64::from(i) / 50.0) - 1.0).collect();
        for codec in LITTLE_ENDIAN_CODECS {
            let mut bulk = vec![0u8; codec.encoded_len(samples.len())];
            assert_eq!(codec.encode_f64_slice(&samples, &mut bulk).unwrap(), bulk.len());

            let mut single = vec![0u8; bulk.len()];
            for (i, &s) in samples.iter().enumerate() {
                codec.encode_f64(s, &mut single, i * codec.slot_bytes()).unwrap();
            }
            assert_eq!(bulk, single, "{codec}");
        }
    }

    #[test]
    fn test_parallel_path_roundtrip() {
        let n = PARALLEL_THRESHOLD * 2 + 3;
        let samples: Vec<f32> = (0..n).map(|i| ((i % 2000) as f32 / 1000.0) - 1.0).collect();
        let mut bytes = vec![0u8; POST_PADDED_24.encoded_len(n)];
        POST_PADDED_24.encode_f32_slice(&samples, &mut bytes).unwrap();

        let mut decoded = vec![0f32; n];
        POST_PADDED_24.decode_f32_slice(&bytes, &mut decoded).unwrap();
        for (x, y) in samples.iter().zip(&decoded) {
            assert!(f64::from((x - y).abs()) <= POST_PADDED_24.epsilon_f32());
        }

        let mut wide = vec![0f64; n];
        POST_PADDED_24.decode_f64_slice(&bytes, &mut wide).unwrap();
        assert!((wide[1000] - 0.0).abs() <= POST_PADDED_24.epsilon());
    }

    #[test]
    fn test_short_buffers_rejected() {
        let mut out = vec![0u8; 3];
        assert!(matches!(
            SIGNED_16.encode_f64_slice(&[0.1, 0.2], &mut out),
            Err(Error::SampleBufferTooSmall { required: 4, available: 3, .. })
        ));
        assert_eq!(out, vec![0, 0, 0]);

        let mut decoded = [0f64; 2];
        assert!(DOUBLE.decode_f64_slice(&[0u8; 15], &mut decoded).is_err());
        assert_eq!(DOUBLE.decode_f64_slice(&[0u8; 17], &mut decoded).unwrap(), 2);
    }
}
