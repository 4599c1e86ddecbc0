//! Fixed-point scale constants
//!
//! A two's-complement codec with `bits` significant bits maps the canonical
//! range `[-1.0, 1.0)` onto `[-2^(bits-1), 2^(bits-1) - 1]`.

/// 2^7
pub const SCALE_8: f64 = 128.0;
/// 2^15
pub const SCALE_16: f64 = 32_768.0;
/// 2^23
pub const SCALE_24: f64 = 8_388_608.0;
/// 2^31
pub const SCALE_32: f64 = 2_147_483_648.0;
/// 2^63
pub const SCALE_64: f64 = 9_223_372_036_854_775_808.0;

/// Pre-scale of the Cool Edit 32-bit float variant: samples are stored as
/// floats in 24-bit integer units.
pub const COOL_EDIT_SCALE: f64 = SCALE_24;

/// Numerator of the round-trip tolerance; slightly above one half to absorb
/// double rounding.
pub const EPSILON_NUMERATOR: f64 = 0.50001;

/// Significand precision of an `f32`, implicit bit included.
pub const F32_PRECISION_BITS: u32 = 24;

/// Significand precision of an `f64`, implicit bit included.
pub const F64_PRECISION_BITS: u32 = 53;

/// `2^(bits-1)`: the magnitude of the most negative value.
#[inline]
pub fn full_scale(bits: u32) -> f64 {
    match bits {
        8 => SCALE_8,
        16 => SCALE_16,
        24 => SCALE_24,
        32 => SCALE_32,
        64 => SCALE_64,
        _ => 2f64.powi(bits as i32 - 1),
    }
}

/// Round-trip tolerance for a representation with `bits` bits of precision.
#[inline]
pub fn epsilon(bits: u32) -> f64 {
    EPSILON_NUMERATOR / full_scale(bits)
}

/// Largest value an integer codec reproduces: `1 - 2^-(bits-1)`.
#[inline]
pub fn ceiling(bits: u32) -> f64 {
    (full_scale(bits) - 1.0) / full_scale(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_powers_of_two() {
        for bits in [8, 16, 24, 32, 64] {
            assert_eq!(full_scale(bits), 2f64.powi(bits as i32 - 1));
        }
        assert_eq!(full_scale(12), 2048.0);
    }

    #[test]
    fn test_ceiling_and_epsilon() {
        assert_eq!(ceiling(16), 32_767.0 / 32_768.0);
        assert_eq!(ceiling(8), 127.0 / 128.0);
        assert!((epsilon(16) - 0.50001 / 32_768.0).abs() < f64::EPSILON);
    }
}
