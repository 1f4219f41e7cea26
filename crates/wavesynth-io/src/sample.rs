//! PCM sample formats and the single quantisation step.

use std::fmt::Debug;

/// Signed integer PCM sample stored in a [`Block`](crate::Block).
pub trait PcmSample: Copy + Default + Send + Sync + PartialEq + Debug + 'static {
    /// Bit width of the sample.
    const BITS: u32;

    /// Largest positive value, `2^(BITS-1) - 1`, as `f64`.
    fn full_scale() -> f64 {
        ((1u64 << (Self::BITS - 1)) - 1) as f64
    }

    /// Convert a pre-scaled value, truncating toward zero.
    fn from_f64(value: f64) -> Self;

    /// Normalise back to `[-1, 1]` for float device APIs.
    fn to_f32(self) -> f32;
}

macro_rules! impl_pcm_sample {
    ($($t:ty),*) => {
        $(
            impl PcmSample for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn to_f32(self) -> f32 {
                    (f64::from(self) / Self::full_scale()) as f32
                }
            }
        )*
    };
}

impl_pcm_sample!(i8, i16, i32);

/// Symmetric hard clip of `x` to `[-max, max]`.
///
/// NaN falls through the negative branch and clips to `-max`.
#[inline]
pub fn clip(x: f64, max: f64) -> f64 {
    if x >= 0.0 { x.min(max) } else { x.max(-max) }
}

/// Clip a normalised sample to `[-1, 1]` and scale it to the full range of `S`.
#[inline]
pub fn quantize<S: PcmSample>(x: f64) -> S {
    S::from_f64(clip(x, 1.0) * S::full_scale())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale() {
        assert_eq!(i8::full_scale(), 127.0);
        assert_eq!(i16::full_scale(), 32767.0);
        assert_eq!(i32::full_scale(), 2_147_483_647.0);
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip(0.5, 1.0), 0.5);
        assert_eq!(clip(1.5, 1.0), 1.0);
        assert_eq!(clip(-1.5, 1.0), -1.0);
        assert_eq!(clip(-0.25, 1.0), -0.25);
        assert_eq!(clip(f64::NAN, 1.0), -1.0);
    }

    #[test]
    fn test_quantize_i16() {
        assert_eq!(quantize::<i16>(0.0), 0);
        assert_eq!(quantize::<i16>(1.0), 32767);
        assert_eq!(quantize::<i16>(-1.0), -32767);
        assert_eq!(quantize::<i16>(4.0), 32767);
        // Truncation toward zero.
        assert_eq!(quantize::<i16>(0.5), 16383);
        assert_eq!(quantize::<i16>(-0.5), -16383);
    }

    #[test]
    fn test_quantize_i8_and_i32() {
        assert_eq!(quantize::<i8>(-2.0), -127);
        assert_eq!(quantize::<i32>(1.0), i32::MAX);
    }

    #[test]
    fn test_to_f32() {
        assert_eq!(32767i16.to_f32(), 1.0);
        assert_eq!(0i16.to_f32(), 0.0);
        assert!((i8::from_f64(63.0).to_f32() - 63.0 / 127.0).abs() < 1e-6);
    }
}
