//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::float::FloatCore as NumFloatCore;
use rustfft::FftNum;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Signals are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
///
/// Configuration values are always `f64`; [Float::lit] and [Float::as_f64] move
/// values across that boundary.
pub trait Float: Display + Debug + NumFloatCore + FftNum + Sum {
    /// Convert an `f64` constant into this type.
    fn lit(value: f64) -> Self;

    fn as_f64(self) -> f64;

    fn from_index(index: usize) -> Self {
        Self::lit(index as f64)
    }
}

impl Float for f64 {
    #[inline]
    fn lit(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

impl Float for f32 {
    #[inline]
    fn lit(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}
