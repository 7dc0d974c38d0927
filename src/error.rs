//! Configuration errors.
//!
//! Signal conditions (silence, noise, out-of-range pitch) are never errors; they
//! are reported through [Rejection][crate::detector::Rejection]. Only a caller
//! handing the engine an impossible configuration ends up here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frequency bounds must be finite and positive (min {min} Hz, max {max} Hz)")]
    NonPositiveFrequency { min: f64, max: f64 },

    #[error("min frequency {min} Hz must be below max frequency {max} Hz")]
    InvertedFrequencyRange { min: f64, max: f64 },

    #[error("{name} must lie in [{low}, {high}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("stability count must be at least 1")]
    ZeroStabilityCount,

    #[error("octave range {min}..={max} is empty")]
    InvertedOctaveRange { min: i32, max: i32 },

    #[error("octave {0} is outside the supported range -1..=9")]
    UnsupportedOctave(i32),

    #[error("exact cents threshold {exact} exceeds close threshold {close}")]
    InvertedCentsThresholds { exact: f64, close: f64 },

    #[error("window size must be at least {min} samples, got {size}")]
    WindowTooSmall { size: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Check that `value` lies within the closed interval `[low, high]`.
pub(crate) fn check_range(name: &'static str, value: f64, low: f64, high: f64) -> Result<()> {
    if value.is_finite() && value >= low && value <= high {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            low,
            high,
        })
    }
}
