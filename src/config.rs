//! Detector and note mapper configuration.
//!
//! Both configurations are plain structs with defaults. Partial updates are
//! expressed as `*Update` structs whose fields are all optional; [DetectorConfig::merge]
//! and [MapperConfig::merge] apply an update and validate the result before it is
//! committed anywhere.

use crate::error::{check_range, ConfigError, Result};
use crate::notes::{Accidentals, NoteNaming};

/// Lowest octave a note table may contain (C-1 is MIDI 0).
pub const MIN_SUPPORTED_OCTAVE: i32 = -1;
/// Highest octave a note table may contain.
pub const MAX_SUPPORTED_OCTAVE: i32 = 9;

/// Tuning of the pitch estimators and of the temporal smoother.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DetectorConfig {
    /// Lowest candidate pitch in Hz.
    pub min_frequency: f64,
    /// Highest candidate pitch in Hz.
    pub max_frequency: f64,
    /// CMND value a YIN lag must dip below to be accepted outright.
    pub yin_threshold: f64,
    /// Normalised autocorrelation a fallback peak must exceed.
    pub threshold: f64,
    /// Weight of the newest raw frequency in the exponential smoother.
    pub smoothing_factor: f64,
    /// Consecutive stable frames needed before an estimate reports `is_stable`.
    pub stability_count: usize,
    /// Windows quieter than this are rejected before any analysis.
    pub volume_threshold: f64,
    /// Reference clarity; estimates below 30% of it have their confidence halved.
    pub clarity_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            min_frequency: 80.0,
            max_frequency: 2000.0,
            yin_threshold: 0.15,
            threshold: 0.2,
            smoothing_factor: 0.8,
            stability_count: 3,
            volume_threshold: 0.01,
            clarity_threshold: 0.9,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_frequency, self.max_frequency);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0) {
            return Err(ConfigError::NonPositiveFrequency { min, max });
        }
        if min >= max {
            return Err(ConfigError::InvertedFrequencyRange { min, max });
        }
        check_range("yin threshold", self.yin_threshold, 0.0, 1.0)?;
        check_range("correlation threshold", self.threshold, 0.0, 1.0)?;
        check_range("volume threshold", self.volume_threshold, 0.0, 1.0)?;
        check_range("clarity threshold", self.clarity_threshold, 0.0, 1.0)?;
        check_range("smoothing factor", self.smoothing_factor, 0.0, 1.0)?;
        if self.smoothing_factor == 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "smoothing factor",
                value: 0.0,
                low: f64::MIN_POSITIVE,
                high: 1.0,
            });
        }
        if self.stability_count == 0 {
            return Err(ConfigError::ZeroStabilityCount);
        }
        Ok(())
    }

    /// Apply `update` on top of `self`, returning the validated result.
    pub fn merge(&self, update: &DetectorConfigUpdate) -> Result<Self> {
        let merged = DetectorConfig {
            min_frequency: update.min_frequency.unwrap_or(self.min_frequency),
            max_frequency: update.max_frequency.unwrap_or(self.max_frequency),
            yin_threshold: update.yin_threshold.unwrap_or(self.yin_threshold),
            threshold: update.threshold.unwrap_or(self.threshold),
            smoothing_factor: update.smoothing_factor.unwrap_or(self.smoothing_factor),
            stability_count: update.stability_count.unwrap_or(self.stability_count),
            volume_threshold: update.volume_threshold.unwrap_or(self.volume_threshold),
            clarity_threshold: update.clarity_threshold.unwrap_or(self.clarity_threshold),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Partial override for [DetectorConfig]. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DetectorConfigUpdate {
    pub min_frequency: Option<f64>,
    pub max_frequency: Option<f64>,
    pub yin_threshold: Option<f64>,
    pub threshold: Option<f64>,
    pub smoothing_factor: Option<f64>,
    pub stability_count: Option<usize>,
    pub volume_threshold: Option<f64>,
    pub clarity_threshold: Option<f64>,
}

/// Note table range, precision bands and display options of the note mapper.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MapperConfig {
    pub min_octave: i32,
    pub max_octave: i32,
    /// `|cents|` at or below this is [Exact][crate::notes::mapper::PrecisionTier::Exact].
    pub exact_cents_threshold: f64,
    /// `|cents|` at or below this is [Close][crate::notes::mapper::PrecisionTier::Close].
    pub close_cents_threshold: f64,
    pub naming: NoteNaming,
    pub accidentals: Accidentals,
    pub show_octave: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig {
            min_octave: 1,
            max_octave: 8,
            exact_cents_threshold: 10.0,
            close_cents_threshold: 50.0,
            naming: NoteNaming::Solfege,
            accidentals: Accidentals::Sharps,
            show_octave: true,
        }
    }
}

impl MapperConfig {
    pub fn validate(&self) -> Result<()> {
        for octave in [self.min_octave, self.max_octave] {
            if !(MIN_SUPPORTED_OCTAVE..=MAX_SUPPORTED_OCTAVE).contains(&octave) {
                return Err(ConfigError::UnsupportedOctave(octave));
            }
        }
        if self.min_octave > self.max_octave {
            return Err(ConfigError::InvertedOctaveRange {
                min: self.min_octave,
                max: self.max_octave,
            });
        }
        check_range("exact cents threshold", self.exact_cents_threshold, 0.0, 1200.0)?;
        check_range("close cents threshold", self.close_cents_threshold, 0.0, 1200.0)?;
        if self.exact_cents_threshold > self.close_cents_threshold {
            return Err(ConfigError::InvertedCentsThresholds {
                exact: self.exact_cents_threshold,
                close: self.close_cents_threshold,
            });
        }
        Ok(())
    }

    pub fn merge(&self, update: &MapperConfigUpdate) -> Result<Self> {
        let merged = MapperConfig {
            min_octave: update.min_octave.unwrap_or(self.min_octave),
            max_octave: update.max_octave.unwrap_or(self.max_octave),
            exact_cents_threshold: update
                .exact_cents_threshold
                .unwrap_or(self.exact_cents_threshold),
            close_cents_threshold: update
                .close_cents_threshold
                .unwrap_or(self.close_cents_threshold),
            naming: update.naming.unwrap_or(self.naming),
            accidentals: update.accidentals.unwrap_or(self.accidentals),
            show_octave: update.show_octave.unwrap_or(self.show_octave),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Number of octaves covered by the note table.
    pub fn octave_count(&self) -> usize {
        (self.max_octave - self.min_octave + 1).max(0) as usize
    }
}

/// Partial override for [MapperConfig]. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MapperConfigUpdate {
    pub min_octave: Option<i32>,
    pub max_octave: Option<i32>,
    pub exact_cents_threshold: Option<f64>,
    pub close_cents_threshold: Option<f64>,
    pub naming: Option<NoteNaming>,
    pub accidentals: Option<Accidentals>,
    pub show_octave: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
        assert!(MapperConfig::default().validate().is_ok());
        assert_eq!(MapperConfig::default().octave_count(), 8);
    }

    #[test]
    fn merge_only_overrides_given_fields() {
        let base = DetectorConfig::default();
        let update = DetectorConfigUpdate {
            max_frequency: Some(1000.0),
            stability_count: Some(5),
            ..Default::default()
        };
        let merged = base.merge(&update).unwrap();
        assert_eq!(merged.max_frequency, 1000.0);
        assert_eq!(merged.stability_count, 5);
        assert_eq!(merged.min_frequency, base.min_frequency);
        assert_eq!(merged.yin_threshold, base.yin_threshold);
    }

    #[test]
    fn merge_rejects_inverted_frequency_bounds() {
        let update = DetectorConfigUpdate {
            min_frequency: Some(3000.0),
            ..Default::default()
        };
        assert_eq!(
            DetectorConfig::default().merge(&update),
            Err(ConfigError::InvertedFrequencyRange {
                min: 3000.0,
                max: 2000.0
            })
        );
    }

    #[test]
    fn detector_validation() {
        let zero_alpha = DetectorConfig {
            smoothing_factor: 0.0,
            ..Default::default()
        };
        assert!(zero_alpha.validate().is_err());

        let no_stability = DetectorConfig {
            stability_count: 0,
            ..Default::default()
        };
        assert_eq!(no_stability.validate(), Err(ConfigError::ZeroStabilityCount));

        let negative = DetectorConfig {
            min_frequency: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::NonPositiveFrequency { .. })
        ));
    }

    #[test]
    fn mapper_validation() {
        let inverted = MapperConfig {
            min_octave: 5,
            max_octave: 3,
            ..Default::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::InvertedOctaveRange { min: 5, max: 3 })
        );

        let too_high = MapperConfig {
            max_octave: 12,
            ..Default::default()
        };
        assert_eq!(too_high.validate(), Err(ConfigError::UnsupportedOctave(12)));

        let bands = MapperConfig {
            exact_cents_threshold: 60.0,
            ..Default::default()
        };
        assert!(matches!(
            bands.validate(),
            Err(ConfigError::InvertedCentsThresholds { .. })
        ));
    }
}
