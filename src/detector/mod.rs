//! Fundamental frequency estimators.
//!
//! Both estimators take a preprocessed window (see [crate::utils::window]) and return
//! a [PitchEstimate]. [EstimatorChain] runs [YIN][yin::YinEstimator] first and only
//! falls back to [autocorrelation][autocorrelation::AutocorrelationEstimator] when YIN
//! does not produce a valid estimate.

use std::fmt;

use tracing::trace;

use crate::config::DetectorConfig;
use crate::float::Float;

use self::autocorrelation::AutocorrelationEstimator;
use self::yin::YinEstimator;

pub mod autocorrelation;
pub mod internals;
pub mod yin;

/// Which estimator produced a [PitchEstimate].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Algorithm {
    Yin,
    Autocorrelation,
    /// The window was rejected before any estimator ran.
    None,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Yin => write!(f, "YIN"),
            Algorithm::Autocorrelation => write!(f, "Autocorrelation"),
            Algorithm::None => write!(f, "None"),
        }
    }
}

/// Why an estimate or a note mapping is not valid.
///
/// These describe ordinary signal conditions such as silence between notes, not
/// faults.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Rejection {
    NoSamples,
    VolumeTooLow,
    NoClearPitch,
    /// YIN found only a shallow dip; `cmnd` is its normalized difference.
    WeakCandidate { cmnd: f64 },
    /// No autocorrelation peak cleared the threshold; `best` is the highest peak seen.
    WeakCorrelation { best: f64 },
    FrequencyOutOfRange,
    InvalidFrequency,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoSamples => write!(f, "no valid samples"),
            Rejection::VolumeTooLow => write!(f, "volume too low"),
            Rejection::NoClearPitch => write!(f, "no clear pitch"),
            Rejection::WeakCandidate { cmnd } => write!(f, "weak pitch candidate: {:.3}", cmnd),
            Rejection::WeakCorrelation { best } => write!(f, "best correlation: {:.3}", best),
            Rejection::FrequencyOutOfRange => write!(f, "frequency out of range"),
            Rejection::InvalidFrequency => write!(f, "invalid frequency"),
        }
    }
}

/// Outcome of one analysis call.
///
/// `frequency` may be present on an invalid estimate: a weak YIN candidate keeps its
/// computed frequency and clarity even though consumers gating on `valid` ignore it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PitchEstimate<T>
where
    T: Float,
{
    /// Estimated fundamental in Hz; smoothed once the estimate went through a tracker.
    pub frequency: Option<T>,
    /// Estimator output before temporal smoothing.
    pub raw_frequency: Option<T>,
    /// Refined period (YIN) or lag (autocorrelation) in samples.
    pub period: Option<T>,
    pub clarity: T,
    pub confidence: T,
    /// Mean clarity over the tracker history.
    pub smoothed_clarity: Option<T>,
    pub algorithm: Algorithm,
    pub valid: bool,
    pub is_stable: bool,
    /// Volume of the analysed window as reported by the capture layer.
    pub volume: f64,
    pub reason: Option<Rejection>,
}

impl<T> PitchEstimate<T>
where
    T: Float,
{
    /// Estimate with no frequency at all.
    pub fn rejected(algorithm: Algorithm, reason: Rejection) -> Self {
        PitchEstimate {
            frequency: None,
            raw_frequency: None,
            period: None,
            clarity: T::zero(),
            confidence: T::zero(),
            smoothed_clarity: None,
            algorithm,
            valid: false,
            is_stable: false,
            volume: 0.0,
            reason: Some(reason),
        }
    }

    /// Result for a window that never reached an estimator.
    pub fn null(reason: Rejection) -> Self {
        Self::rejected(Algorithm::None, reason)
    }

    /// Estimate carrying a frequency. `clarity` is clamped to [0, 1] and also used as
    /// confidence.
    pub fn candidate(algorithm: Algorithm, frequency: T, period: T, clarity: T) -> Self {
        let clarity = clarity.max(T::zero()).min(T::one());
        PitchEstimate {
            frequency: Some(frequency),
            raw_frequency: Some(frequency),
            period: Some(period),
            clarity,
            confidence: clarity,
            smoothed_clarity: None,
            algorithm,
            valid: true,
            is_stable: false,
            volume: 0.0,
            reason: None,
        }
    }

    /// The same estimate flagged invalid for `reason`, keeping its data.
    pub fn invalidated(self, reason: Rejection) -> Self {
        PitchEstimate {
            valid: false,
            is_stable: false,
            reason: Some(reason),
            ..self
        }
    }

    /// Frequency of a valid estimate.
    pub fn valid_frequency(&self) -> Option<T> {
        if self.valid {
            self.frequency
        } else {
            None
        }
    }
}

/// Shared contract of the estimators: a preprocessed window in, an estimate out.
///
/// Implementors own their scratch buffers and are sized for one window length;
/// passing a signal of a different length is a programming error and panics.
pub trait PitchEstimator<T>
where
    T: Float,
{
    fn estimate(
        &mut self,
        signal: &[T],
        sample_rate: u32,
        config: &DetectorConfig,
    ) -> PitchEstimate<T>;
}

/// YIN with an autocorrelation fallback.
pub struct EstimatorChain<T>
where
    T: Float,
{
    yin: YinEstimator<T>,
    autocorrelation: AutocorrelationEstimator<T>,
}

impl<T> EstimatorChain<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        EstimatorChain {
            yin: YinEstimator::new(size),
            autocorrelation: AutocorrelationEstimator::new(size),
        }
    }

    pub fn size(&self) -> usize {
        self.yin.size()
    }
}

impl<T> PitchEstimator<T> for EstimatorChain<T>
where
    T: Float,
{
    fn estimate(
        &mut self,
        signal: &[T],
        sample_rate: u32,
        config: &DetectorConfig,
    ) -> PitchEstimate<T> {
        let primary = self.yin.estimate(signal, sample_rate, config);
        if primary.valid {
            return primary;
        }
        trace!(reason = ?primary.reason, "YIN rejected window, trying autocorrelation");
        self.autocorrelation.estimate(signal, sample_rate, config)
    }
}
