//! Per-session pitch tracking.
//!
//! [PitchTracker] is the stateful front end of the crate: it owns the configuration,
//! the preprocessing and estimator buffers, and a small [DetectorState] used to
//! smooth consecutive estimates and decide when the pitch is stable.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::{DetectorConfig, DetectorConfigUpdate};
use crate::detector::internals::in_frequency_range;
use crate::detector::yin::MIN_WINDOW_SIZE;
use crate::detector::{EstimatorChain, PitchEstimate, PitchEstimator, Rejection};
use crate::error::{ConfigError, Result};
use crate::float::Float;
use crate::utils::buffer::new_real_buffer;
use crate::utils::window::{Preprocessor, SampleWindow};

/// Number of (frequency, clarity) pairs kept for smoothing.
pub const HISTORY_LENGTH: usize = 10;
/// Largest relative change from the smoothed frequency that still counts as stable.
pub const STABILITY_TOLERANCE: f64 = 0.05;
/// Confidence is halved when clarity is below this fraction of `clarity_threshold`.
const LOW_CLARITY_RATIO: f64 = 0.3;

/// Smoothing and stability state carried between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorState<T>
where
    T: Float,
{
    last_smoothed_frequency: Option<T>,
    history: VecDeque<(T, T)>,
    stable_frame_count: usize,
}

impl<T> Default for DetectorState<T>
where
    T: Float,
{
    fn default() -> Self {
        DetectorState {
            last_smoothed_frequency: None,
            history: VecDeque::with_capacity(HISTORY_LENGTH),
            stable_frame_count: 0,
        }
    }
}

impl<T> DetectorState<T>
where
    T: Float,
{
    pub fn last_smoothed_frequency(&self) -> Option<T> {
        self.last_smoothed_frequency
    }

    /// Recent (raw frequency, clarity) pairs, oldest first.
    pub fn history(&self) -> &VecDeque<(T, T)> {
        &self.history
    }

    pub fn stable_frame_count(&self) -> usize {
        self.stable_frame_count
    }

    pub fn average_clarity(&self) -> Option<T> {
        if self.history.is_empty() {
            return None;
        }
        let total: T = self.history.iter().map(|&(_, clarity)| clarity).sum();
        Some(total / T::from_index(self.history.len()))
    }

    pub fn reset(&mut self) {
        self.last_smoothed_frequency = None;
        self.history.clear();
        self.stable_frame_count = 0;
    }

    fn break_stability(&mut self) {
        self.stable_frame_count = 0;
    }

    /// Fold a valid raw estimate into the state and return the smoothed frequency.
    ///
    /// Stability is judged against the smoothed frequency of the previous tick, before
    /// it is updated.
    fn observe(&mut self, raw: T, clarity: T, smoothing_factor: T) -> T {
        let stable = match self.last_smoothed_frequency {
            Some(anchor) => {
                let anchor = anchor.as_f64();
                (raw.as_f64() - anchor).abs() < STABILITY_TOLERANCE * anchor
            }
            None => false,
        };
        if stable {
            self.stable_frame_count += 1;
        } else {
            self.stable_frame_count = 0;
        }

        if self.history.len() == HISTORY_LENGTH {
            self.history.pop_front();
        }
        self.history.push_back((raw, clarity));

        let smoothed = match self.last_smoothed_frequency {
            Some(last) => smoothing_factor * raw + (T::one() - smoothing_factor) * last,
            None => raw,
        };
        self.last_smoothed_frequency = Some(smoothed);
        smoothed
    }
}

/// Snapshot of a tracker's state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DetectorStats<T>
where
    T: Float,
{
    pub last_frequency: Option<T>,
    pub history_len: usize,
    pub stable_frames: usize,
    pub average_clarity: Option<T>,
}

/// Pitch detector for one audio session.
///
/// Every window passed to [process][PitchTracker::process] must have the length given
/// at construction (or by [set_window_size][PitchTracker::set_window_size]); other
/// lengths panic, with the exception of empty windows which are rejected.
pub struct PitchTracker<T>
where
    T: Float,
{
    config: DetectorConfig,
    state: DetectorState<T>,
    preprocessor: Preprocessor<T>,
    signal: Vec<T>,
    chain: EstimatorChain<T>,
}

impl<T> PitchTracker<T>
where
    T: Float,
{
    /// Tracker with the default configuration.
    ///
    /// Panics if `window_size` is smaller than the smallest supported window.
    pub fn new(window_size: usize) -> Self {
        assert!(
            window_size >= MIN_WINDOW_SIZE,
            "PitchTracker needs windows of at least {} samples",
            MIN_WINDOW_SIZE
        );
        Self::build(window_size, DetectorConfig::default())
    }

    pub fn try_new(window_size: usize, config: DetectorConfig) -> Result<Self> {
        check_window_size(window_size)?;
        config.validate()?;
        Ok(Self::build(window_size, config))
    }

    fn build(window_size: usize, config: DetectorConfig) -> Self {
        debug!(window_size, ?config, "creating pitch tracker");
        PitchTracker {
            config,
            state: DetectorState::default(),
            preprocessor: Preprocessor::new(window_size),
            signal: new_real_buffer(window_size),
            chain: EstimatorChain::new(window_size),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectorState<T> {
        &self.state
    }

    pub fn window_size(&self) -> usize {
        self.signal.len()
    }

    /// Apply a partial configuration change. On error the configuration is unchanged.
    pub fn update_config(&mut self, update: &DetectorConfigUpdate) -> Result<()> {
        let config = self.config.merge(update)?;
        debug!(?config, "updated detector configuration");
        self.config = config;
        Ok(())
    }

    /// Reallocate the analysis buffers for windows of `window_size` samples.
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        check_window_size(window_size)?;
        if window_size == self.window_size() {
            return Ok(());
        }
        debug!(from = self.window_size(), to = window_size, "resizing analysis window");
        self.preprocessor = Preprocessor::new(window_size);
        self.signal = new_real_buffer(window_size);
        self.chain = EstimatorChain::new(window_size);
        Ok(())
    }

    /// Forget all smoothing history, as if the tracker had just been created.
    pub fn reset(&mut self) {
        debug!("resetting pitch tracker");
        self.state.reset();
    }

    pub fn stats(&self) -> DetectorStats<T> {
        DetectorStats {
            last_frequency: self.state.last_smoothed_frequency,
            history_len: self.state.history.len(),
            stable_frames: self.state.stable_frame_count,
            average_clarity: self.state.average_clarity(),
        }
    }

    /// Analyse one window.
    ///
    /// Silent, empty and pitchless windows produce an invalid estimate carrying the
    /// [Rejection]; they also break the current run of stable frames.
    pub fn process(&mut self, window: &SampleWindow) -> PitchEstimate<T> {
        if let Err(reason) =
            self.preprocessor
                .prepare(window, self.config.volume_threshold, &mut self.signal)
        {
            return self.reject(PitchEstimate::null(reason), window.volume);
        }

        let mut estimate = self
            .chain
            .estimate(&self.signal, window.sample_rate, &self.config);
        let raw = match estimate.valid_frequency() {
            Some(frequency) => frequency,
            None => return self.reject(estimate, window.volume),
        };

        let smoothed = self.state.observe(
            raw,
            estimate.clarity,
            T::lit(self.config.smoothing_factor),
        );
        estimate.frequency = Some(smoothed);
        estimate.raw_frequency = Some(raw);
        estimate.smoothed_clarity = self.state.average_clarity();
        estimate.volume = window.volume;

        if !in_frequency_range(smoothed, self.config.min_frequency, self.config.max_frequency) {
            return self.reject(
                estimate.invalidated(Rejection::FrequencyOutOfRange),
                window.volume,
            );
        }

        soften_confidence(&mut estimate, self.config.clarity_threshold);
        estimate.is_stable = self.state.stable_frame_count >= self.config.stability_count;
        estimate
    }

    fn reject(&mut self, mut estimate: PitchEstimate<T>, volume: f64) -> PitchEstimate<T> {
        trace!(reason = ?estimate.reason, algorithm = %estimate.algorithm, "window rejected");
        self.state.break_stability();
        estimate.volume = volume;
        estimate.is_stable = false;
        estimate
    }
}

/// Halve the confidence of an unclear estimate without invalidating it.
fn soften_confidence<T: Float>(estimate: &mut PitchEstimate<T>, clarity_threshold: f64) {
    if estimate.clarity < T::lit(LOW_CLARITY_RATIO * clarity_threshold) {
        estimate.confidence = estimate.confidence * T::lit(0.5);
    }
}

fn check_window_size(window_size: usize) -> Result<()> {
    if window_size < MIN_WINDOW_SIZE {
        return Err(ConfigError::WindowTooSmall {
            size: window_size,
            min: MIN_WINDOW_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Algorithm;

    #[test]
    fn history_is_bounded() {
        let mut state = DetectorState::<f64>::default();
        for i in 0..25 {
            state.observe(200.0 + i as f64, 0.9, 0.8);
            assert!(state.history().len() <= HISTORY_LENGTH);
        }
        assert_eq!(state.history().len(), HISTORY_LENGTH);
        assert_eq!(state.history().front(), Some(&(215.0, 0.9)));
        assert_eq!(state.history().back(), Some(&(224.0, 0.9)));
    }

    #[test]
    fn exponential_smoothing() {
        let mut state = DetectorState::<f64>::default();
        assert_eq!(state.observe(100.0, 1.0, 0.8), 100.0);
        let smoothed = state.observe(110.0, 0.5, 0.8);
        assert!((smoothed - 108.0).abs() < 1e-9);
        assert_eq!(state.last_smoothed_frequency(), Some(smoothed));
        assert_eq!(state.average_clarity(), Some(0.75));
    }

    #[test]
    fn stability_counts_consecutive_frames() {
        let mut state = DetectorState::<f64>::default();
        state.observe(440.0, 0.9, 0.8);
        assert_eq!(state.stable_frame_count(), 0);
        state.observe(441.0, 0.9, 0.8);
        state.observe(439.5, 0.9, 0.8);
        assert_eq!(state.stable_frame_count(), 2);

        // More than 5% away from the smoothed anchor.
        state.observe(494.0, 0.9, 0.8);
        assert_eq!(state.stable_frame_count(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = DetectorState::<f32>::default();
        state.observe(300.0, 0.9, 0.8);
        state.observe(301.0, 0.9, 0.8);
        state.reset();
        assert_eq!(state, DetectorState::default());
        assert_eq!(state.average_clarity(), None);
    }

    #[test]
    fn unclear_estimates_lose_confidence() {
        let mut unclear = PitchEstimate::<f64>::candidate(Algorithm::Autocorrelation, 110.0, 401.0, 0.25);
        soften_confidence(&mut unclear, 0.9);
        assert!(unclear.valid);
        assert_eq!(unclear.clarity, 0.25);
        assert_eq!(unclear.confidence, 0.125);

        let mut clear = PitchEstimate::<f64>::candidate(Algorithm::Yin, 440.0, 100.2, 0.3);
        soften_confidence(&mut clear, 0.9);
        assert_eq!(clear.confidence, 0.3);
    }

    #[test]
    fn quiet_window_is_rejected() {
        let mut tracker = PitchTracker::<f64>::new(256);
        let samples = [128u8; 256];
        let estimate = tracker.process(&SampleWindow::new(&samples, 44100, 0.0));
        assert!(!estimate.valid);
        assert_eq!(estimate.algorithm, Algorithm::None);
        assert_eq!(estimate.reason, Some(Rejection::VolumeTooLow));
        assert_eq!(tracker.stats().history_len, 0);
    }

    #[test]
    fn empty_window_is_rejected() {
        let mut tracker = PitchTracker::<f32>::new(256);
        let estimate = tracker.process(&SampleWindow::new(&[], 44100, 1.0));
        assert_eq!(estimate.reason, Some(Rejection::NoSamples));
    }

    #[test]
    fn construction_and_resize_errors() {
        assert_eq!(
            PitchTracker::<f64>::try_new(2, DetectorConfig::default()).err(),
            Some(ConfigError::WindowTooSmall { size: 2, min: 4 })
        );
        let bad = DetectorConfig {
            stability_count: 0,
            ..Default::default()
        };
        assert_eq!(
            PitchTracker::<f64>::try_new(1024, bad).err(),
            Some(ConfigError::ZeroStabilityCount)
        );

        let mut tracker = PitchTracker::<f64>::new(1024);
        assert!(tracker.set_window_size(3).is_err());
        assert_eq!(tracker.window_size(), 1024);
        tracker.set_window_size(2048).unwrap();
        assert_eq!(tracker.window_size(), 2048);
    }

    #[test]
    fn failed_update_keeps_config() {
        let mut tracker = PitchTracker::<f64>::new(1024);
        let update = DetectorConfigUpdate {
            smoothing_factor: Some(1.5),
            ..Default::default()
        };
        assert!(tracker.update_config(&update).is_err());
        assert_eq!(tracker.config(), &DetectorConfig::default());

        let update = DetectorConfigUpdate {
            stability_count: Some(5),
            ..Default::default()
        };
        tracker.update_config(&update).unwrap();
        assert_eq!(tracker.config().stability_count, 5);
    }
}
