//! Normalized autocorrelation, used as the fallback estimator.
//!
//! The mean lagged product of the window with itself is computed for lags
//! `0..N/2`, normalized by its value at lag 0, and the highest local maximum above
//! `threshold` within the configured frequency bounds is taken as the period.

use rustfft::num_complex::Complex;

use crate::config::DetectorConfig;
use crate::detector::internals::{in_frequency_range, lag_range, mean_autocorrelation};
use crate::detector::yin::MIN_WINDOW_SIZE;
use crate::detector::{Algorithm, PitchEstimate, PitchEstimator, Rejection};
use crate::float::Float;
use crate::utils::buffer::{new_complex_buffer, new_real_buffer, FftPlan};
use crate::utils::peak::parabolic_refine;

pub struct AutocorrelationEstimator<T>

where

    T: Float,

{
    size: usize,
    plan: FftPlan<T>,
    spectrum: Vec<Complex<T>>,
    correlation: Vec<T>,
}

impl<T> AutocorrelationEstimator<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        assert!(
            size >= MIN_WINDOW_SIZE,
            "AutocorrelationEstimator needs windows of at least {} samples",
            MIN_WINDOW_SIZE
        );
        // Zero padding to twice the window keeps the FFT correlation linear.
        let padded = 2 * size;
        AutocorrelationEstimator {
            size,
            plan: FftPlan::new(padded),
            spectrum: new_complex_buffer(padded),
            correlation: new_real_buffer(size / 2),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Normalized autocorrelation of the last analysed window.
    pub fn correlation(&self) -> &[T] {
        &self.correlation
    }
}

impl<T> PitchEstimator<T> for AutocorrelationEstimator<T>
where
    T: Float,
{
    fn estimate(
        &mut self,
        signal: &[T],
        sample_rate: u32,
        config: &DetectorConfig,
    ) -> PitchEstimate<T> {
        assert_eq!(signal.len(), self.size);
        let threshold = T::lit(config.threshold);

        mean_autocorrelation(
            signal,
            &mut self.plan,
            &mut self.spectrum,
            &mut self.correlation,
        );

        let corr = &self.correlation;
        let lags = lag_range(
            sample_rate,
            config.min_frequency,
            config.max_frequency,
            1,
            corr.len(),
        );

        // Highest local maximum; both neighbours must exist.
        let peak = lags
            .filter(|&lag| lag + 1 < corr.len())
            .filter(|&lag| corr[lag] > corr[lag - 1] && corr[lag] > corr[lag + 1])
            .fold(None, |best: Option<usize>, lag| match best {
                Some(b) if corr[b] >= corr[lag] => Some(b),
                _ => Some(lag),
            });

        let lag = match peak {
            Some(lag) if corr[lag] > threshold => lag,
            other => {
                let best = other.map_or(0.0, |lag| corr[lag].as_f64());
                return PitchEstimate::rejected(
                    Algorithm::Autocorrelation,
                    Rejection::WeakCorrelation { best },
                );
            }
        };

        let period = parabolic_refine(corr, lag);
        let frequency = T::lit(sample_rate as f64) / period;
        if !in_frequency_range(frequency, config.min_frequency, config.max_frequency) {
            return PitchEstimate::rejected(
                Algorithm::Autocorrelation,
                Rejection::WeakCorrelation {
                    best: corr[lag].as_f64(),
                },
            );
        }

        PitchEstimate::candidate(Algorithm::Autocorrelation, frequency, period, corr[lag])
    }
}
