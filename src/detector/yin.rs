//! The YIN pitch detection algorithm is based on the algorithm from the paper
//! *[YIN, a fundamental frequency estimator for speech and music](http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf)*.
//! It is efficient and offers an improvement over basic autocorrelation.
//!
//! Let $S=(s_0,s_1,\ldots,s_N)$ be a discrete signal and $W = N/2$. The *difference
//! function* at lag $t$ is
//! $$ d(t) = \sum_{i=0}^{W-1} (s_i-s_{i+t})^2. $$
//! It is close to zero when the signal "lines up" with itself, but its scale depends
//! on volume. YIN therefore works on the *cumulative mean normalized difference
//! function*,
//! $$ d\'(t) = \begin{cases}1&\text{if }t=0\\\\ d(t) / \left[ \tfrac{1}{t}\sum_{i=1}^t d(i) \right] & \text{otherwise}\end{cases}, $$
//! and searches, among the lags allowed by the configured frequency bounds, for the
//! first dip of $d\'(t)$ below `yin_threshold`. The bottom of that dip is refined by
//! parabolic interpolation.
//!
//! When nothing dips below the threshold the deepest lag seen is used as a fallback
//! candidate: it is reported when its value is below 0.8, and only marked valid when
//! it is below 0.5.
//!
//! ## Implementation
//! $d(t)$ is computed with an [FFT](https://en.wikipedia.org/wiki/Fast_Fourier_transform)
//! rather than directly, which is a dramatic speed increase for large windows.

use rustfft::num_complex::Complex;

use crate::config::DetectorConfig;
use crate::detector::internals::{
    in_frequency_range, lag_range, windowed_square_error, yin_normalize_square_error,
};
use crate::detector::{Algorithm, PitchEstimate, PitchEstimator, Rejection};
use crate::float::Float;
use crate::utils::buffer::{new_complex_buffer, new_real_buffer, FftPlan};
use crate::utils::peak::parabolic_refine;

/// Smallest window either estimator accepts.
pub const MIN_WINDOW_SIZE: usize = 4;

/// Deepest fallback dip that is still reported.
const CANDIDATE_LIMIT: f64 = 0.8;
/// Deepest fallback dip that is still reported as valid.
const VALID_CANDIDATE_LIMIT: f64 = 0.5;

pub struct YinEstimator<T>
where
    T: Float,
{
    size: usize,
    plan: FftPlan<T>,
    signal_complex: Vec<Complex<T>>,
    truncated_complex: Vec<Complex<T>>,
    cmnd: Vec<T>,
}

impl<T> YinEstimator<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        assert!(
            size >= MIN_WINDOW_SIZE,
            "YinEstimator needs windows of at least {} samples",
            MIN_WINDOW_SIZE
        );
        YinEstimator {
            size,
            plan: FftPlan::new(size),
            signal_complex: new_complex_buffer(size),
            truncated_complex: new_complex_buffer(size),
            cmnd: new_real_buffer(size / 2),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Cumulative mean normalized difference of the last analysed window.
    pub fn cmnd(&self) -> &[T] {
        &self.cmnd
    }

    fn candidate_at(&self, tau: usize, sample_rate: u32) -> (T, T) {
        let period = parabolic_refine(&self.cmnd, tau);
        (T::lit(sample_rate as f64) / period, period)
    }
}

/// Walk downhill from `tau` while the next lag is lower, staying below `end`.
///
/// Refining at the first lag under the threshold instead of the bottom of its dip skews
/// triangle tones by several percent and can lock square waves onto a sub-harmonic.
fn bottom_of_dip<T: Float>(cmnd: &[T], mut tau: usize, end: usize) -> usize {
    while tau + 1 < end && cmnd[tau + 1] < cmnd[tau] {
        tau += 1;
    }
    tau
}

/// Pitch detection based on the YIN algorithm. See <http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf>
impl<T> PitchEstimator<T> for YinEstimator<T>
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
        let window_size = self.size / 2;
        let threshold = T::lit(config.yin_threshold);
        let (min_frequency, max_frequency) = (config.min_frequency, config.max_frequency);

        // STEP 1: Calculate the difference function, d_t.
        windowed_square_error(
            signal,
            window_size,
            &mut self.plan,
            &mut self.signal_complex,
            &mut self.truncated_complex,
            &mut self.cmnd,
        );

        // STEP 2: Calculate the cumulative mean normalized difference function, d_t'.
        yin_normalize_square_error(&mut self.cmnd);

        // STEP 3: The absolute threshold. Take the first dip below `threshold` and
        // remember the deepest lag in case there is none.
        let lags = lag_range(sample_rate, min_frequency, max_frequency, 2, window_size);
        let mut best: Option<(usize, T)> = None;
        let mut tau = lags.start;
        while tau < lags.end {
            let mut value = self.cmnd[tau];
            if value < threshold {
                tau = bottom_of_dip(&self.cmnd, tau, lags.end);
                value = self.cmnd[tau];

                // STEP 4: Parabolic interpolation around the bottom of the dip.
                let (frequency, period) = self.candidate_at(tau, sample_rate);
                if in_frequency_range(frequency, min_frequency, max_frequency) {
                    return PitchEstimate::candidate(
                        Algorithm::Yin,
                        frequency,
                        period,
                        T::one() - value,
                    );
                }
            }
            if value < best.map_or(T::one(), |(_, v)| v) {
                best = Some((tau, value));
            }
            tau += 1;
        }

        // STEP 5: No dip under the threshold. Fall back on the deepest lag.
        if let Some((tau, value)) = best {
            if value < T::lit(CANDIDATE_LIMIT) {
                let (frequency, period) = self.candidate_at(tau, sample_rate);
                if in_frequency_range(frequency, min_frequency, max_frequency) {
                    let estimate =
                        PitchEstimate::candidate(Algorithm::Yin, frequency, period, T::one() - value);
                    return if value < T::lit(VALID_CANDIDATE_LIMIT) {
                        estimate
                    } else {
                        estimate.invalidated(Rejection::WeakCandidate {
                            cmnd: value.as_f64(),
                        })
                    };
                }
            }
        }

        PitchEstimate::rejected(Algorithm::Yin, Rejection::NoClearPitch)
    }
}
