//! Conversion of raw capture windows into tapered float signals.
//!
//! Capture layers typically deliver unsigned 8-bit time-domain data centred on 128
//! (e.g. a byte analyser tap). Each window is rescaled to [-1, 1] and multiplied by a
//! Hamming window so that the edges of the frame do not look like transients to the
//! estimators.

use std::f64::consts::PI;

use crate::detector::Rejection;
use crate::float::Float;

/// One analysis window as produced by the capture layer.
///
/// The window is borrowed for the duration of a single analysis call.
#[derive(Debug, Clone, Copy)]
pub struct SampleWindow<'a> {
    /// Unsigned 8-bit samples centred on 128.
    pub samples: &'a [u8],
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Loudness estimate of the window in [0, 1], computed by the capture layer.
    pub volume: f64,
}

impl<'a> SampleWindow<'a> {
    pub fn new(samples: &'a [u8], sample_rate: u32, volume: f64) -> Self {
        SampleWindow {
            samples,
            sample_rate,
            volume,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Map an unsigned 8-bit sample to [-1, 1).
#[inline]
pub fn unit_sample<T: Float>(raw: u8) -> T {
    T::lit((raw as f64 - 128.0) / 128.0)
}

/// Hamming coefficient `0.54 - 0.46 cos(2 pi i / (n - 1))`.
pub fn hamming<T: Float>(i: usize, n: usize) -> T {
    if n < 2 {
        return T::one();
    }
    T::lit(0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
}

/// Convert and taper `raw` into a freshly allocated signal.
///
/// This is the allocating convenience form of [Preprocessor::apply].
pub fn prepare_samples<T: Float>(raw: &[u8]) -> Vec<T> {
    let n = raw.len();
    raw.iter()
        .enumerate()
        .map(|(i, &s)| unit_sample::<T>(s) * hamming(i, n))
        .collect()
}

/// Preprocessor for windows of one fixed length. The Hamming coefficients are
/// computed once.
pub struct Preprocessor<T>
where
    T: Float,
{
    coefficients: Vec<T>,
}

impl<T> Preprocessor<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        Preprocessor {
            coefficients: (0..size).map(|i| hamming(i, size)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Gate `window` on emptiness and volume, then write the tapered signal into
    /// `output`. The input is never modified.
    pub fn prepare(
        &self,
        window: &SampleWindow,
        volume_threshold: f64,
        output: &mut [T],
    ) -> Result<(), Rejection> {
        if window.is_empty() {
            return Err(Rejection::NoSamples);
        }
        if !(window.volume >= volume_threshold) {
            return Err(Rejection::VolumeTooLow);
        }
        self.apply(window.samples, output);
        Ok(())
    }

    pub fn apply(&self, raw: &[u8], output: &mut [T]) {
        assert_eq!(raw.len(), self.coefficients.len());
        assert_eq!(output.len(), self.coefficients.len());
        output
            .iter_mut()
            .zip(raw.iter().zip(self.coefficients.iter()))
            .for_each(|(o, (&s, &w))| *o = unit_sample::<T>(s) * w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unit_sample_scaling() {
        assert_eq!(unit_sample::<f64>(128), 0.0);
        assert_eq!(unit_sample::<f64>(0), -1.0);
        assert_eq!(unit_sample::<f64>(255), 127.0 / 128.0);
    }

    #[test]
    fn hamming_edges_and_centre() {
        assert_abs_diff_eq!(hamming::<f64>(0, 5), 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(hamming::<f64>(2, 5), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hamming::<f64>(4, 5), 0.08, epsilon = 1e-12);
        assert_eq!(hamming::<f64>(0, 1), 1.0);
    }

    #[test]
    fn preprocessor_matches_allocating_form() {
        let raw: Vec<u8> = (0..16).map(|i| (i * 16) as u8).collect();
        let expected = prepare_samples::<f64>(&raw);

        let preprocessor = Preprocessor::<f64>::new(raw.len());
        let mut output = vec![0.0; raw.len()];
        preprocessor.apply(&raw, &mut output);

        assert_eq!(output, expected);
        assert_eq!(raw[15], 240);
    }

    #[test]
    fn gate_rejects_empty_and_quiet_windows() {
        let preprocessor = Preprocessor::<f32>::new(4);
        let mut output = vec![0.0; 4];

        let empty = SampleWindow::new(&[], 44100, 1.0);
        assert_eq!(
            preprocessor.prepare(&empty, 0.01, &mut output),
            Err(Rejection::NoSamples)
        );

        let quiet = SampleWindow::new(&[128, 129, 127, 128], 44100, 0.001);
        assert_eq!(
            preprocessor.prepare(&quiet, 0.01, &mut output),
            Err(Rejection::VolumeTooLow)
        );

        let loud = SampleWindow::new(&[128, 255, 0, 128], 44100, 0.5);
        assert!(preprocessor.prepare(&loud, 0.01, &mut output).is_ok());
        assert!(output[1] > 0.0 && output[2] < 0.0);
    }
}
