use std::ops::Range;

use rustfft::num_complex::Complex;

use crate::float::Float;
use crate::utils::buffer::{
    copy_complex_to_real, copy_real_to_complex, modulus_squared, square_sum, ComplexComponent,
    FftPlan,
};

/// Period, in whole samples, of a tone at `frequency`: `round(sample_rate / frequency)`.
pub fn frequency_to_period(sample_rate: u32, frequency: f64) -> usize {
    let period = (sample_rate as f64 / frequency).round();
    if period.is_finite() && period > 0.0 {
        period as usize
    } else {
        0
    }
}

/// Candidate lags for pitches within `[min_frequency, max_frequency]`, clipped to
/// `[floor, limit)`. High frequencies map to short lags, so the lower bound comes
/// from `max_frequency`.
pub fn lag_range(
    sample_rate: u32,
    min_frequency: f64,
    max_frequency: f64,
    floor: usize,
    limit: usize,
) -> Range<usize> {
    let start = frequency_to_period(sample_rate, max_frequency).max(floor);
    let end = frequency_to_period(sample_rate, min_frequency).min(limit);
    start..end.max(start)
}

/// Whether `frequency` is a finite value within `[min_frequency, max_frequency]`.
pub fn in_frequency_range<T: Float>(frequency: T, min_frequency: f64, max_frequency: f64) -> bool {
    let frequency = frequency.as_f64();
    frequency.is_finite() && frequency >= min_frequency && frequency <= max_frequency
}

/// Compute the windowed autocorrelation of `signal` and put the result in `result`.
/// For a signal _x=(x_0,x_1,...)_, the windowed autocorrelation with window size _w_ is
/// the function
///
/// > r(t) = sum_{i=0}^{w-1} x_i*x_{i+t}
///
/// `plan` must have the length of `signal`, and `signal_complex` and `truncated_complex`
/// are scratch of that length. This function assumes `window_size` is at most half of
/// the length of `signal`.
pub fn windowed_autocorrelation<T>(
    signal: &[T],
    window_size: usize,
    plan: &mut FftPlan<T>,
    signal_complex: &mut [Complex<T>],
    truncated_complex: &mut [Complex<T>],
    result: &mut [T],
)
where
    T: Float,
{
    assert_eq!(plan.len(), signal.len());

    // The windowed autocorrelation is the cross correlation between the original
    // signal and the signal truncated to lie in `0..window_size`.
    copy_real_to_complex(signal, signal_complex, ComplexComponent::Re);
    copy_real_to_complex(
        &signal[..window_size],
        truncated_complex,
        ComplexComponent::Re,
    );
    plan.forward(signal_complex);
    plan.forward(truncated_complex);
    // rustfft doesn't normalize; fft -> inverse fft scales by the length once.
    let normalization_const = T::one() / T::from_index(signal.len());
    signal_complex
        .iter_mut()
        .zip(truncated_complex.iter())
        .for_each(|(a, b)| {
            *a = *a * normalization_const * b.conj();
        });
    plan.inverse(signal_complex);

    // The result is valid only for `0..window_size`
    copy_complex_to_real(&signal_complex[..window_size], result, ComplexComponent::Re);
}

/// Compute the windowed square error, _d(t)_, of `signal`. For a window size of _w_ and a signal
/// _x=(x_0,x_1,...)_, this is defined by
///
///  > d(t) = sum_{i=0}^{w-1} (x_i - x_{i+t})^2
///
/// and is written to `result[..window_size]`. Round-off from the FFT is clamped so
/// that _d(t)_ is never negative.
pub fn windowed_square_error<T>(
    signal: &[T],
    window_size: usize,
    plan: &mut FftPlan<T>,
    signal_complex: &mut [Complex<T>],
    truncated_complex: &mut [Complex<T>],
    result: &mut [T],
)
where
    T: Float,
{
    assert!(
        2 * window_size <= signal.len(),
        "The window size cannot be more than half the signal length"
    );

    let two = T::lit(2.0);

    // d(t) = pow_0^w + pow_t^{t+w} - 2*windowed_autocorrelation(t), where pow_a^b is
    // the sum of the square of `signal` on the window `a..b`.
    windowed_autocorrelation(
        signal,
        window_size,
        plan,
        signal_complex,
        truncated_complex,
        result,
    );
    let mut windowed_power = square_sum(&signal[..window_size]);
    let power = windowed_power;

    result[..window_size]
        .iter_mut()
        .enumerate()
        .for_each(|(i, a)| {
            *a = (power + windowed_power - two * *a).max(T::zero());
            // pow_{t+1}^{t+1+w} follows from pow_t^{t+w} by swapping the boundary terms.
            windowed_power = windowed_power - signal[i] * signal[i]
                + signal[i + window_size] * signal[i + window_size];
        })
}

/// Turn the square error _d(t)_ into the "cumulative mean normalized difference
/// function" of the YIN paper, in place:
///
///  > d'(0) = 1, d'(t) = d(t) * t / sum_{i=1}^t d(i)
///
/// with _d'(t) = 1_ while the running sum is still zero.
pub fn yin_normalize_square_error<T: Float>(square_error: &mut [T]) {
    let mut sum = T::zero();
    if let Some(first) = square_error.first_mut() {
        *first = T::one();
    }
    square_error
        .iter_mut()
        .enumerate()
        .skip(1)
        .for_each(|(tau, a)| {
            sum = sum + *a;
            *a = if sum == T::zero() {
                T::one()
            } else {
                *a * T::from_index(tau) / sum
            };
        });
}

/// Mean lagged product of `signal` with itself,
///
///  > corr(t) = (1 / (n - t)) * sum_{i=0}^{n-t-1} x_i*x_{i+t}
///
/// for `t` in `0..result.len()`, normalized by `corr(0)` when that is positive.
///
/// The product sums come from a zero-padded FFT autocorrelation, so `plan` must be at
/// least `signal.len() + result.len()` long to avoid circular wrap-around.
pub fn mean_autocorrelation<T>(
    signal: &[T],
    plan: &mut FftPlan<T>,
    spectrum: &mut [Complex<T>],
    result: &mut [T],
)
where
    T: Float,
{
    let n = signal.len();
    assert!(result.len() <= n);
    assert!(plan.len() >= n + result.len());

    copy_real_to_complex(signal, spectrum, ComplexComponent::Re);
    plan.forward(spectrum);
    modulus_squared(spectrum);
    plan.inverse(spectrum);
    copy_complex_to_real(&spectrum[..result.len()], result, ComplexComponent::Re);

    let fft_len = T::from_index(plan.len());
    result
        .iter_mut()
        .enumerate()
        .for_each(|(lag, r)| *r = *r / fft_len / T::from_index(n - lag));

    let energy = result.first().copied().unwrap_or_else(T::zero);
    if energy > T::zero() {
        result.iter_mut().for_each(|r| *r = *r / energy);
    }
}
