use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};

use crate::float::Float;

pub enum ComplexComponent {
    Re,
    Im,
}

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

/// Copy `input` into one component of `output`, zeroing the other component and
/// the tail of `output` past `input.len()`.
pub fn copy_real_to_complex<T: Float>(
    input: &[T],
    output: &mut [Complex<T>],
    component: ComplexComponent,
) {
    assert!(input.len() <= output.len());
    match component {
        ComplexComponent::Re => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.re = *i;
            o.im = T::zero();
        }),
        ComplexComponent::Im => input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
            o.im = *i;
            o.re = T::zero();
        }),
    }
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

/// Copy one component of `input` into `output`. Only the overlapping prefix is
/// written.
pub fn copy_complex_to_real<T: Float>(
    input: &[Complex<T>],
    output: &mut [T],
    component: ComplexComponent,
) {
    match component {
        ComplexComponent::Re => input
            .iter()
            .map(|c| c.re)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
        ComplexComponent::Im => input
            .iter()
            .map(|c| c.im)
            .zip(output.iter_mut())
            .for_each(|(i, o)| *o = i),
    }
}

/// Computes |x|^2 for each complex value x in `arr`. This function
/// modifies `arr` in place and leaves the complex component zero.
pub fn modulus_squared<T: Float>(arr: &mut [Complex<T>]) {
    for s in arr {
        s.re = s.re * s.re + s.im * s.im;
        s.im = T::zero();
    }
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T>(arr: &[T]) -> T
where
    T: Float,
{
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// A forward/inverse FFT pair of a fixed length together with the scratch space
/// both directions need.
///
/// Estimators plan once, when they are built for a window length, and reuse the
/// plan and its scratch on every call. rustfft does not normalize, so a
/// forward-then-inverse round trip scales by [FftPlan::len].
pub struct FftPlan<T>
where
    T: Float,
{
    len: usize,
    forward: Arc<dyn Fft<T>>,
    inverse: Arc<dyn Fft<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T> FftPlan<T>
where
    T: Float,
{
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<T>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        FftPlan {
            len,
            forward,
            inverse,
            scratch: new_complex_buffer(scratch_len),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn forward(&mut self, buffer: &mut [Complex<T>]) {
        assert_eq!(buffer.len(), self.len);
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    pub fn inverse(&mut self, buffer: &mut [Complex<T>]) {
        assert_eq!(buffer.len(), self.len);
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_round_trip_zeroes_tail() {
        let input = [1.0, 2.0, 3.0];
        let mut complex = new_complex_buffer::<f64>(5);
        complex[4] = Complex::new(9.0, 9.0);
        copy_real_to_complex(&input, &mut complex, ComplexComponent::Re);
        assert_eq!(complex[4], Complex::zero());

        let mut output = new_real_buffer::<f64>(5);
        copy_complex_to_real(&complex, &mut output, ComplexComponent::Re);
        assert_eq!(output, vec![1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn fft_round_trip_scales_by_length() {
        let mut plan = FftPlan::<f64>::new(8);
        let mut buffer: Vec<Complex<f64>> = (0..8).map(|i| Complex::new(i as f64, 0.0)).collect();
        plan.forward(&mut buffer);
        plan.inverse(&mut buffer);
        for (i, c) in buffer.iter().enumerate() {
            assert!((c.re / 8.0 - i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn square_sum_of_signal() {
        assert_eq!(square_sum(&[1.0f32, -2.0, 3.0]), 14.0);
    }
}
