use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse across sensor columns.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real signal, zero-padded or truncated to the plan size.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::zero());
        self.fft.process(&mut buffer);
        buffer
    }

    /// Bins `0..=size/2` of the forward transform.
    pub fn one_sided(&self, input: &[f64]) -> Vec<Complex64> {
        let mut spectrum = self.forward(input);
        spectrum.truncate(self.size / 2 + 1);
        spectrum
    }

    /// Bin center frequencies (Hz) matching [`FftHelper::one_sided`].
    pub fn frequencies(&self, sample_rate: f64) -> Vec<f64> {
        (0..=self.size / 2)
            .map(|bin| bin as f64 * sample_rate / self.size as f64)
            .collect()
    }
}
