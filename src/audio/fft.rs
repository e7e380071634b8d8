//! Packed real-signal FFT.
//!
//! Runs an in-place radix-2 decimation-in-time transform over the complex
//! buffer filled by the loader and unpacks the two real streams carried in
//! its real and imaginary parts into one magnitude spectrum.

use std::sync::Arc;

use rustfft::num_complex::Complex;

use super::analyzer::AnalyzerError;
use super::loader::{pack_complex, pack_samples, Channel};
use super::tables::FftTables;

/// Spectrum analyzer session.
///
/// Owns the transform buffer and the magnitude spectrum. Both are allocated
/// once; loading, transforming and reading never allocate.
#[derive(Debug, Clone)]
pub struct SpectrumAnalyzer {
    tables: Arc<FftTables>,
    data: Vec<Complex<f32>>,
    freq: Vec<f32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    /// Create an analyzer on the shared default tables.
    pub fn new() -> Self {
        Self::with_tables(FftTables::shared())
    }

    /// Create an analyzer on an explicit table context.
    pub fn with_tables(tables: Arc<FftTables>) -> Self {
        let fft_size = tables.fft_size();
        Self {
            tables,
            data: vec![Complex::new(0.0, 0.0); fft_size],
            freq: vec![0.0; fft_size],
        }
    }

    pub fn tables(&self) -> &Arc<FftTables> {
        &self.tables
    }

    /// FFT size being used.
    pub fn fft_size(&self) -> usize {
        self.tables.fft_size()
    }

    /// Zero the transform buffer and the spectrum.
    pub fn reset(&mut self) {
        self.data.fill(Complex::new(0.0, 0.0));
        self.freq.fill(0.0);
    }

    /// Pack a raw PCM block of the selected channel into the buffer.
    ///
    /// `bytes` must be exactly `8 * N` long.
    pub fn load_samples(&mut self, bytes: &[u8], channel: Channel) -> Result<(), AnalyzerError> {
        pack_samples(&self.tables, bytes, channel, &mut self.data)
    }

    /// Load `N` complex samples as-is (no window) in bit-reversed order.
    pub fn load_complex(&mut self, samples: &[Complex<f32>]) -> Result<(), AnalyzerError> {
        pack_complex(&self.tables, samples, &mut self.data)
    }

    /// Transform the loaded buffer and compute the magnitude spectrum.
    ///
    /// The buffer must have been filled by [`load_samples`](Self::load_samples)
    /// or [`load_complex`](Self::load_complex) since the last call; otherwise
    /// the result is meaningless. Magnitudes are divided by `N` and multiplied
    /// by `scale_factor`.
    pub fn execute(&mut self, scale_factor: f32) {
        let n = self.fft_size();
        let roots = self.tables.roots();
        let data = &mut self.data;

        // Cooley–Tukey, radix 2
        let mut half = 1;
        let mut stride = n >> 1;
        while stride > 0 {
            for group in (0..n).step_by(half << 1) {
                for b in 0..half {
                    let even = data[group + b];
                    let odd = data[group + b + half] * roots[b * stride];

                    data[group + b] = even + odd;
                    data[group + b + half] = even - odd;
                }
            }
            half <<= 1;
            stride >>= 1;
        }

        for k in 0..n / 2 {
            let mirror = data[n - 1 - k].conj();
            self.freq[k * 2] = 0.5 * (data[k] + mirror).norm() / n as f32 * scale_factor;
            self.freq[k * 2 + 1] = 0.5 * (data[k] - mirror).norm() / n as f32 * scale_factor;
        }

        // DC is counted twice by the unpacking
        self.freq[0] /= 2.0;
    }

    /// Magnitude spectrum of the last [`execute`](Self::execute).
    pub fn spectrum(&self) -> &[f32] {
        &self.freq
    }

    /// Raw complex transform output of the last [`execute`](Self::execute).
    pub fn bins(&self) -> &[Complex<f32>] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::{encode_block, generate_sine};
    use crate::audio::tables::SpectrumDims;
    use crate::audio::FFT_N;

    fn small_analyzer() -> SpectrumAnalyzer {
        let tables = FftTables::generate(SpectrumDims::new(8, 4, 4)).unwrap();
        SpectrumAnalyzer::with_tables(Arc::new(tables))
    }

    #[test]
    fn test_spectrum_analyzer_creation() {
        let analyzer = SpectrumAnalyzer::new();
        assert_eq!(analyzer.fft_size(), FFT_N);
        assert_eq!(analyzer.spectrum().len(), FFT_N);
        assert_eq!(analyzer.bins().len(), FFT_N);
    }

    #[test]
    fn test_zero_buffer_gives_zero_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.load_samples(&vec![0u8; FFT_N * 8], Channel::Mixed).unwrap();
        analyzer.execute(1.0);
        assert!(analyzer.spectrum().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut analyzer = small_analyzer();
        let samples: Vec<Complex<f32>> = (0..8).map(|i| Complex::new(i as f32, 1.0)).collect();
        analyzer.load_complex(&samples).unwrap();
        analyzer.execute(1.0);
        assert!(analyzer.spectrum().iter().any(|&m| m != 0.0));

        analyzer.reset();
        analyzer.execute(1.0);
        assert!(analyzer.spectrum().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_complex_impulse_transform_is_flat() {
        let mut analyzer = small_analyzer();
        let mut samples = vec![Complex::new(0.0, 0.0); 8];
        samples[0] = Complex::new(3.0, -2.0);
        analyzer.load_complex(&samples).unwrap();
        analyzer.execute(1.0);

        for bin in analyzer.bins() {
            assert!((*bin - Complex::new(3.0, -2.0)).norm() < 1e-6);
        }
    }

    #[test]
    fn test_scale_factor_is_linear() {
        let mut analyzer = SpectrumAnalyzer::new();
        let left = generate_sine(1000.0, 44100, FFT_N * 2, 0.25);
        let block = encode_block(&left, &left);

        analyzer.load_samples(&block, Channel::Left).unwrap();
        analyzer.execute(1.0);
        let unit: Vec<f32> = analyzer.spectrum().to_vec();

        analyzer.load_samples(&block, Channel::Left).unwrap();
        analyzer.execute(4.0);
        for (scaled, base) in analyzer.spectrum().iter().zip(&unit) {
            assert!((scaled - base * 4.0).abs() <= base.abs() * 1e-5 + 1e-6);
        }
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        // Complex exponential at bin 37 of the raw transform
        let mut analyzer = SpectrumAnalyzer::new();
        let k0 = 37.0;
        let samples: Vec<Complex<f32>> = (0..FFT_N)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * k0 * n as f32 / FFT_N as f32;
                Complex::new(phase.cos(), phase.sin())
            })
            .collect();
        analyzer.load_complex(&samples).unwrap();
        analyzer.execute(1.0);

        let peak_bin = analyzer
            .bins()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 37);
    }
}
