//! Immutable lookup tables for the packed FFT.
//!
//! Holds the bit-reversal permutation, the analysis window, the logarithmic
//! band scale and the twiddle factors. Tables are generated once per
//! dimension set and shared by reference between analyzer sessions and
//! reducers.

use std::f32::consts::PI;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustfft::num_complex::Complex;

use super::analyzer::AnalyzerError;
use super::{BAND_N, FFT_N, FFT_OUT_N};

static SHARED: Lazy<Arc<FftTables>> = Lazy::new(|| {
    log::debug!(
        "Generating shared FFT tables (N={}, out={}, bands={})",
        FFT_N,
        FFT_OUT_N,
        BAND_N
    );
    Arc::new(FftTables::build(SpectrumDims::default()))
});

/// Dimensions of a spectrum context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumDims {
    /// Transform size `N`.
    pub fft_size: usize,
    /// Output bins of the linear/log reducers.
    pub out_bins: usize,
    /// Number of logarithmic bands.
    pub bands: usize,
}

impl Default for SpectrumDims {
    fn default() -> Self {
        Self {
            fft_size: FFT_N,
            out_bins: FFT_OUT_N,
            bands: BAND_N,
        }
    }
}

impl SpectrumDims {
    pub fn new(fft_size: usize, out_bins: usize, bands: usize) -> Self {
        Self {
            fft_size,
            out_bins,
            bands,
        }
    }

    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(AnalyzerError::InvalidFftSize(self.fft_size));
        }
        if self.out_bins == 0 || self.fft_size % self.out_bins != 0 {
            return Err(AnalyzerError::InvalidOutputBins {
                out_bins: self.out_bins,
                fft_size: self.fft_size,
            });
        }
        if self.bands == 0 {
            return Err(AnalyzerError::InvalidBandCount);
        }
        Ok(())
    }

    /// Length in bytes of one raw PCM block.
    pub fn frame_bytes(&self) -> usize {
        self.fft_size * 8
    }
}

/// Precomputed tables for one set of [`SpectrumDims`].
#[derive(Debug, Clone, PartialEq)]
pub struct FftTables {
    dims: SpectrumDims,
    bitrev: Box<[usize]>,
    window: Box<[f32]>,
    xscale: Box<[f32]>,
    roots: Box<[Complex<f32>]>,
}

impl FftTables {
    /// Generate tables for the given dimensions.
    ///
    /// Generation is pure: calling it twice with the same dimensions yields
    /// bit-identical tables.
    pub fn generate(dims: SpectrumDims) -> Result<Self, AnalyzerError> {
        dims.validate()?;
        log::debug!(
            "Generating FFT tables (N={}, out={}, bands={})",
            dims.fft_size,
            dims.out_bins,
            dims.bands
        );
        Ok(Self::build(dims))
    }

    /// Process-wide tables for the default dimensions.
    ///
    /// Built on first access; every later call returns the same instance.
    pub fn shared() -> Arc<FftTables> {
        Arc::clone(&SHARED)
    }

    fn build(dims: SpectrumDims) -> Self {
        let n = dims.fft_size;
        let bands = dims.bands;
        let bits = n.trailing_zeros();

        let bitrev = (0..n).map(|i| bit_reverse(i, bits)).collect();

        // Hamming-shaped taper over both packed streams
        let window = (0..n * 2)
            .map(|i| 0.53836 - 0.46164 * (i as f32 * 2.0 * PI / (n * 2 - 1) as f32).cos())
            .collect();

        let xscale = (0..=bands)
            .map(|i| (n as f32).powf(i as f32 / bands as f32) - 0.5)
            .collect();

        let roots = (0..n / 2)
            .map(|i| Complex::from_polar(1.0, -(i as f32) * 2.0 * PI / (n - 1) as f32))
            .collect();

        Self {
            dims,
            bitrev,
            window,
            xscale,
            roots,
        }
    }

    pub fn dims(&self) -> SpectrumDims {
        self.dims
    }

    pub fn fft_size(&self) -> usize {
        self.dims.fft_size
    }

    pub fn out_bins(&self) -> usize {
        self.dims.out_bins
    }

    pub fn bands(&self) -> usize {
        self.dims.bands
    }

    /// Bit-reversed position of each transform index.
    pub fn bitrev(&self) -> &[usize] {
        &self.bitrev
    }

    /// `2N` window coefficients, even entries for the real stream and odd
    /// entries for the imaginary stream.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// `B + 1` fractional bin boundaries of the logarithmic bands.
    pub fn xscale(&self) -> &[f32] {
        &self.xscale
    }

    /// `N / 2` twiddle factors.
    pub fn roots(&self) -> &[Complex<f32>] {
        &self.roots
    }
}

fn bit_reverse(mut x: usize, bits: u32) -> usize {
    let mut y = 0;
    for _ in 0..bits {
        y = (y << 1) | (x & 1);
        x >>= 1;
    }
    y
}
