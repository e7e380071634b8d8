//! Spectrum analysis for bar visualizers.
//!
//! This module provides:
//! - Lookup tables (bit reversal, window, band scale, twiddles)
//! - Raw PCM block loading with channel selection
//! - A packed real-signal FFT producing a magnitude spectrum
//! - Linear, log and peak-hold band reducers behind a common trait
//! - Synthetic PCM generation for tests and benchmarks

pub mod analyzer;
pub mod fft;
pub mod loader;
pub mod reducers;
pub mod synth;
pub mod tables;

/// Transform size.
pub const FFT_N: usize = 512;
/// Output bins of the linear and log reducers.
pub const FFT_OUT_N: usize = 64;
/// Number of logarithmic bands.
pub const BAND_N: usize = 64;
/// Bar fade per frame once the hold has expired.
pub const BAND_FADE: u16 = 2;
/// Frames a new band peak is held before fading at full rate.
pub const BAND_DELAY: u8 = 2;
/// Length in bytes of one raw PCM block.
pub const FRAME_BYTES: usize = FFT_N * loader::FRAME_STRIDE;

// Re-export commonly used types
pub use analyzer::{create_reducer, AnalyzerError, BarRange, BarReducer, ReducerMode};
pub use fft::SpectrumAnalyzer;
pub use loader::{Channel, PcmFrame};
pub use reducers::{BandReducer, LinearReducer, LogReducer};
pub use synth::{encode_block, generate_impulse, generate_sine, generate_white_noise};
pub use tables::{FftTables, SpectrumDims};
