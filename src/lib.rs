//! Phobz Spectrum Core
//!
//! Real-time spectrum analysis for equalizer-style audio visualizers.
//!
//! # Features
//!
//! - Raw 16-bit PCM block loading with left/right/mixed channel selection
//! - Packed real-signal FFT (two real streams in one complex transform)
//! - Linear, log and peak-hold band reducers writing caller-owned bar heights
//! - Shared, immutable lookup tables built once per process
//!
//! # Example
//!
//! ```
//! use phobz_spectrum::{PipelineConfig, Visualizer, BAND_N, FRAME_BYTES};
//!
//! let mut visualizer = Visualizer::new(PipelineConfig::default())?;
//! let block = vec![0u8; FRAME_BYTES];
//! let mut bars = vec![0u16; BAND_N];
//! visualizer.process_frame(&block, &mut bars)?;
//! assert!(bars.iter().all(|&h| h <= 255));
//! # Ok::<(), phobz_spectrum::PipelineError>(())
//! ```

pub mod audio;
pub mod pipeline;

// Re-export commonly used types
pub use audio::{
    AnalyzerError, BandReducer, BarRange, BarReducer, Channel, FftTables, LinearReducer,
    LogReducer, ReducerMode, SpectrumAnalyzer, SpectrumDims, BAND_DELAY, BAND_FADE, BAND_N, FFT_N,
    FFT_OUT_N, FRAME_BYTES,
};
pub use pipeline::{PipelineConfig, PipelineError, Visualizer};
