//! Reducer trait shared by the linear, log and band reducers.
//!
//! This module provides a common interface for turning a magnitude spectrum
//! into caller-owned bar heights, plus a constructor so hosts can pick a
//! reducer from configuration at runtime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::reducers::{BandReducer, LinearReducer, LogReducer};
use super::tables::FftTables;

/// Error type for spectrum analysis operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("FFT size must be a power of 2 and at least 2, got {0}")]
    InvalidFftSize(usize),
    #[error("Output bin count {out_bins} must be non-zero and divide FFT size {fft_size}")]
    InvalidOutputBins { out_bins: usize, fft_size: usize },
    #[error("Band count must be non-zero")]
    InvalidBandCount,
    #[error("Wrong frame length: need {expected} bytes but got {got}")]
    FrameLength { expected: usize, got: usize },
    #[error("Wrong spectrum length: need {expected} values but got {got}")]
    SpectrumLength { expected: usize, got: usize },
    #[error("Wrong output length: need {expected} bars but got {got}")]
    OutputLength { expected: usize, got: usize },
    #[error("Band hold {hold} must not exceed fade {fade}")]
    InvalidTiming { fade: u16, hold: u8 },
    #[error("Unknown channel selector: {0}")]
    UnknownChannel(u8),
}

/// Clamp range applied to every bar height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRange {
    pub max: u16,
    pub min: u16,
}

impl BarRange {
    pub fn new(max: u16, min: u16) -> Self {
        Self { max, min }
    }

    /// Convert a computed height to `u16` and clamp it.
    ///
    /// The conversion saturates, so negative, `-inf` and NaN heights become 0
    /// before clamping. The upper bound is checked first.
    pub fn clamp(&self, height: f32) -> u16 {
        self.clamp_bar(height as u16)
    }

    pub fn clamp_bar(&self, bar: u16) -> u16 {
        if bar > self.max {
            self.max
        } else if bar < self.min {
            self.min
        } else {
            bar
        }
    }
}

/// Trait for reducers that derive bar heights from a magnitude spectrum.
pub trait BarReducer {
    /// Number of bars written by [`reduce`](Self::reduce).
    fn output_len(&self) -> usize;

    /// Update `out` in place from `spectrum`.
    ///
    /// `spectrum` must hold the full `N`-value magnitude spectrum and `out`
    /// must hold exactly [`output_len`](Self::output_len) bars.
    fn reduce(
        &mut self,
        spectrum: &[f32],
        out: &mut [u16],
        range: BarRange,
    ) -> Result<(), AnalyzerError>;
}

pub(crate) fn check_lengths(
    tables: &FftTables,
    spectrum: &[f32],
    out: &[u16],
    expected_out: usize,
) -> Result<(), AnalyzerError> {
    if spectrum.len() != tables.fft_size() {
        return Err(AnalyzerError::SpectrumLength {
            expected: tables.fft_size(),
            got: spectrum.len(),
        });
    }
    if out.len() != expected_out {
        return Err(AnalyzerError::OutputLength {
            expected: expected_out,
            got: out.len(),
        });
    }
    Ok(())
}

/// Available reducer modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerMode {
    Linear,
    Log,
    #[default]
    Bands,
}

impl ReducerMode {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" | "lin" => Some(Self::Linear),
            "log" | "logarithmic" | "db" => Some(Self::Log),
            "bands" | "band" | "peak" => Some(Self::Bands),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
            Self::Bands => "bands",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Linear => "Equal-width bins, linear magnitude",
            Self::Log => "Equal-width bins, decibel-compressed magnitude",
            Self::Bands => "Logarithmic bands with peak hold and decay",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Linear, Self::Log, Self::Bands]
    }
}

/// Create a reducer instance from its mode.
pub fn create_reducer(mode: ReducerMode, tables: Arc<FftTables>) -> Box<dyn BarReducer> {
    match mode {
        ReducerMode::Linear => Box::new(LinearReducer::new(tables)),
        ReducerMode::Log => Box::new(LogReducer::new(tables)),
        ReducerMode::Bands => Box::new(BandReducer::new(tables)),
    }
}
