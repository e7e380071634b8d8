//! Frame pipeline combining loading, transform and bar reduction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::reducers::check_timing;
use crate::audio::{
    AnalyzerError, BandReducer, BarRange, BarReducer, Channel, FftTables, LinearReducer,
    LogReducer, ReducerMode, SpectrumAnalyzer, SpectrumDims, BAND_DELAY, BAND_FADE, BAND_N, FFT_N,
    FFT_OUT_N,
};

/// Pipeline configuration for turning raw PCM blocks into bar heights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fft_size: usize,
    pub out_bins: usize,
    pub bands: usize,
    pub channel: Channel,
    pub mode: ReducerMode,
    /// Multiplier applied to every spectrum magnitude.
    pub scale_factor: f32,
    pub max_val: u16,
    pub min_val: u16,
    /// Band fade per frame once the hold has expired.
    pub fade: u16,
    /// Frames a band peak is held. May not exceed `fade`.
    pub hold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fft_size: FFT_N,
            out_bins: FFT_OUT_N,
            bands: BAND_N,
            channel: Channel::Mixed,
            mode: ReducerMode::Bands,
            scale_factor: 1.0,
            max_val: 255,
            min_val: 0,
            fade: BAND_FADE,
            hold: BAND_DELAY,
        }
    }
}

impl PipelineConfig {
    pub fn dims(&self) -> SpectrumDims {
        SpectrumDims::new(self.fft_size, self.out_bins, self.bands)
    }

    pub fn range(&self) -> BarRange {
        BarRange::new(self.max_val, self.min_val)
    }

    /// Number of bars written by [`Visualizer::process_frame`].
    pub fn output_len(&self) -> usize {
        match self.mode {
            ReducerMode::Bands => self.bands,
            ReducerMode::Linear | ReducerMode::Log => self.out_bins,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.dims().validate()?;
        check_timing(self.fade, self.hold)?;
        if self.min_val > self.max_val {
            return Err(PipelineError::InvalidRange {
                min: self.min_val,
                max: self.max_val,
            });
        }
        Ok(())
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Invalid bar range: min {min} is above max {max}")]
    InvalidRange { min: u16, max: u16 },
}

/// Visualizer session.
///
/// Owns one analyzer and one instance of each reducer. Tables are shared
/// process-wide for the default dimensions and generated per session
/// otherwise. A session is driven by a single caller, typically once per
/// audio frame.
#[derive(Debug, Clone)]
pub struct Visualizer {
    config: PipelineConfig,
    analyzer: SpectrumAnalyzer,
    linear: LinearReducer,
    log: LogReducer,
    bands: BandReducer,
}

impl Visualizer {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let dims = config.dims();
        let tables = if dims == SpectrumDims::default() {
            FftTables::shared()
        } else {
            Arc::new(FftTables::generate(dims)?)
        };

        log::info!(
            "Visualizer ready: N={}, {} {} bars, channel {}",
            dims.fft_size,
            config.output_len(),
            config.mode.name(),
            config.channel.name()
        );

        Ok(Self {
            analyzer: SpectrumAnalyzer::with_tables(tables.clone()),
            linear: LinearReducer::new(tables.clone()),
            log: LogReducer::new(tables.clone()),
            bands: BandReducer::with_timing(tables, config.fade, config.hold)?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<FftTables> {
        self.analyzer.tables()
    }

    /// Clear the transform buffer and spectrum.
    ///
    /// Tables are already in place, so repeated calls only clear. Band hold
    /// state is kept; see [`reset_bands`](Self::reset_bands).
    pub fn init(&mut self) {
        self.analyzer.reset();
    }

    /// Clear the band hold counters.
    pub fn reset_bands(&mut self) {
        self.bands.reset();
    }

    /// Load a raw PCM block of `8 * N` bytes.
    pub fn load_samples(&mut self, bytes: &[u8], channel: Channel) -> Result<(), PipelineError> {
        Ok(self.analyzer.load_samples(bytes, channel)?)
    }

    /// Transform the most recently loaded block.
    pub fn run_transform(&mut self, scale_factor: f32) {
        self.analyzer.execute(scale_factor);
    }

    /// Magnitude spectrum of the last transform.
    pub fn spectrum(&self) -> &[f32] {
        self.analyzer.spectrum()
    }

    pub fn reduce_linear(
        &mut self,
        out: &mut [u16],
        max_val: u16,
        min_val: u16,
    ) -> Result<(), PipelineError> {
        let range = BarRange::new(max_val, min_val);
        Ok(self.linear.reduce(self.analyzer.spectrum(), out, range)?)
    }

    pub fn reduce_log(
        &mut self,
        out: &mut [u16],
        max_val: u16,
        min_val: u16,
    ) -> Result<(), PipelineError> {
        let range = BarRange::new(max_val, min_val);
        Ok(self.log.reduce(self.analyzer.spectrum(), out, range)?)
    }

    /// Reduce into peak-hold bands, advancing the session's hold state.
    pub fn reduce_bands(
        &mut self,
        out: &mut [u16],
        max_val: u16,
        min_val: u16,
    ) -> Result<(), PipelineError> {
        let range = BarRange::new(max_val, min_val);
        Ok(self.bands.reduce(self.analyzer.spectrum(), out, range)?)
    }

    /// Load, transform and reduce one block using the configured channel,
    /// scale factor, mode and range.
    ///
    /// Lengths are checked up front; on error the session is left untouched.
    pub fn process_frame(&mut self, bytes: &[u8], out: &mut [u16]) -> Result<(), PipelineError> {
        let expected = self.config.output_len();
        if out.len() != expected {
            return Err(AnalyzerError::OutputLength {
                expected,
                got: out.len(),
            }
            .into());
        }

        self.analyzer.load_samples(bytes, self.config.channel)?;
        self.analyzer.execute(self.config.scale_factor);

        let range = self.config.range();
        let reducer: &mut dyn BarReducer = match self.config.mode {
            ReducerMode::Linear => &mut self.linear,
            ReducerMode::Log => &mut self.log,
            ReducerMode::Bands => &mut self.bands,
        };
        reducer.reduce(self.analyzer.spectrum(), out, range)?;

        log::trace!("Processed frame into {} bars", out.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.fft_size, 512);
        assert_eq!(config.output_len(), BAND_N);
        assert_eq!(config.channel, Channel::Mixed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pipeline_config_rejects_bad_values() {
        let config = PipelineConfig {
            fft_size: 300,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(PipelineError::Analyzer(AnalyzerError::InvalidFftSize(300)))
        );

        let config = PipelineConfig {
            max_val: 10,
            min_val: 20,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(PipelineError::InvalidRange { min: 20, max: 10 })
        );
        assert!(Visualizer::new(config).is_err());
    }

    #[test]
    fn test_pipeline_config_rejects_hold_above_fade() {
        let config = PipelineConfig {
            fade: 1,
            hold: 6,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(PipelineError::Analyzer(AnalyzerError::InvalidTiming {
                fade: 1,
                hold: 6
            }))
        );
        assert!(Visualizer::new(config).is_err());

        let config = PipelineConfig {
            fade: 6,
            hold: 6,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_dims_share_tables() {
        let a = Visualizer::new(PipelineConfig::default()).unwrap();
        let b = Visualizer::new(PipelineConfig::default()).unwrap();
        assert!(Arc::ptr_eq(a.tables(), b.tables()));

        let custom = Visualizer::new(PipelineConfig {
            fft_size: 64,
            out_bins: 8,
            bands: 8,
            ..PipelineConfig::default()
        })
        .unwrap();
        assert!(!Arc::ptr_eq(a.tables(), custom.tables()));
        assert_eq!(custom.tables().fft_size(), 64);
    }

    #[test]
    fn test_process_frame_checks_lengths() {
        let mut visualizer = Visualizer::new(PipelineConfig::default()).unwrap();
        let mut out = vec![0u16; BAND_N];
        assert_eq!(
            visualizer.process_frame(&[0u8; 16], &mut out),
            Err(PipelineError::Analyzer(AnalyzerError::FrameLength {
                expected: FFT_N * 8,
                got: 16
            }))
        );

        let mut short = vec![0u16; 3];
        let block = vec![0u8; FFT_N * 8];
        assert!(visualizer.process_frame(&block, &mut short).is_err());
    }

    #[test]
    fn test_process_frame_wrong_output_leaves_session_untouched() {
        let mut visualizer = Visualizer::new(PipelineConfig::default()).unwrap();
        let noise = crate::audio::generate_white_noise(FFT_N * 2, 0.5, 9);
        let block = crate::audio::encode_block(&noise, &noise);
        let mut bars = vec![0u16; BAND_N];
        visualizer.process_frame(&block, &mut bars).unwrap();
        let spectrum = visualizer.spectrum().to_vec();
        let bins = visualizer.analyzer.bins().to_vec();

        let silence = vec![0u8; FFT_N * 8];
        let mut short = vec![0u16; BAND_N - 1];
        assert_eq!(
            visualizer.process_frame(&silence, &mut short),
            Err(PipelineError::Analyzer(AnalyzerError::OutputLength {
                expected: BAND_N,
                got: BAND_N - 1
            }))
        );
        assert_eq!(visualizer.spectrum(), spectrum.as_slice());
        assert_eq!(visualizer.analyzer.bins(), bins.as_slice());
    }

    #[test]
    fn test_init_clears_spectrum() {
        let mut visualizer = Visualizer::new(PipelineConfig::default()).unwrap();
        let noise = crate::audio::generate_white_noise(FFT_N * 2, 0.5, 7);
        let block = crate::audio::encode_block(&noise, &noise);

        visualizer.load_samples(&block, Channel::Left).unwrap();
        visualizer.run_transform(1.0);
        assert!(visualizer.spectrum().iter().any(|&m| m > 0.0));

        visualizer.init();
        visualizer.init();
        assert!(visualizer.spectrum().iter().all(|&m| m == 0.0));
        visualizer.run_transform(1.0);
        assert!(visualizer.spectrum().iter().all(|&m| m == 0.0));
    }
}
