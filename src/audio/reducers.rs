//! Spectrum-to-bar reducers.
//!
//! - [`LinearReducer`]: equal-width bins, linear magnitude
//! - [`LogReducer`]: equal-width bins, decibel-compressed magnitude
//! - [`BandReducer`]: logarithmic bands with peak hold and decay
//!
//! The linear and log reducers average each new height with the previous
//! one. The band reducer instead snaps up to new peaks and fades afterwards.

use std::sync::Arc;

use super::analyzer::{check_lengths, AnalyzerError, BarRange, BarReducer};
use super::tables::FftTables;
use super::{BAND_DELAY, BAND_FADE};

/// Full-scale divisor for the linear and log reducers.
const LIN_SCALE: f32 = 40.0;
/// Full-scale divisor for the band reducer.
const BAND_SCALE: f32 = 64.0;
/// Offset that lifts band decibels into the visible range.
const BAND_OFFSET: f32 = 40.0;
/// Energy normalisation for the band reducer.
const BAND_NORM: f32 = 12.0;

/// Twice the mean of bin group `idx` of width `step`.
fn group_level(spectrum: &[f32], step: usize, idx: usize) -> f32 {
    let sum: f32 = spectrum[step * idx..step * (idx + 1)].iter().sum();
    sum / step as f32 * 2.0
}

/// Integrate the spectrum over fractional bins `[lo, hi)` and convert to dB.
///
/// `spectrum` must hold `n` values and `hi` must not exceed `n`.
fn band_level(spectrum: &[f32], n: usize, lo: f32, hi: f32, bands: usize) -> f32 {
    let a = lo.ceil() as usize;
    let b = hi.floor() as usize;

    let mut energy = 0.0;
    if b < a {
        energy += spectrum[b] * (hi - lo);
    } else {
        if a > 0 {
            energy += spectrum[a - 1] * (a as f32 - lo);
        }
        energy += spectrum[a..b].iter().sum::<f32>();
        if b < n {
            energy += spectrum[b] * (hi - b as f32);
        }
    }

    20.0 * (energy * bands as f32 / n as f32 / BAND_NORM).log10()
}

/// Reject a hold longer than the fade rate.
pub(crate) fn check_timing(fade: u16, hold: u8) -> Result<(), AnalyzerError> {
    if u16::from(hold) > fade {
        return Err(AnalyzerError::InvalidTiming { fade, hold });
    }
    Ok(())
}

fn average_into(out: &mut u16, level: f32, range: BarRange) {
    let sum = (*out as f32 + level) as u16;
    *out = range.clamp(sum as f32 / 2.0);
}

/// Linear-magnitude reducer over `M` equal-width groups.
#[derive(Debug, Clone)]
pub struct LinearReducer {
    tables: Arc<FftTables>,
}

impl LinearReducer {
    pub fn new(tables: Arc<FftTables>) -> Self {
        Self { tables }
    }
}

impl BarReducer for LinearReducer {
    fn output_len(&self) -> usize {
        self.tables.out_bins()
    }

    fn reduce(
        &mut self,
        spectrum: &[f32],
        out: &mut [u16],
        range: BarRange,
    ) -> Result<(), AnalyzerError> {
        check_lengths(&self.tables, spectrum, out, self.output_len())?;
        let step = self.tables.fft_size() / self.tables.out_bins();
        let scale = range.max as f32 / LIN_SCALE;

        for (i, bar) in out.iter_mut().enumerate() {
            average_into(bar, group_level(spectrum, step, i) * scale, range);
        }
        Ok(())
    }
}

/// Decibel-compressed reducer over `M` equal-width groups.
#[derive(Debug, Clone)]
pub struct LogReducer {
    tables: Arc<FftTables>,
}

impl LogReducer {
    pub fn new(tables: Arc<FftTables>) -> Self {
        Self { tables }
    }
}

impl BarReducer for LogReducer {
    fn output_len(&self) -> usize {
        self.tables.out_bins()
    }

    fn reduce(
        &mut self,
        spectrum: &[f32],
        out: &mut [u16],
        range: BarRange,
    ) -> Result<(), AnalyzerError> {
        check_lengths(&self.tables, spectrum, out, self.output_len())?;
        let step = self.tables.fft_size() / self.tables.out_bins();
        let scale = range.max as f32 / LIN_SCALE;

        for (i, bar) in out.iter_mut().enumerate() {
            let db = 20.0 * (1.0 + group_level(spectrum, step, i)).log10();
            average_into(bar, db * scale, range);
        }
        Ok(())
    }
}

/// Logarithmic band reducer with per-band peak hold.
///
/// Each band keeps a hold counter. A new peak resets it to the hold
/// duration; while it counts down the bar fades by `fade - counter` per
/// frame, then by the full fade rate.
#[derive(Debug, Clone)]
pub struct BandReducer {
    tables: Arc<FftTables>,
    fade: u16,
    hold: u8,
    delay: Vec<u8>,
}

impl BandReducer {
    /// Create a reducer with the default fade rate and hold duration.
    pub fn new(tables: Arc<FftTables>) -> Self {
        Self::build(tables, BAND_FADE, BAND_DELAY)
    }

    /// Create a reducer with a custom fade rate and hold duration.
    ///
    /// `hold` may not exceed `fade`, otherwise a held bar would rise without
    /// a new peak.
    pub fn with_timing(
        tables: Arc<FftTables>,
        fade: u16,
        hold: u8,
    ) -> Result<Self, AnalyzerError> {
        check_timing(fade, hold)?;
        Ok(Self::build(tables, fade, hold))
    }

    fn build(tables: Arc<FftTables>, fade: u16, hold: u8) -> Self {
        let bands = tables.bands();
        Self {
            tables,
            fade,
            hold,
            delay: vec![0; bands],
        }
    }

    pub fn fade(&self) -> u16 {
        self.fade
    }

    pub fn hold(&self) -> u8 {
        self.hold
    }

    /// Remaining hold frames per band.
    pub fn delays(&self) -> &[u8] {
        &self.delay
    }

    /// Clear all hold counters.
    pub fn reset(&mut self) {
        self.delay.fill(0);
    }

    /// Candidate heights for the current spectrum, before hold and decay.
    pub fn levels<'a>(
        &'a self,
        spectrum: &'a [f32],
        max_val: u16,
    ) -> Result<impl Iterator<Item = f32> + 'a, AnalyzerError> {
        let n = self.tables.fft_size();
        if spectrum.len() != n {
            return Err(AnalyzerError::SpectrumLength {
                expected: n,
                got: spectrum.len(),
            });
        }

        let bands = self.tables.bands();
        let scale = max_val as f32 / BAND_SCALE;
        Ok(self.tables.xscale().windows(2).map(move |edge| {
            (BAND_OFFSET + band_level(spectrum, n, edge[0], edge[1], bands)) * scale
        }))
    }
}

impl BarReducer for BandReducer {
    fn output_len(&self) -> usize {
        self.tables.bands()
    }

    fn reduce(
        &mut self,
        spectrum: &[f32],
        out: &mut [u16],
        range: BarRange,
    ) -> Result<(), AnalyzerError> {
        check_lengths(&self.tables, spectrum, out, self.output_len())?;

        let n = self.tables.fft_size();
        let bands = self.tables.bands();
        let scale = range.max as f32 / BAND_SCALE;
        let xscale = self.tables.xscale();

        for (i, (bar, delay)) in out.iter_mut().zip(self.delay.iter_mut()).enumerate() {
            let x =
                (BAND_OFFSET + band_level(spectrum, n, xscale[i], xscale[i + 1], bands)) * scale;

            let decay = i32::from(self.fade) - i32::from(*delay);
            let faded = (i32::from(*bar) - decay).max(0);
            *bar = faded.min(i32::from(u16::MAX)) as u16;

            if *delay > 0 {
                *delay -= 1;
            }

            if x > f32::from(*bar) {
                *bar = x as u16;
                *delay = self.hold;
            }

            *bar = range.clamp_bar(*bar);
        }
        Ok(())
    }
}
