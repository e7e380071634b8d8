//! Raw PCM block loading.
//!
//! A block holds `N` frames of 8 bytes each. Every frame carries four
//! little-endian `i16` samples in the order (left real, right real,
//! left imag, right imag). Two real sample streams of the selected channel
//! are packed as the real and imaginary parts of one complex stream, windowed
//! and written to the transform buffer in bit-reversed order.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use super::analyzer::AnalyzerError;
use super::tables::FftTables;

/// Bytes per transform index.
pub const FRAME_STRIDE: usize = 8;

/// Channel selection for [`pack_samples`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
    #[default]
    Mixed,
}

impl Channel {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            "mixed" | "lr" | "stereo" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Mixed => "mixed",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Left, Self::Right, Self::Mixed]
    }
}

impl TryFrom<u8> for Channel {
    type Error = AnalyzerError;

    /// Decode a raw selector (`0` left, `1` right, `2` mixed).
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            2 => Ok(Self::Mixed),
            other => Err(AnalyzerError::UnknownChannel(other)),
        }
    }
}

/// The four samples of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PcmFrame {
    pub left_re: i16,
    pub right_re: i16,
    pub left_im: i16,
    pub right_im: i16,
}

impl PcmFrame {
    /// Decode one 8-byte frame.
    pub fn from_le_bytes(bytes: [u8; FRAME_STRIDE]) -> Self {
        Self {
            left_re: i16::from_le_bytes([bytes[0], bytes[1]]),
            right_re: i16::from_le_bytes([bytes[2], bytes[3]]),
            left_im: i16::from_le_bytes([bytes[4], bytes[5]]),
            right_im: i16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn to_le_bytes(&self) -> [u8; FRAME_STRIDE] {
        let mut bytes = [0u8; FRAME_STRIDE];
        bytes[0..2].copy_from_slice(&self.left_re.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.right_re.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.left_im.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.right_im.to_le_bytes());
        bytes
    }

    /// Real and imaginary sample of the selected channel.
    pub fn select(&self, channel: Channel) -> (f32, f32) {
        match channel {
            Channel::Left => (self.left_re as f32, self.left_im as f32),
            Channel::Right => (self.right_re as f32, self.right_im as f32),
            Channel::Mixed => (
                (self.left_re as f32 + self.right_re as f32) / 2.0,
                (self.left_im as f32 + self.right_im as f32) / 2.0,
            ),
        }
    }
}

/// Pack a raw block into `buffer`.
///
/// Every slot of `buffer` is overwritten. On a length error nothing is
/// written.
pub fn pack_samples(
    tables: &FftTables,
    bytes: &[u8],
    channel: Channel,
    buffer: &mut [Complex<f32>],
) -> Result<(), AnalyzerError> {
    let expected = tables.dims().frame_bytes();
    if bytes.len() != expected {
        return Err(AnalyzerError::FrameLength {
            expected,
            got: bytes.len(),
        });
    }
    debug_assert_eq!(buffer.len(), tables.fft_size());

    let window = tables.window();
    let bitrev = tables.bitrev();

    for (i, chunk) in bytes.chunks_exact(FRAME_STRIDE).enumerate() {
        let mut raw = [0u8; FRAME_STRIDE];
        raw.copy_from_slice(chunk);
        let (re, im) = PcmFrame::from_le_bytes(raw).select(channel);

        buffer[bitrev[i]] = Complex::new(re * window[i * 2], im * window[i * 2 + 1]);
    }

    Ok(())
}

/// Store pre-windowed complex samples in bit-reversed order.
pub fn pack_complex(
    tables: &FftTables,
    samples: &[Complex<f32>],
    buffer: &mut [Complex<f32>],
) -> Result<(), AnalyzerError> {
    if samples.len() != tables.fft_size() {
        return Err(AnalyzerError::FrameLength {
            expected: tables.fft_size(),
            got: samples.len(),
        });
    }

    for (&slot, &sample) in tables.bitrev().iter().zip(samples) {
        buffer[slot] = sample;
    }

    Ok(())
}
