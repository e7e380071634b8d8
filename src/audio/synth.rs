//! Synthetic PCM generation for testing.
//!
//! Generates 16-bit test streams (sine waves, white noise, impulses) and
//! interleaves them into raw blocks in the loader's frame layout.

use std::f32::consts::PI;

use super::loader::{PcmFrame, FRAME_STRIDE};

/// Generate a 16-bit sine wave.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `num_samples` - Number of samples to generate
/// * `amplitude` - Amplitude (0.0 to 1.0 of full scale)
pub fn generate_sine(
    frequency: f32,
    sample_rate: u32,
    num_samples: usize,
    amplitude: f32,
) -> Vec<i16> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            to_pcm(amplitude * (2.0 * PI * frequency * t).sin())
        })
        .collect()
}

/// Generate 16-bit white noise.
///
/// Uses a simple linear congruential generator for reproducibility.
pub fn generate_white_noise(num_samples: usize, amplitude: f32, seed: u64) -> Vec<i16> {
    let mut state = seed;
    let a: u64 = 6364136223846793005;
    let c: u64 = 1442695040888963407;

    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(a).wrapping_add(c);
            let normalized = (state as f32 / u64::MAX as f32) * 2.0 - 1.0;
            to_pcm(amplitude * normalized)
        })
        .collect()
}

/// Generate a single impulse of `value` at `position`.
pub fn generate_impulse(num_samples: usize, position: usize, value: i16) -> Vec<i16> {
    let mut samples = vec![0; num_samples];
    if let Some(sample) = samples.get_mut(position) {
        *sample = value;
    }
    samples
}

/// Interleave two streams into a raw block.
///
/// Each stream holds `2N` samples. Even samples become the real part and odd
/// samples the imaginary part of transform index `i / 2`. The shorter stream
/// decides the block length.
pub fn encode_block(left: &[i16], right: &[i16]) -> Vec<u8> {
    let frames = left.len().min(right.len()) / 2;
    let mut bytes = Vec::with_capacity(frames * FRAME_STRIDE);

    for i in 0..frames {
        let frame = PcmFrame {
            left_re: left[i * 2],
            right_re: right[i * 2],
            left_im: left[i * 2 + 1],
            right_im: right[i * 2 + 1],
        };
        bytes.extend_from_slice(&frame.to_le_bytes());
    }

    bytes
}

fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sine() {
        let samples = generate_sine(440.0, 44100, 44100, 0.5);
        assert_eq!(samples.len(), 44100);

        // Check amplitude
        let max = samples.iter().cloned().max().unwrap();
        let expected = (0.5 * i16::MAX as f32) as i16;
        assert!((max - expected).abs() < 200);
    }

    #[test]
    fn test_generate_white_noise() {
        let samples = generate_white_noise(44100, 1.0, 12345);
        assert_eq!(samples.len(), 44100);

        // Should have both positive and negative values
        let has_positive = samples.iter().any(|&s| s > 0);
        let has_negative = samples.iter().any(|&s| s < 0);
        assert!(has_positive && has_negative);

        // Same seed, same noise
        assert_eq!(samples, generate_white_noise(44100, 1.0, 12345));
    }

    #[test]
    fn test_generate_impulse() {
        let samples = generate_impulse(16, 3, 1000);
        assert_eq!(samples.iter().filter(|&&s| s != 0).count(), 1);
        assert_eq!(samples[3], 1000);

        // Out of range position gives silence
        assert!(generate_impulse(4, 9, 1000).iter().all(|&s| s == 0));
    }

    #[test]
    fn test_encode_block_layout() {
        let left = [1, 2, 3, 4];
        let right = [-1, -2, -3, -4];
        let bytes = encode_block(&left, &right);
        assert_eq!(bytes.len(), 2 * FRAME_STRIDE);

        let mut first = [0u8; FRAME_STRIDE];
        first.copy_from_slice(&bytes[..FRAME_STRIDE]);
        assert_eq!(
            PcmFrame::from_le_bytes(first),
            PcmFrame {
                left_re: 1,
                right_re: -1,
                left_im: 2,
                right_im: -2,
            }
        );
    }
}
