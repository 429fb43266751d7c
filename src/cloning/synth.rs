//! # Simulated Cloned Speech
//!
//! Generates placeholder audio standing in for a voice-cloning model. The
//! output is low-amplitude noise sized from the input text at roughly
//! 50 milliseconds per character, capped at 30 seconds. No watermarking is
//! applied (a non-goal of this fixture).

use anyhow::{Context, Result};
use rand::Rng;
use std::io::Cursor;

/// Sample rate of the placeholder output.
pub const OUTPUT_SAMPLE_RATE: u32 = 22050;

/// Rough per-character speaking duration used to size the output.
const SECONDS_PER_CHAR: f64 = 0.05;

/// Hard cap on placeholder output length.
const MAX_DURATION_SECONDS: f64 = 30.0;

/// Peak amplitude of the placeholder noise (full scale is 1.0).
const NOISE_AMPLITUDE: f32 = 0.1;

/// Estimate how long the "spoken" text would be, in seconds.
pub fn estimated_duration_seconds(text: &str) -> f64 {
    (text.chars().count() as f64 * SECONDS_PER_CHAR).min(MAX_DURATION_SECONDS)
}

/// Generate a placeholder cloned-speech WAV for the given text.
///
/// Returns the complete WAV file as bytes (16-bit mono PCM at 22.05kHz).
/// The content is random noise scaled to `NOISE_AMPLITUDE`; only the
/// duration relates to the input.
pub fn generate_placeholder_speech(text: &str) -> Result<Vec<u8>> {
    let duration = estimated_duration_seconds(text);
    let sample_count = (duration * OUTPUT_SAMPLE_RATE as f64) as usize;

    let mut rng = rand::rng();
    let samples: Vec<i16> = (0..sample_count)
        .map(|_| {
            let noise: f32 = rng.random_range(-1.0..1.0) * NOISE_AMPLITUDE;
            (noise * i16::MAX as f32) as i16
        })
        .collect();

    let header = wav::Header::new(wav::header::WAV_FORMAT_PCM, 1, OUTPUT_SAMPLE_RATE, 16);
    let mut cursor = Cursor::new(Vec::new());
    wav::write(header, &wav::BitDepth::Sixteen(samples), &mut cursor)
        .context("Failed to encode placeholder WAV")?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_scales_with_text() {
        assert_eq!(estimated_duration_seconds(""), 0.0);
        assert!((estimated_duration_seconds("hello") - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_duration_is_capped() {
        let long_text = "a".repeat(10_000);
        assert_eq!(estimated_duration_seconds(&long_text), MAX_DURATION_SECONDS);
    }

    #[test]
    fn test_output_is_valid_wav() {
        let bytes = generate_placeholder_speech("hello world").unwrap();

        let mut cursor = Cursor::new(bytes);
        let (header, track) = wav::read(&mut cursor).unwrap();
        assert_eq!(header.sampling_rate, OUTPUT_SAMPLE_RATE);
        assert_eq!(header.channel_count, 1);

        // ~0.55s of audio for 11 characters
        let expected_samples = (0.55 * OUTPUT_SAMPLE_RATE as f64) as usize;
        match track {
            wav::BitDepth::Sixteen(samples) => {
                assert_eq!(samples.len(), expected_samples);
                // Amplitude stays within the configured bound
                let limit = (NOISE_AMPLITUDE * i16::MAX as f32) as i16 + 1;
                assert!(samples.iter().all(|&s| s.abs() <= limit));
            }
            other => panic!("unexpected bit depth: {:?}", other),
        }
    }
}
