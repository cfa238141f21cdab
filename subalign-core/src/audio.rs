//! Audio loading utilities.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Expected sample rate for the acoustic models (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Load audio from a WAV file as mono f32 samples at 16kHz.
///
/// Validates sample rate is 16kHz and converts stereo to mono if needed.
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read
/// - Sample rate is not 16kHz
/// - Channel count is invalid (0 or > 2)
pub fn read_audio_mono(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<hound::Result<_>>()?,
    };

    if spec.sample_rate != SAMPLE_RATE {
        return Err(Error::InvalidSampleRate {
            expected: SAMPLE_RATE,
            got: spec.sample_rate,
        });
    }

    if spec.channels == 0 || spec.channels > 2 {
        return Err(Error::InvalidChannels(spec.channels));
    }

    let samples = if spec.channels == 2 {
        samples
            .chunks(2)
            .map(|chunk| chunk.iter().sum::<f32>() / 2.0)
            .collect()
    } else {
        samples
    };

    Ok(samples)
}

/// Duration in seconds of a 16kHz mono sample buffer.
pub fn duration_secs(samples: &[f32]) -> f64 {
    samples.len() as f64 / SAMPLE_RATE as f64
}
