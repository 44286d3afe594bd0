//! Mono resampling via rubato

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_SIZE: usize = 1024;

/// Resample a mono signal to a new rate
///
/// Returns the input unchanged when the rates already match.
pub fn resample_mono(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .context("Failed to build resampler")?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK_SIZE);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + CHUNK_SIZE).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();
        // Zero-pad the final partial chunk to the fixed input size
        chunk.resize(CHUNK_SIZE, 0.0);

        let processed = resampler
            .process(&[chunk], None)
            .context("Resampler processing failed")?;
        output.extend_from_slice(&processed[0]);

        pos = end;
    }

    output.truncate(expected);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_identity() {
        let samples = vec![0.1f32, 0.2, -0.3];
        let out = resample_mono(&samples, 16000, 16000).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn downsample_produces_expected_length() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let out = resample_mono(&samples, 44100, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn empty_input_stays_empty() {
        let out = resample_mono(&[], 44100, 16000).unwrap();
        assert!(out.is_empty());
    }
}
