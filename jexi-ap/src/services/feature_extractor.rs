//! Acoustic feature extraction
//!
//! Computes the statistical descriptors the content classifier scores:
//! spectral centroid/rolloff/bandwidth, zero-crossing rate, RMS variation,
//! MFCC statistics, tempo and beat strength. All values are derived from a
//! short-time Fourier transform over a fixed analysis window.
//!
//! Silence and short clips are legal inputs: every feature degrades to a
//! defined number (usually zero), never NaN and never a panic.

use realfft::RealFftPlanner;
use thiserror::Error;

/// STFT frame length in samples
const FRAME_SIZE: usize = 2048;
/// Hop between consecutive frames in samples
const HOP_SIZE: usize = 512;
/// Mel filters feeding the cepstral coefficients
const N_MELS: usize = 26;
/// Cepstral coefficients kept per frame
const N_MFCC: usize = 13;

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Zero-length input signal
    #[error("Empty input signal")]
    EmptyInput,

    /// A feature evaluated to NaN or infinity (corrupt input samples)
    #[error("Feature extraction produced non-finite values")]
    NonFinite,
}

/// Statistical acoustic descriptors for one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub spectral_centroid_mean: f64,
    pub spectral_centroid_std: f64,
    pub zcr_mean: f64,
    pub zcr_std: f64,
    pub spectral_rolloff_mean: f64,
    pub mfcc_mean: f64,
    pub mfcc_std: f64,
    /// Estimated tempo in beats per minute
    pub tempo_bpm: f64,
    /// Detected onsets per second
    pub beat_strength: f64,
    pub spectral_bandwidth_mean: f64,
    pub rms_std: f64,
}

impl FeatureVector {
    pub fn is_finite(&self) -> bool {
        [
            self.spectral_centroid_mean,
            self.spectral_centroid_std,
            self.zcr_mean,
            self.zcr_std,
            self.spectral_rolloff_mean,
            self.mfcc_mean,
            self.mfcc_std,
            self.tempo_bpm,
            self.beat_strength,
            self.spectral_bandwidth_mean,
            self.rms_std,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Feature extractor over mono f32 waveforms
#[derive(Debug, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the full feature vector from a waveform segment
    ///
    /// Clips shorter than one frame are zero-padded to a single frame.
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<FeatureVector, FeatureError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptyInput);
        }

        let magnitudes = stft_magnitudes(samples, FRAME_SIZE, HOP_SIZE);
        let freqs = bin_frequencies(sample_rate, FRAME_SIZE);

        // Per-frame spectral statistics
        let mut centroids = Vec::with_capacity(magnitudes.len());
        let mut rolloffs = Vec::with_capacity(magnitudes.len());
        let mut bandwidths = Vec::with_capacity(magnitudes.len());
        for mags in &magnitudes {
            let centroid = spectral_centroid(mags, &freqs);
            centroids.push(centroid);
            rolloffs.push(spectral_rolloff(mags, &freqs, 0.85));
            bandwidths.push(spectral_bandwidth(mags, &freqs, centroid));
        }

        let (centroid_mean, centroid_std) = mean_std(&centroids);
        let (rolloff_mean, _) = mean_std(&rolloffs);
        let (bandwidth_mean, _) = mean_std(&bandwidths);

        // Time-domain statistics
        let zcrs = frame_map(samples, FRAME_SIZE, HOP_SIZE, zero_crossing_rate);
        let (zcr_mean, zcr_std) = mean_std(&zcrs);

        let rms_values = frame_map(samples, FRAME_SIZE, HOP_SIZE, rms);
        let (_, rms_std) = mean_std(&rms_values);

        // Cepstral statistics over the whole coefficient matrix
        let mfccs = mfcc_matrix(&magnitudes, sample_rate);
        let (mfcc_mean, mfcc_std) = mean_std(&mfccs);

        // Rhythm
        let onsets = onset_envelope(&magnitudes);
        let tempo_bpm = estimate_tempo_bpm(&onsets, sample_rate, HOP_SIZE);
        let duration_secs = samples.len() as f64 / sample_rate as f64;
        let beat_strength = if duration_secs > 0.0 {
            count_onset_peaks(&onsets) as f64 / duration_secs
        } else {
            0.0
        };

        let features = FeatureVector {
            spectral_centroid_mean: centroid_mean,
            spectral_centroid_std: centroid_std,
            zcr_mean,
            zcr_std,
            spectral_rolloff_mean: rolloff_mean,
            mfcc_mean,
            mfcc_std,
            tempo_bpm,
            beat_strength,
            spectral_bandwidth_mean: bandwidth_mean,
            rms_std,
        };

        if !features.is_finite() {
            return Err(FeatureError::NonFinite);
        }

        Ok(features)
    }
}

/// Magnitude spectrogram: one Vec of FRAME_SIZE/2+1 bins per frame
pub(crate) fn stft_magnitudes(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Vec<Vec<f32>> {
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);

    let window: Vec<f32> = (0..frame_size)
        .map(|i| {
            let x = std::f32::consts::PI * 2.0 * i as f32 / frame_size as f32;
            0.5 * (1.0 - x.cos())
        })
        .collect();

    // Zero-pad short clips so at least one frame exists
    let padded;
    let signal = if samples.len() < frame_size {
        padded = {
            let mut p = samples.to_vec();
            p.resize(frame_size, 0.0);
            p
        };
        &padded[..]
    } else {
        samples
    };

    let n_frames = (signal.len() - frame_size) / hop_size + 1;
    let mut input = fft.make_input_vec();
    let mut output = fft.make_output_vec();
    let mut frames = Vec::with_capacity(n_frames);

    for frame_idx in 0..n_frames {
        let start = frame_idx * hop_size;
        for (i, slot) in input.iter_mut().enumerate() {
            *slot = signal[start + i] * window[i];
        }

        // Forward FFT only fails on mismatched buffer lengths, which the
        // planner-provided vectors rule out
        if fft.process(&mut input, &mut output).is_err() {
            continue;
        }

        frames.push(output.iter().map(|c| c.norm()).collect());
    }

    frames
}

/// Center frequency of each STFT bin
fn bin_frequencies(sample_rate: u32, frame_size: usize) -> Vec<f64> {
    (0..=frame_size / 2)
        .map(|k| k as f64 * sample_rate as f64 / frame_size as f64)
        .collect()
}

fn spectral_centroid(mags: &[f32], freqs: &[f64]) -> f64 {
    let total: f64 = mags.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = mags
        .iter()
        .zip(freqs)
        .map(|(&m, &f)| m as f64 * f)
        .sum();
    weighted / total
}

fn spectral_rolloff(mags: &[f32], freqs: &[f64], roll_percent: f64) -> f64 {
    let total: f64 = mags.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let threshold = total * roll_percent;
    let mut cumulative = 0.0;
    for (&m, &f) in mags.iter().zip(freqs) {
        cumulative += m as f64;
        if cumulative >= threshold {
            return f;
        }
    }
    *freqs.last().unwrap_or(&0.0)
}

fn spectral_bandwidth(mags: &[f32], freqs: &[f64], centroid: f64) -> f64 {
    let total: f64 = mags.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let variance: f64 = mags
        .iter()
        .zip(freqs)
        .map(|(&m, &f)| m as f64 * (f - centroid).powi(2))
        .sum::<f64>()
        / total;
    variance.sqrt()
}

/// Apply `f` to each analysis frame of the signal
fn frame_map(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    f: impl Fn(&[f32]) -> f64,
) -> Vec<f64> {
    if samples.len() < frame_size {
        return vec![f(samples)];
    }
    let n_frames = (samples.len() - frame_size) / hop_size + 1;
    (0..n_frames)
        .map(|i| f(&samples[i * hop_size..i * hop_size + frame_size]))
        .collect()
}

/// Fraction of adjacent sample pairs that change sign
fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

/// Root-mean-square amplitude of a frame
pub(crate) fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64).powi(2)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// All MFCC coefficients across all frames, flattened
fn mfcc_matrix(magnitudes: &[Vec<f32>], sample_rate: u32) -> Vec<f64> {
    if magnitudes.is_empty() {
        return vec![0.0];
    }

    let n_bins = magnitudes[0].len();
    let filterbank = mel_filterbank(N_MELS, n_bins, sample_rate);

    let mut coeffs = Vec::with_capacity(magnitudes.len() * N_MFCC);
    for mags in magnitudes {
        // Log mel energies in dB, floored to avoid log of zero
        let mut mel_energies = [0.0f64; N_MELS];
        for (mel_idx, filter) in filterbank.iter().enumerate() {
            let energy: f64 = filter
                .iter()
                .map(|&(bin, weight)| (mags[bin] as f64).powi(2) * weight)
                .sum();
            mel_energies[mel_idx] = 10.0 * energy.max(1e-10).log10();
        }

        // DCT-II with orthonormal scaling
        let n = N_MELS as f64;
        for k in 0..N_MFCC {
            let mut sum = 0.0;
            for (m, &e) in mel_energies.iter().enumerate() {
                sum += e * (std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / n).cos();
            }
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            coeffs.push(sum * scale);
        }
    }

    coeffs
}

/// Triangular mel filterbank as (bin, weight) pairs per filter
fn mel_filterbank(n_mels: usize, n_bins: usize, sample_rate: u32) -> Vec<Vec<(usize, f64)>> {
    fn hz_to_mel(hz: f64) -> f64 {
        2595.0 * (1.0 + hz / 700.0).log10()
    }
    fn mel_to_hz(mel: f64) -> f64 {
        700.0 * (10f64.powf(mel / 2595.0) - 1.0)
    }

    let nyquist = sample_rate as f64 / 2.0;
    let mel_max = hz_to_mel(nyquist);
    let frame_size = (n_bins - 1) * 2;

    // n_mels + 2 equally spaced points on the mel scale
    let points: Vec<f64> = (0..n_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64);
            hz * frame_size as f64 / sample_rate as f64
        })
        .collect();

    let mut filters = Vec::with_capacity(n_mels);
    for m in 1..=n_mels {
        let (left, center, right) = (points[m - 1], points[m], points[m + 1]);
        let mut filter = Vec::new();
        let lo = left.floor().max(0.0) as usize;
        let hi = (right.ceil() as usize).min(n_bins - 1);
        for bin in lo..=hi {
            let b = bin as f64;
            let weight = if b < center {
                (b - left) / (center - left).max(1e-9)
            } else {
                (right - b) / (right - center).max(1e-9)
            };
            if weight > 0.0 {
                filter.push((bin, weight));
            }
        }
        filters.push(filter);
    }

    filters
}

/// Spectral flux onset envelope: positive magnitude change per frame
pub(crate) fn onset_envelope(magnitudes: &[Vec<f32>]) -> Vec<f32> {
    if magnitudes.len() < 2 {
        return Vec::new();
    }
    magnitudes
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(&cur, &prev)| (cur - prev).max(0.0))
                .sum()
        })
        .collect()
}

/// Autocorrelation-based tempo estimate over the onset envelope
///
/// Returns 0.0 when the signal carries no usable rhythm information.
pub(crate) fn estimate_tempo_bpm(onsets: &[f32], sample_rate: u32, hop_size: usize) -> f64 {
    let frames_per_sec = sample_rate as f64 / hop_size as f64;
    // Search 30-300 BPM
    let lag_min = ((frames_per_sec * 60.0) / 300.0).floor().max(1.0) as usize;
    let lag_max = ((frames_per_sec * 60.0) / 30.0).ceil() as usize;

    if onsets.len() <= lag_min + 1 {
        return 0.0;
    }
    let lag_max = lag_max.min(onsets.len() - 1);

    let energy: f64 = onsets.iter().map(|&o| (o as f64).powi(2)).sum();
    if energy <= 0.0 {
        return 0.0;
    }

    let mut best_lag = 0usize;
    let mut best_corr = 0.0f64;
    for lag in lag_min..=lag_max {
        let corr: f64 = onsets[..onsets.len() - lag]
            .iter()
            .zip(&onsets[lag..])
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum();
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    if best_lag == 0 || best_corr <= 0.0 {
        return 0.0;
    }

    60.0 * frames_per_sec / best_lag as f64
}

/// Count onset peaks that rise above one standard deviation over the mean
pub(crate) fn count_onset_peaks(onsets: &[f32]) -> usize {
    if onsets.len() < 3 {
        return 0;
    }
    let values: Vec<f64> = onsets.iter().map(|&o| o as f64).collect();
    let (mean, std) = mean_std(&values);
    let threshold = mean + std;

    onsets
        .windows(3)
        .filter(|w| w[1] > w[0] && w[1] >= w[2] && (w[1] as f64) > threshold)
        .count()
}

/// Mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}
