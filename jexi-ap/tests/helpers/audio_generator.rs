//! Synthetic audio fixture generation
//!
//! Deterministic generators for music-like, speech-like, and degenerate
//! test clips. No randomness crates; "noise" comes from a fixed LCG so
//! every run sees identical bytes.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

pub const FIXTURE_RATE: u32 = 22050;

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Deterministic pseudo-noise in [-1, 1]
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32 / (1u64 << 31) as f32) - 1.0
    }
}

/// Pure 440 Hz sine
pub fn sine_samples(secs: f64, sample_rate: u32) -> Vec<f32> {
    let total = (secs * sample_rate as f64) as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect()
}

pub fn write_sine_wav(path: &Path, secs: f64) {
    write_wav(path, &sine_samples(secs, FIXTURE_RATE), FIXTURE_RATE);
}

pub fn write_silence_wav(path: &Path, secs: f64) {
    let total = (secs * FIXTURE_RATE as f64) as usize;
    write_wav(path, &vec![0.0; total], FIXTURE_RATE);
}

/// Music-like clip: harmonically rich tone pulsed at 120 BPM
///
/// Low zero-crossing rate (fundamental-dominated waveform), wide spectral
/// spread from the harmonic stack, and strong regular onsets.
pub fn music_like_samples(secs: f64, sample_rate: u32) -> Vec<f32> {
    let total = (secs * sample_rate as f64) as usize;
    let fundamental = 440.0f32;
    let nyquist = sample_rate as f32 / 2.0;

    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // Sawtooth-ish harmonic stack below Nyquist
            let mut value = 0.0f32;
            let mut k = 1.0f32;
            while fundamental * k < nyquist * 0.95 {
                value +=
                    (2.0 * std::f32::consts::PI * fundamental * k * t).sin() / k;
                k += 1.0;
            }
            // Hard tremolo gate at 2 Hz: beats at 120 BPM
            let gate = if (t * 2.0).fract() < 0.5 { 1.0 } else { 0.15 };
            0.25 * value * gate
        })
        .collect()
}

pub fn write_music_like_wav(path: &Path, secs: f64) {
    write_wav(path, &music_like_samples(secs, FIXTURE_RATE), FIXTURE_RATE);
}

/// Speech-like clip: irregular low-frequency mumble bursts with pauses
///
/// Smoothed noise keeps spectral mass low; irregular burst lengths defeat
/// the beat tracker; the pauses give high energy variation.
pub fn speech_like_samples(secs: f64, sample_rate: u32) -> Vec<f32> {
    let total = (secs * sample_rate as f64) as usize;
    let mut lcg = Lcg(0x5eed_cafe);

    // Irregular burst/pause schedule (seconds), looped. Two onsets per
    // ~3s cycle keeps the onset rate well under the beat threshold.
    let schedule = [
        (0.93, true),
        (0.48, false),
        (1.14, true),
        (0.61, false),
    ];
    let cycle: f32 = schedule.iter().map(|(d, _)| d).sum();

    let mut smoothed = 0.0f32;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let mut phase = t % cycle;
            let mut voiced = false;
            for &(dur, on) in &schedule {
                if phase < dur {
                    voiced = on;
                    break;
                }
                phase -= dur;
            }

            // Heavy one-pole smoothing concentrates energy low in the band
            let noise = lcg.next();
            smoothed = 0.96 * smoothed + 0.04 * noise;

            if voiced {
                (smoothed * 6.0).clamp(-0.8, 0.8)
            } else {
                0.0
            }
        })
        .collect()
}

pub fn write_speech_like_wav(path: &Path, secs: f64) {
    write_wav(path, &speech_like_samples(secs, FIXTURE_RATE), FIXTURE_RATE);
}
