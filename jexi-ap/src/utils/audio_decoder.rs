//! Audio decoding utilities
//!
//! Symphonia-based decoding of any supported container (MP3, WAV, OGG,
//! FLAC, AAC/M4A) to mono f32 PCM, plus windowed decoding for classifier
//! sampling points and cheap duration probing.

use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::core::units::Time;

/// Decoded audio as mono f32 samples
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before the mono mixdown
    pub channels: usize,
    pub duration_seconds: f64,
}

struct OpenedTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
}

fn open_track(file_path: &Path) -> Result<OpenedTrack> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    let channels = track
        .codec_params
        .channels
        .context("Channels unknown")?
        .count();

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    Ok(OpenedTrack {
        format,
        decoder,
        track_id,
        sample_rate,
        channels,
    })
}

/// Decode an entire audio file to mono f32 samples
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    decode_from(file_path, 0.0, None)
}

/// Decode up to `max_secs` starting at `offset_secs`
///
/// Offsets beyond the file yield whatever samples remain (possibly none);
/// short files simply produce fewer samples than requested.
pub fn decode_window(file_path: &Path, offset_secs: f64, max_secs: f64) -> Result<DecodedAudio> {
    decode_from(file_path, offset_secs, Some(max_secs))
}

fn decode_from(file_path: &Path, offset_secs: f64, max_secs: Option<f64>) -> Result<DecodedAudio> {
    let mut opened = open_track(file_path)?;

    if offset_secs > 0.0 {
        opened
            .format
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time: Time::from(offset_secs),
                    track_id: Some(opened.track_id),
                },
            )
            .with_context(|| {
                format!(
                    "Failed to seek to {:.1}s in: {}",
                    offset_secs,
                    file_path.display()
                )
            })?;
        // Seeking invalidates decoder state
        opened.decoder.reset();
    }

    let max_samples =
        max_secs.map(|secs| (secs * opened.sample_rate as f64).ceil() as usize);

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        if let Some(limit) = max_samples {
            if all_samples.len() >= limit {
                all_samples.truncate(limit);
                break;
            }
        }

        let packet = match opened.format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => {
                return Err(anyhow::anyhow!("Error reading packet: {}", e));
            }
        };

        if packet.track_id() != opened.track_id {
            continue;
        }

        match opened.decoder.decode(&packet) {
            Ok(decoded) => {
                mix_to_mono(&decoded, &mut all_samples);
            }
            // Skip over corrupt frames rather than abandoning the decode
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::debug!(path = %file_path.display(), error = %e, "Skipping bad packet");
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to decode packet in {}: {}",
                    file_path.display(),
                    e
                ));
            }
        }
    }

    let duration_seconds = all_samples.len() as f64 / opened.sample_rate as f64;

    tracing::debug!(
        path = %file_path.display(),
        offset = offset_secs,
        total_samples = all_samples.len(),
        duration_seconds = format!("{:.2}", duration_seconds),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: all_samples,
        sample_rate: opened.sample_rate,
        channels: opened.channels,
        duration_seconds,
    })
}

/// Total duration in seconds, from codec parameters where available
///
/// Returns None when the container does not carry a frame count (some
/// streams); callers fall back to a full decode.
pub fn probe_duration(file_path: &Path) -> Result<Option<f64>> {
    let opened = open_track(file_path)?;
    let track = opened
        .format
        .tracks()
        .iter()
        .find(|t| t.id == opened.track_id)
        .context("Track disappeared after probe")?;

    let duration = track.codec_params.n_frames.map(|frames| {
        let time_base = track.codec_params.time_base;
        match time_base {
            Some(tb) => {
                let time = tb.calc_time(frames);
                time.seconds as f64 + time.frac
            }
            None => frames as f64 / opened.sample_rate as f64,
        }
    });

    Ok(duration)
}

/// Append a mono mixdown of one decoded buffer, averaging channels
fn mix_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    fn mix<S: Sample + Copy>(
        buf: &symphonia::core::audio::AudioBuffer<S>,
        out: &mut Vec<f32>,
    ) where
        f32: FromSample<S>,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        out.reserve(num_frames);

        for frame_idx in 0..num_frames {
            let mut sum = 0.0f32;
            for ch in 0..num_channels {
                sum += f32::from_sample(buf.chan(ch)[frame_idx]);
            }
            out.push(sum / num_channels as f32);
        }
    }

    match decoded {
        AudioBufferRef::U8(buf) => mix(buf, out),
        AudioBufferRef::U16(buf) => mix(buf, out),
        AudioBufferRef::U24(buf) => mix(buf, out),
        AudioBufferRef::U32(buf) => mix(buf, out),
        AudioBufferRef::S8(buf) => mix(buf, out),
        AudioBufferRef::S16(buf) => mix(buf, out),
        AudioBufferRef::S24(buf) => mix(buf, out),
        AudioBufferRef::S32(buf) => mix(buf, out),
        AudioBufferRef::F32(buf) => mix(buf, out),
        AudioBufferRef::F64(buf) => mix(buf, out),
    }
}
