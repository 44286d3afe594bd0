//! Speech processing pipeline
//!
//! Stages: load and resample to the speech rate, learned noise
//! suppression (degrading to the raw audio on failure, never failing the
//! job), transcription with time-aligned segments, and export of the
//! cleaned waveform plus transcript renditions.

use crate::config::SpeechConfig;
use crate::engines::EngineSet;
use crate::models::{
    ContentType, JobId, JobMetadata, JobStatus, SpeechResult, Transcript, TranscriptSegment,
};
use crate::services::pipeline::PipelineContext;
use crate::utils::{decode_audio_file, normalize_peak, resample_mono, write_mono_wav};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jexi_common::time::format_duration_mmss;
use std::path::Path;

pub struct SpeechPipeline {
    ctx: PipelineContext,
    engines: EngineSet,
    config: SpeechConfig,
}

impl SpeechPipeline {
    pub fn new(ctx: PipelineContext, engines: EngineSet, config: SpeechConfig) -> Self {
        Self {
            ctx,
            engines,
            config,
        }
    }

    /// Run the full pipeline for one job
    pub fn process(&self, audio_path: &Path, job_id: &JobId) -> JobMetadata {
        tracing::info!(job_id = %job_id, file = %audio_path.display(), "Processing speech job");

        self.ctx.registry.set_status(job_id, JobStatus::Processing);
        self.ctx
            .update_progress(job_id, 0, "Starting speech processing...");

        match self.run(audio_path, job_id) {
            Ok(result) => self.ctx.complete(job_id, JobMetadata::Speech(result)),
            Err(e) => self.ctx.fail(job_id, e),
        }
    }

    fn run(&self, audio_path: &Path, job_id: &JobId) -> Result<SpeechResult> {
        let job_dir = self.ctx.store.ensure_job_dir(job_id)?;
        let rate = self.config.sample_rate;

        // Stage 1: load and resample to the speech-standard rate
        self.ctx.update_progress(job_id, 10, "Loading audio file...");
        let decoded = decode_audio_file(audio_path).context("Decoding speech audio")?;
        let samples = resample_mono(&decoded.samples, decoded.sample_rate, rate)
            .context("Resampling to speech rate")?;
        let duration_seconds = decoded.duration_seconds;

        // Stage 2: noise suppression; the raw audio is the fallback
        self.ctx
            .update_progress(job_id, 25, "Cleaning audio with noise reduction...");
        let clean = self.suppress_noise(&samples, rate, job_id);

        // Stage 3: transcription
        self.ctx
            .update_progress(job_id, 50, "Transcribing speech to text...");
        let transcriber = self
            .engines
            .transcriber
            .as_ref()
            .ok_or_else(|| anyhow!("Transcription engine not available"))?;
        let output = transcriber
            .lock()
            .transcribe(&clean, rate)
            .context("Speech transcription")?;

        let transcript = if output.text.is_empty() {
            Transcript::no_speech()
        } else {
            let word_count = output.text.split_whitespace().count();
            Transcript {
                plain: output.text,
                segments: output
                    .segments
                    .into_iter()
                    .map(|s| TranscriptSegment {
                        start: s.start,
                        end: s.end,
                        text: s.text,
                    })
                    .collect(),
                word_count,
            }
        };
        self.ctx
            .update_progress(job_id, 85, "Transcription complete!");

        // Stage 4: save the cleaned waveform and transcript exports
        self.ctx
            .update_progress(job_id, 90, "Saving processed audio...");
        let clean_audio_path = job_dir.join("clean_audio.wav");
        write_mono_wav(&clean_audio_path, &normalize_peak(&clean), rate)
            .context("Writing cleaned audio")?;

        self.ctx
            .store
            .write_transcript_exports(job_id, &transcript)
            .context("Writing transcript exports")?;

        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(SpeechResult {
            job_id: job_id.clone(),
            filename,
            status: JobStatus::Completed,
            content_type: ContentType::Speech,
            duration: format_duration_mmss(duration_seconds),
            sample_rate: rate,
            transcript,
            clean_audio_path,
            processed_at: Utc::now(),
        })
    }

    /// Apply noise suppression, falling back to the unprocessed audio
    ///
    /// Suppression failure degrades the output; it never aborts the job.
    fn suppress_noise(&self, samples: &[f32], rate: u32, job_id: &JobId) -> Vec<f32> {
        let Some(engine) = &self.engines.suppressor else {
            tracing::debug!(job_id = %job_id, "No noise suppressor configured, using raw audio");
            return samples.to_vec();
        };

        match engine.lock().suppress(samples, rate) {
            Ok(clean) => clean,
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    error = %e,
                    "Noise suppression failed, falling back to original audio"
                );
                samples.to_vec()
            }
        }
    }
}
