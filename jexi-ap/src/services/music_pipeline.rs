//! Music processing pipeline
//!
//! Stages: 6-way stem separation (the bulk of the work), per-stem
//! activity flagging, lyric transcription from the vocals stem, and
//! full-mix musical analysis. Ends with exactly one persisted metadata
//! record, completed or failed.

use crate::config::MusicConfig;
use crate::engines::EngineSet;
use crate::models::{
    ContentType, JobId, JobMetadata, JobStatus, LyricLine, Lyrics, MusicResult, StemInfo, StemName,
};
use crate::services::feature_extractor::rms;
use crate::services::music_analyzer::MusicAnalyzer;
use crate::services::pipeline::PipelineContext;
use crate::utils::{decode_audio_file, write_mono_wav};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jexi_common::time::format_duration_mmss;
use std::collections::BTreeMap;
use std::path::Path;

pub struct MusicPipeline {
    ctx: PipelineContext,
    engines: EngineSet,
    config: MusicConfig,
    analyzer: MusicAnalyzer,
}

impl MusicPipeline {
    pub fn new(ctx: PipelineContext, engines: EngineSet, config: MusicConfig) -> Self {
        Self {
            ctx,
            engines,
            config,
            analyzer: MusicAnalyzer::new(),
        }
    }

    /// Run the full pipeline for one job
    ///
    /// Never panics out of the job: every error path lands in a persisted
    /// failure record.
    pub fn process(&self, audio_path: &Path, job_id: &JobId) -> JobMetadata {
        tracing::info!(job_id = %job_id, file = %audio_path.display(), "Processing music job");

        self.ctx.registry.set_status(job_id, JobStatus::Processing);
        self.ctx.update_progress(job_id, 0, "Starting processing...");

        match self.run(audio_path, job_id) {
            Ok(result) => self.ctx.complete(job_id, JobMetadata::Music(result)),
            Err(e) => self.ctx.fail(job_id, e),
        }
    }

    fn run(&self, audio_path: &Path, job_id: &JobId) -> Result<MusicResult> {
        self.ctx.store.ensure_job_dir(job_id)?;
        let stems_dir = self.ctx.store.ensure_stems_dir(job_id)?;

        // Stage 1: stem separation, the longest stage by far
        self.ctx
            .update_progress(job_id, 10, "Separating audio stems...");
        let separator = self
            .engines
            .separator
            .as_ref()
            .ok_or_else(|| anyhow!("Stem separation engine not available"))?;

        self.ctx
            .update_progress(job_id, 20, "Running source separation model...");
        let separated = separator
            .lock()
            .separate(audio_path)
            .context("Stem separation")?;

        self.ctx
            .update_progress(job_id, 60, "Saving separated stems...");

        let mut stems = BTreeMap::new();
        let mut vocals: Vec<f32> = Vec::new();
        for (name, samples) in &separated.stems {
            let stem_path = stems_dir.join(format!("{}.wav", name));
            write_mono_wav(&stem_path, samples, separated.sample_rate)
                .with_context(|| format!("Writing {} stem", name))?;

            let active = rms(samples) > self.config.stem_activity_rms as f64;
            tracing::debug!(job_id = %job_id, stem = %name, active = active, "Stem written");

            if *name == StemName::Vocals {
                vocals = samples.clone();
            }
            stems.insert(*name, StemInfo {
                path: stem_path,
                active,
            });
        }
        self.ctx
            .update_progress(job_id, 70, "Stems separated successfully!");

        // Stage 2: lyric transcription from the vocals stem
        self.ctx.update_progress(job_id, 75, "Transcribing lyrics...");
        let lyrics = self.transcribe_vocals(&vocals, separated.sample_rate)?;
        self.ctx.update_progress(job_id, 90, "Lyrics transcribed!");

        // Stage 3: full-mix musical analysis
        self.ctx
            .update_progress(job_id, 95, "Analyzing audio properties...");
        let decoded = decode_audio_file(audio_path).context("Decoding full mix for analysis")?;
        let analysis = self.analyzer.analyze(&decoded.samples, decoded.sample_rate);

        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(MusicResult {
            job_id: job_id.clone(),
            filename,
            status: JobStatus::Completed,
            content_type: ContentType::Music,
            key: analysis.key,
            bpm: analysis.bpm,
            duration: format_duration_mmss(analysis.duration_seconds),
            sample_rate: analysis.sample_rate,
            lyrics,
            stems,
            processed_at: Utc::now(),
        })
    }

    fn transcribe_vocals(&self, vocals: &[f32], sample_rate: u32) -> Result<Lyrics> {
        if vocals.is_empty() {
            return Ok(Lyrics::none_detected());
        }

        let transcriber = self
            .engines
            .transcriber
            .as_ref()
            .ok_or_else(|| anyhow!("Transcription engine not available"))?;

        let output = transcriber
            .lock()
            .transcribe(vocals, sample_rate)
            .context("Lyric transcription")?;

        if output.text.is_empty() {
            return Ok(Lyrics::none_detected());
        }

        Ok(Lyrics {
            plain: output.text,
            timestamped: output
                .segments
                .into_iter()
                .map(|s| LyricLine {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                })
                .collect(),
        })
    }
}
