//! Pipeline integration tests with mock engines
//!
//! Exercises both pipeline variants against the job registry, progress
//! tracker, and result store: completion, failure handling, degraded
//! noise suppression, stem activity flags, and terminal-state
//! immutability.

mod helpers;

use helpers::audio_generator::{write_sine_wav, write_speech_like_wav};
use helpers::mock_engines::{
    working_engines, EmptyTranscriber, FailingSeparator, FailingSuppressor, HalvingSuppressor,
    MockTranscriber,
};
use helpers::{pipeline_context, test_state};
use jexi_ap::engines::{Engine, EngineSet, NoiseSuppressor, StemSeparator, Transcriber};
use jexi_ap::models::{ContentType, JobMetadata, JobStatus, StemName};
use jexi_ap::services::{MusicPipeline, SpeechPipeline, StatusSummary};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn music_pipeline_completes_with_stems_and_lyrics() {
    let (_guard, state) = test_state(working_engines());
    let input = state.config.uploads_dir().join("track.wav");
    write_sine_wav(&input, 3.0);

    let job = state
        .registry
        .create_job(ContentType::Music, input.clone());
    let pipeline = MusicPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.music.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);

    let JobMetadata::Music(result) = metadata else {
        panic!("expected music metadata");
    };
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.stems.len(), 6);
    assert_eq!(result.lyrics.plain, "hello world again");
    assert_eq!(result.lyrics.timestamped.len(), 2);

    // Tone-bearing stems are active, silent stems are not
    assert!(result.stems[&StemName::Vocals].active);
    assert!(result.stems[&StemName::Drums].active);
    assert!(!result.stems[&StemName::Bass].active);
    assert!(!result.stems[&StemName::Piano].active);

    // Every stem file exists on disk
    for info in result.stems.values() {
        assert!(info.path.exists(), "missing stem: {}", info.path.display());
    }

    // Durable record is authoritative; transient state is gone
    assert_eq!(state.store.get_status(&job.id), StatusSummary::Completed);
    assert!(state.registry.get(&job.id).is_none());
    assert!(state.progress.get(&job.id).is_none());
}

#[test]
fn all_zero_stem_is_never_active() {
    let (_guard, state) = test_state(working_engines());
    let input = state.config.uploads_dir().join("track.wav");
    write_sine_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Music, input.clone());
    let pipeline = MusicPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.music.clone(),
    );

    let JobMetadata::Music(result) = pipeline.process(&input, &job.id) else {
        panic!("expected music metadata");
    };
    // MockSeparator emits all-zero samples for these stems
    for name in [StemName::Bass, StemName::Guitar, StemName::Piano, StemName::Other] {
        assert!(!result.stems[&name].active, "{} must be inactive", name);
    }
}

#[test]
fn failing_separator_fails_the_job_with_persisted_record() {
    let engines = EngineSet {
        separator: Some(Engine::new(
            Box::new(FailingSeparator) as Box<dyn StemSeparator>
        )),
        transcriber: Some(Engine::new(
            Box::new(MockTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: None,
        tag_model: None,
    };
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("track.wav");
    write_sine_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Music, input.clone());
    let pipeline = MusicPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.music.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);
    assert_eq!(metadata.status(), JobStatus::Failed);
    assert!(metadata.error().unwrap().contains("Stem separation"));

    // Terminal state never transitions again: repeated polls identical
    let first = state.store.get_status(&job.id);
    let second = state.store.get_status(&job.id);
    assert_eq!(first, second);
    match first {
        StatusSummary::Failed { .. } => {}
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn missing_separator_fails_music_job() {
    let engines = EngineSet {
        separator: None,
        transcriber: Some(Engine::new(
            Box::new(MockTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: None,
        tag_model: None,
    };
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("track.wav");
    write_sine_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Music, input.clone());
    let pipeline = MusicPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.music.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);
    assert_eq!(metadata.status(), JobStatus::Failed);
    assert!(metadata.error().unwrap().contains("not available"));
}

#[test]
fn speech_pipeline_completes_with_transcript_exports() {
    let engines = EngineSet {
        separator: None,
        transcriber: Some(Engine::new(
            Box::new(MockTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: Some(Engine::new(
            Box::new(HalvingSuppressor) as Box<dyn NoiseSuppressor>
        )),
        tag_model: None,
    };
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("memo.wav");
    write_speech_like_wav(&input, 3.0);

    let job = state.registry.create_job(ContentType::Speech, input.clone());
    let pipeline = SpeechPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.speech.clone(),
    );

    let JobMetadata::Speech(result) = pipeline.process(&input, &job.id) else {
        panic!("expected speech metadata");
    };
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.sample_rate, 16000);
    assert_eq!(result.transcript.word_count, 3);
    assert!(result.clean_audio_path.exists());

    let job_dir = state.store.job_dir(&job.id);
    assert!(job_dir.join("transcript.txt").exists());
    assert!(job_dir.join("transcript.json").exists());
    assert!(job_dir.join("transcript.srt").exists());

    let srt = std::fs::read_to_string(job_dir.join("transcript.srt")).unwrap();
    assert!(srt.contains("00:00:00,000 --> 00:00:01,200"));
}

#[test]
fn suppressor_failure_degrades_but_job_completes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engines = EngineSet {
        separator: None,
        transcriber: Some(Engine::new(
            Box::new(MockTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: Some(Engine::new(Box::new(FailingSuppressor {
            calls: calls.clone(),
        }) as Box<dyn NoiseSuppressor>)),
        tag_model: None,
    };
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("memo.wav");
    write_speech_like_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Speech, input.clone());
    let pipeline = SpeechPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.speech.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);

    // The suppressor was invoked and failed, yet the job completed with
    // the unprocessed audio
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(metadata.status(), JobStatus::Completed);

    let JobMetadata::Speech(result) = metadata else {
        panic!("expected speech metadata");
    };
    assert!(result.clean_audio_path.exists());
}

#[test]
fn missing_transcriber_fails_speech_job() {
    let engines = EngineSet::default();
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("memo.wav");
    write_speech_like_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Speech, input.clone());
    let pipeline = SpeechPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.speech.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);
    assert_eq!(metadata.status(), JobStatus::Failed);
    assert!(state.registry.get(&job.id).is_none());
    match state.store.get_status(&job.id) {
        StatusSummary::Failed { error } => assert!(error.contains("not available")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn empty_transcription_reports_no_speech() {
    let engines = EngineSet {
        separator: None,
        transcriber: Some(Engine::new(
            Box::new(EmptyTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: None,
        tag_model: None,
    };
    let (_guard, state) = test_state(engines);
    let input = state.config.uploads_dir().join("quiet.wav");
    write_speech_like_wav(&input, 2.0);

    let job = state.registry.create_job(ContentType::Speech, input.clone());
    let pipeline = SpeechPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.speech.clone(),
    );

    let JobMetadata::Speech(result) = pipeline.process(&input, &job.id) else {
        panic!("expected speech metadata");
    };
    assert_eq!(result.transcript.plain, "No speech detected");
    assert_eq!(result.transcript.word_count, 0);
    assert!(result.transcript.segments.is_empty());
}

#[test]
fn undecodable_input_fails_cleanly() {
    let (_guard, state) = test_state(working_engines());
    let input = state.config.uploads_dir().join("broken.wav");
    std::fs::write(&input, b"not a wav").unwrap();

    let job = state.registry.create_job(ContentType::Speech, input.clone());
    let pipeline = SpeechPipeline::new(
        pipeline_context(&state),
        state.engines.clone(),
        state.config.speech.clone(),
    );

    let metadata = pipeline.process(&input, &job.id);
    assert_eq!(metadata.status(), JobStatus::Failed);
    // Exactly one metadata record exists, in the failed shape
    let loaded = state.store.get_metadata(&job.id).unwrap().unwrap();
    assert_eq!(loaded.status(), JobStatus::Failed);
}
