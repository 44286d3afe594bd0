//! Mock inference engines for pipeline and API tests

use jexi_ap::engines::{
    Engine, EngineError, EngineSet, NoiseSuppressor, RawSegment, SeparatedStems, StemSeparator,
    TranscriptionOutput, Transcriber,
};
use jexi_ap::models::StemName;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::audio_generator::sine_samples;

/// Separator producing a tone on vocals/drums and silence elsewhere
pub struct MockSeparator;

impl StemSeparator for MockSeparator {
    fn separate(&mut self, _audio_path: &Path) -> Result<SeparatedStems, EngineError> {
        let active = sine_samples(1.0, 8000);
        let silent = vec![0.0f32; 8000];

        let stems = StemName::all()
            .into_iter()
            .map(|name| {
                let samples = match name {
                    StemName::Vocals | StemName::Drums => active.clone(),
                    _ => silent.clone(),
                };
                (name, samples)
            })
            .collect();

        Ok(SeparatedStems {
            sample_rate: 8000,
            stems,
        })
    }
}

/// Separator that always fails
pub struct FailingSeparator;

impl StemSeparator for FailingSeparator {
    fn separate(&mut self, _audio_path: &Path) -> Result<SeparatedStems, EngineError> {
        Err(EngineError::EngineFailed(
            "mock-separator".to_string(),
            "synthetic failure".to_string(),
        ))
    }
}

/// Transcriber returning a fixed two-segment transcript
pub struct MockTranscriber;

impl Transcriber for MockTranscriber {
    fn transcribe(
        &mut self,
        _samples: &[f32],
        _sample_rate: u32,
    ) -> Result<TranscriptionOutput, EngineError> {
        Ok(TranscriptionOutput {
            text: "hello world again".to_string(),
            segments: vec![
                RawSegment {
                    start: 0.0,
                    end: 1.2,
                    text: "hello world".to_string(),
                },
                RawSegment {
                    start: 1.2,
                    end: 2.0,
                    text: "again".to_string(),
                },
            ],
        })
    }
}

/// Transcriber returning silence (no speech detected)
pub struct EmptyTranscriber;

impl Transcriber for EmptyTranscriber {
    fn transcribe(
        &mut self,
        _samples: &[f32],
        _sample_rate: u32,
    ) -> Result<TranscriptionOutput, EngineError> {
        Ok(TranscriptionOutput::default())
    }
}

/// Suppressor that always fails, counting invocations
pub struct FailingSuppressor {
    pub calls: Arc<AtomicUsize>,
}

impl NoiseSuppressor for FailingSuppressor {
    fn suppress(&mut self, _samples: &[f32], _rate: u32) -> Result<Vec<f32>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::EngineFailed(
            "mock-suppressor".to_string(),
            "synthetic failure".to_string(),
        ))
    }
}

/// Suppressor that halves the signal so its effect is observable
pub struct HalvingSuppressor;

impl NoiseSuppressor for HalvingSuppressor {
    fn suppress(&mut self, samples: &[f32], _rate: u32) -> Result<Vec<f32>, EngineError> {
        Ok(samples.iter().map(|s| s * 0.5).collect())
    }
}

/// Engine set with working mock separator and transcriber
pub fn working_engines() -> EngineSet {
    EngineSet {
        separator: Some(Engine::new(
            Box::new(MockSeparator) as Box<dyn StemSeparator>
        )),
        transcriber: Some(Engine::new(
            Box::new(MockTranscriber) as Box<dyn Transcriber>
        )),
        suppressor: None,
        tag_model: None,
    }
}
