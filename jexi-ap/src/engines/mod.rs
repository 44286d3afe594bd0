//! External inference engines
//!
//! The pipelines treat the neural models as black boxes behind narrow
//! traits: a 6-way stem separator, a speech-to-text engine, a noise
//! suppressor, and a general-purpose audio event tagger. The shipped
//! implementations shell out to the corresponding command-line tools and
//! parse their output.
//!
//! Engine instances are not assumed re-entrant. `Engine<T>` wraps each one
//! in a dedicated mutex so concurrent pipelines serialize access to the
//! same loaded model rather than corrupting its state.

pub mod deepfilter;
pub mod demucs;
pub mod tag_model;
pub mod whisper;

pub use deepfilter::DeepFilterSuppressor;
pub use demucs::DemucsSeparator;
pub use tag_model::TagModelClient;
pub use whisper::WhisperTranscriber;

use crate::models::{LabelScore, StemName};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Engine invocation errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found in PATH
    #[error("{0} binary not found in PATH")]
    BinaryNotFound(String),

    /// Failed to execute the engine command
    #[error("Failed to execute {0}: {1}")]
    ExecutionError(String, String),

    /// Engine ran but reported failure
    #[error("{0} failed: {1}")]
    EngineFailed(String, String),

    /// Expected output file missing after a successful run
    #[error("{0} produced no output: {1}")]
    OutputMissing(String, String),

    /// Failed to parse engine output
    #[error("Failed to parse {0} output: {1}")]
    ParseError(String, String),

    /// I/O error moving audio in or out of the engine
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 6-way stem decomposition of one music file
#[derive(Debug, Clone)]
pub struct SeparatedStems {
    /// Sample rate of every stem
    pub sample_rate: u32,
    /// Mono samples per stem, in separator output order
    pub stems: Vec<(StemName, Vec<f32>)>,
}

/// One transcribed segment as the engine reported it
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Raw transcription result before domain shaping
#[derive(Debug, Clone, Default)]
pub struct TranscriptionOutput {
    pub text: String,
    pub segments: Vec<RawSegment>,
}

/// Separates a full mix into the fixed 6-stem decomposition
pub trait StemSeparator: Send {
    fn separate(&mut self, audio_path: &Path) -> Result<SeparatedStems, EngineError>;
}

/// Transcribes speech (or vocals) to time-aligned text
pub trait Transcriber: Send {
    fn transcribe(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<TranscriptionOutput, EngineError>;
}

/// Learned noise suppression over a speech waveform
pub trait NoiseSuppressor: Send {
    fn suppress(&mut self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, EngineError>;
}

/// General-purpose audio event tagger (label/score distribution)
pub trait AudioTagModel: Send {
    fn predict(&mut self, audio_path: &Path) -> Result<Vec<LabelScore>, EngineError>;
}

/// An engine instance behind its dedicated access lock
///
/// One lock per instance: jobs for different files serialize on the same
/// model but never on each other's locks.
pub struct Engine<T: ?Sized> {
    inner: Mutex<Box<T>>,
}

impl<T: ?Sized> Engine<T> {
    pub fn new(inner: Box<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Acquire exclusive access to the engine instance
    ///
    /// A panicked holder leaves the engine usable; the subprocess clients
    /// keep no cross-call state worth invalidating.
    pub fn lock(&self) -> MutexGuard<'_, Box<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The set of engines available to pipelines
///
/// Every engine is optional at startup; a pipeline stage that needs a
/// missing engine fails that job (except noise suppression, which degrades
/// to the unprocessed audio).
#[derive(Clone, Default)]
pub struct EngineSet {
    pub separator: Option<Arc<Engine<dyn StemSeparator>>>,
    pub transcriber: Option<Arc<Engine<dyn Transcriber>>>,
    pub suppressor: Option<Arc<Engine<dyn NoiseSuppressor>>>,
    pub tag_model: Option<Arc<Engine<dyn AudioTagModel>>>,
}

impl EngineSet {
    /// Probe PATH for the known engine binaries
    pub fn detect() -> Self {
        let separator = match DemucsSeparator::new() {
            Ok(engine) => {
                tracing::info!("Stem separation available (demucs)");
                Some(Engine::new(Box::new(engine) as Box<dyn StemSeparator>))
            }
            Err(e) => {
                tracing::warn!("Stem separation unavailable: {}", e);
                None
            }
        };

        let transcriber = match WhisperTranscriber::new() {
            Ok(engine) => {
                tracing::info!("Transcription available (whisper)");
                Some(Engine::new(Box::new(engine) as Box<dyn Transcriber>))
            }
            Err(e) => {
                tracing::warn!("Transcription unavailable: {}", e);
                None
            }
        };

        let suppressor = match DeepFilterSuppressor::new() {
            Ok(engine) => {
                tracing::info!("Noise suppression available (deep-filter)");
                Some(Engine::new(Box::new(engine) as Box<dyn NoiseSuppressor>))
            }
            Err(e) => {
                tracing::warn!(
                    "Noise suppression unavailable, speech jobs will use raw audio: {}",
                    e
                );
                None
            }
        };

        let tag_model = match TagModelClient::new() {
            Ok(engine) => {
                tracing::info!("Audio event model available");
                Some(Engine::new(Box::new(engine) as Box<dyn AudioTagModel>))
            }
            Err(e) => {
                tracing::info!(
                    "Audio event model unavailable, using heuristic classifier: {}",
                    e
                );
                None
            }
        };

        Self {
            separator,
            transcriber,
            suppressor,
            tag_model,
        }
    }
}
