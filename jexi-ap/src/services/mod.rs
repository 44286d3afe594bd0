//! Service modules for the audio processing workflow

pub mod classifier;
pub mod event_model_classifier;
pub mod feature_extractor;
pub mod job_registry;
pub mod music_analyzer;
pub mod music_pipeline;
pub mod pipeline;
pub mod progress_tracker;
pub mod result_store;
pub mod speech_pipeline;
pub mod upload_registry;

pub use classifier::{ClassifyError, ContentClassifier};
pub use event_model_classifier::EventModelClassifier;
pub use feature_extractor::{FeatureError, FeatureExtractor, FeatureVector};
pub use job_registry::JobRegistry;
pub use music_analyzer::{MusicAnalysis, MusicAnalyzer};
pub use music_pipeline::MusicPipeline;
pub use pipeline::PipelineContext;
pub use progress_tracker::ProgressTracker;
pub use result_store::{ResultStore, StatusSummary, StoreError};
pub use speech_pipeline::SpeechPipeline;
pub use upload_registry::UploadRegistry;
