//! Data model types for the audio processing service

pub mod job;
pub mod progress;
pub mod results;
pub mod upload;

pub use job::{ContentType, Job, JobId, JobStatus};
pub use progress::ProgressRecord;
pub use results::{
    FailureResult, JobMetadata, LyricLine, Lyrics, MusicResult, SpeechResult, StemInfo, StemName,
    Transcript, TranscriptSegment,
};
pub use upload::{LabelScore, UploadedFile, Verdict};
