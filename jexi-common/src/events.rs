//! Event types for the Jexi event system
//!
//! Provides shared event definitions and EventBus for the backend.
//! Events are broadcast via EventBus and can be serialized for SSE
//! transmission.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Jexi job event types
///
/// Emitted at upload, confirmation, and each pipeline stage boundary so
/// connected UIs can follow a job without polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// A file was uploaded and classified, awaiting confirmation
    FileUploaded {
        file_id: String,
        filename: String,
        detected_type: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A job was created from a confirmed upload
    JobStarted {
        job_id: String,
        content_type: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Pipeline progress update (one per stage boundary)
    JobProgress {
        job_id: String,
        /// 0-100, or -1 once the job has failed
        percent: i8,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Job reached completed state; results are on disk
    JobCompleted {
        job_id: String,
        content_type: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Job reached failed state
    JobFailed {
        job_id: String,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl JobEvent {
    /// Event type name for SSE `event:` fields
    pub fn event_type(&self) -> &str {
        match self {
            JobEvent::FileUploaded { .. } => "FileUploaded",
            JobEvent::JobStarted { .. } => "JobStarted",
            JobEvent::JobProgress { .. } => "JobProgress",
            JobEvent::JobCompleted { .. } => "JobCompleted",
            JobEvent::JobFailed { .. } => "JobFailed",
        }
    }
}

/// Event bus for broadcasting job events to all subscribers
///
/// Wraps tokio's broadcast channel. Subscribers that fall behind lose the
/// oldest events rather than blocking emitters.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    pub fn emit(
        &self,
        event: JobEvent,
    ) -> Result<usize, broadcast::error::SendError<JobEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events are non-critical; it is acceptable if no component
    /// is currently listening.
    pub fn emit_lossy(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_event_serialization_round_trip() {
        let event = JobEvent::JobProgress {
            job_id: "a1b2c3d4".to_string(),
            percent: 75,
            message: "Transcribing lyrics...".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"JobProgress\""));
        assert!(json.contains("\"percent\":75"));

        let back: JobEvent = serde_json::from_str(&json).expect("deserialize");
        match back {
            JobEvent::JobProgress {
                job_id, percent, ..
            } => {
                assert_eq!(job_id, "a1b2c3d4");
                assert_eq!(percent, 75);
            }
            _ => panic!("wrong event type deserialized"),
        }
    }

    #[test]
    fn error_sentinel_percent_serializes() {
        let event = JobEvent::JobProgress {
            job_id: "deadbeef".to_string(),
            percent: -1,
            message: "Error: decode failed".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"percent\":-1"));
    }

    #[test]
    fn event_type_names() {
        let ev = JobEvent::JobCompleted {
            job_id: "x".into(),
            content_type: "music".into(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(ev.event_type(), "JobCompleted");
    }

    #[tokio::test]
    async fn event_bus_delivers_to_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(JobEvent::JobStarted {
            job_id: "cafe0001".into(),
            content_type: "speech".into(),
            timestamp: chrono::Utc::now(),
        });

        let received = rx.recv().await.expect("event delivered");
        match received {
            JobEvent::JobStarted { job_id, .. } => assert_eq!(job_id, "cafe0001"),
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn emit_lossy_does_not_panic_without_subscribers() {
        let bus = EventBus::new(2);
        for _ in 0..10 {
            bus.emit_lossy(JobEvent::FileUploaded {
                file_id: "f".into(),
                filename: "a.wav".into(),
                detected_type: None,
                timestamp: chrono::Utc::now(),
            });
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
