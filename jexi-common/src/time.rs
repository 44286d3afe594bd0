//! Timestamp and duration formatting utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a duration in seconds as "m:ss" (e.g. 245.0 -> "4:05")
pub fn format_duration_mmss(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let minutes = total / 60;
    let secs = total % 60;
    format!("{}:{:02}", minutes, secs)
}

/// Format a timestamp in seconds for SRT subtitles: "HH:MM:SS,mmm"
pub fn format_srt_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    let millis = ((seconds % 1.0) * 1000.0).round() as u64;
    // Rounding 0.9995+ can spill into the next second; clamp to the same frame
    let millis = millis.min(999);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
