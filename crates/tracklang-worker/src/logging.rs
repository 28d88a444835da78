//! Structured track logging utilities.

use tracing::{error, info, warn, Span};

use tracklang_models::AudioTrack;

/// Track logger for structured logging with consistent formatting.
///
/// Every event carries the track id and its declared language.
#[derive(Debug, Clone)]
pub struct TrackLogger {
    track_id: u32,
    declared: String,
}

impl TrackLogger {
    pub fn new(track: &AudioTrack) -> Self {
        Self {
            track_id: track.id,
            declared: track.language.clone().unwrap_or_else(|| "none".to_string()),
        }
    }

    /// Log the start of a track analysis.
    pub fn log_start(&self, message: &str) {
        info!(
            track_id = self.track_id,
            declared = %self.declared,
            "Track started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            track_id = self.track_id,
            declared = %self.declared,
            "Track progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            track_id = self.track_id,
            declared = %self.declared,
            "Track warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            track_id = self.track_id,
            declared = %self.declared,
            "Track error: {}", message
        );
    }

    /// Log the verdict.
    pub fn log_completion(&self, message: &str) {
        info!(
            track_id = self.track_id,
            declared = %self.declared,
            "Track completed: {}", message
        );
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Create a tracing span for this track.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "track",
            track_id = self.track_id,
            declared = %self.declared
        )
    }
}
