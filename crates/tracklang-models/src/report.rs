//! Final analysis report.

use schemars::{schema::RootSchema, schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::verdict::TrackVerdict;

/// Report for one video: one verdict per audio track, in track order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Path of the analysed file
    pub file: String,
    /// Total duration in seconds
    pub duration: f64,
    pub audio_tracks: Vec<TrackVerdict>,
}

impl Report {
    /// Tracks that were analysed (not ignored).
    pub fn processed_tracks(&self) -> impl Iterator<Item = &TrackVerdict> {
        self.audio_tracks.iter().filter(|t| !t.should_ignore)
    }

    /// Tracks flagged as ignored.
    pub fn ignored_tracks(&self) -> impl Iterator<Item = &TrackVerdict> {
        self.audio_tracks.iter().filter(|t| t.should_ignore)
    }

    /// Tracks whose declared language disagrees with the detected one.
    pub fn tracks_needing_review(&self) -> impl Iterator<Item = &TrackVerdict> {
        self.audio_tracks.iter().filter(|t| t.needs_review)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// JSON schema of the report record.
pub fn report_schema() -> RootSchema {
    schema_for!(Report)
}
