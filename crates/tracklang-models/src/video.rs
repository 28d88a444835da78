//! Video asset and audio track models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::language::normalize_declared;

/// An inspected video file. Created once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAsset {
    /// Path of the container on disk
    pub path: PathBuf,
    /// Total duration in seconds (0.0 when the container does not report one)
    pub duration: f64,
    /// Audio tracks in container order
    pub audio_tracks: Vec<AudioTrack>,
}

impl VideoAsset {
    /// Whether the container reported a usable duration.
    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

/// One audio stream of a video asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTrack {
    /// Audio-relative index (the `N` in ffmpeg's `-map 0:a:N`)
    pub id: u32,
    /// Absolute stream index within the container
    pub stream_order: Option<u32>,
    /// Codec name
    pub codec: String,
    /// Channel count
    pub channels: Option<u32>,
    /// Track title, if tagged
    pub title: Option<String>,
    /// Declared language tag exactly as stored in the container
    pub language: Option<String>,
}

impl AudioTrack {
    /// Declared language normalized to ISO 639-2/T.
    ///
    /// `None` when the tag is missing or marks no linguistic content (`und`, `zxx`, ...).
    pub fn declared_iso639_2(&self) -> Option<String> {
        self.language.as_deref().and_then(normalize_declared)
    }

    /// Whether the track declares a language that can be verified.
    pub fn has_declared_language(&self) -> bool {
        self.declared_iso639_2().is_some()
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "track {} ({}, language: {})",
            self.id,
            self.codec,
            self.language.as_deref().unwrap_or("none")
        )
    }
}
