//! Per-track verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::video::AudioTrack;

/// How a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Regular sampling produced the verdict
    #[default]
    Sampling,
    /// Regular sampling found nothing; the extended window produced the verdict
    ExtendedSampling,
    /// Regular samples and the extended window were aggregated together
    Hybrid,
    /// No speech in any sample, extended window included
    InsufficientAudio,
    /// Every sample failed to decode
    DecodeFailure,
    /// Every sample failed in the oracle
    OracleFailure,
    /// Skipped because of the track title (commentary, extras, ...)
    TitleFilter,
    /// The track pipeline itself failed
    TrackError,
}

impl AnalysisMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMethod::Sampling => "sampling",
            AnalysisMethod::ExtendedSampling => "extended_sampling",
            AnalysisMethod::Hybrid => "hybrid",
            AnalysisMethod::InsufficientAudio => "insufficient_audio",
            AnalysisMethod::DecodeFailure => "decode_failure",
            AnalysisMethod::OracleFailure => "oracle_failure",
            AnalysisMethod::TitleFilter => "title_filter",
            AnalysisMethod::TrackError => "track_error",
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling statistics attached to every verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct AnalysisStats {
    /// Samples with speech and a successful oracle answer
    pub valid_samples: u32,
    /// Samples attempted, extended pass included
    pub total_samples_attempted: u32,
    /// Whether the extended pass ran
    pub extended_analysis: bool,
    /// How the verdict was reached
    pub analysis_method: AnalysisMethod,
}

impl AnalysisStats {
    /// Whether every attempted sample was valid.
    pub fn all_valid(&self) -> bool {
        self.valid_samples == self.total_samples_attempted
    }
}

/// Verdict for one audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackVerdict {
    pub id: u32,
    pub stream_order: Option<u32>,
    pub codec: String,
    pub channels: Option<u32>,
    pub title: Option<String>,
    /// Declared tag as stored in the container
    pub original_language: Option<String>,
    /// Declared tag normalized to ISO 639-2/T
    pub original_language_iso: Option<String>,
    /// Winning ISO 639-1 code
    pub detected_language: Option<String>,
    /// Winning ISO 639-2/T code
    pub detected_language_iso: Option<String>,
    /// Aggregate confidence of the winning language, in [0, 1]
    pub confidence: f64,
    pub needs_review: bool,
    /// Transcript of the best sample, empty unless requested
    pub transcription: String,
    /// No usable speech was found after every strategy
    pub should_ignore: bool,
    pub analysis_stats: AnalysisStats,
}

impl TrackVerdict {
    /// Verdict carrying the track metadata and nothing detected yet.
    pub fn for_track(track: &AudioTrack) -> Self {
        Self {
            id: track.id,
            stream_order: track.stream_order,
            codec: track.codec.clone(),
            channels: track.channels,
            title: track.title.clone(),
            original_language: track.language.clone(),
            original_language_iso: track.declared_iso639_2(),
            detected_language: None,
            detected_language_iso: None,
            confidence: 0.0,
            needs_review: false,
            transcription: String::new(),
            should_ignore: false,
            analysis_stats: AnalysisStats::default(),
        }
    }

    /// Degraded verdict for a track that yielded nothing usable.
    pub fn ignored(track: &AudioTrack, stats: AnalysisStats) -> Self {
        Self {
            should_ignore: true,
            analysis_stats: stats,
            ..Self::for_track(track)
        }
    }

    /// Whether the detected language agrees with the declared one.
    pub fn language_matches(&self) -> bool {
        match (&self.detected_language_iso, &self.original_language_iso) {
            (Some(detected), Some(declared)) => detected.eq_ignore_ascii_case(declared),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> AudioTrack {
        AudioTrack {
            id: 2,
            stream_order: Some(3),
            codec: "ac3".to_string(),
            channels: Some(6),
            title: Some("Castellano".to_string()),
            language: Some("spa".to_string()),
        }
    }

    #[test]
    fn test_for_track_copies_metadata() {
        let verdict = TrackVerdict::for_track(&track());
        assert_eq!(verdict.id, 2);
        assert_eq!(verdict.original_language_iso.as_deref(), Some("spa"));
        assert_eq!(verdict.confidence, 0.0);
        assert!(!verdict.should_ignore);
    }

    #[test]
    fn test_ignored() {
        let stats = AnalysisStats {
            valid_samples: 0,
            total_samples_attempted: 6,
            extended_analysis: true,
            analysis_method: AnalysisMethod::InsufficientAudio,
        };
        let verdict = TrackVerdict::ignored(&track(), stats);
        assert!(verdict.should_ignore);
        assert!(!verdict.needs_review);
        assert!(verdict.detected_language.is_none());
    }

    #[test]
    fn test_method_serializes_snake_case() {
        let json = serde_json::to_string(&AnalysisMethod::ExtendedSampling).unwrap();
        assert_eq!(json, "\"extended_sampling\"");
        assert_eq!(AnalysisMethod::InsufficientAudio.to_string(), "insufficient_audio");
    }
}
