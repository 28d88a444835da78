//! Sample windows and per-sample outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where in a track a sample is taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SampleWindow {
    /// Position of the sample within its pass (0-based)
    pub index: u32,
    /// Requested offset as a fraction of the total duration
    pub offset_fraction: f64,
    /// Start of the window in seconds
    pub start_secs: f64,
    /// Length of the window in seconds
    pub duration_secs: f64,
    /// Whether the window belongs to the extended pass
    pub extended: bool,
}

impl SampleWindow {
    /// End of the window in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// What happened to one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// Speech was found and the oracle identified its language.
    Speech {
        /// ISO 639-1 code reported by the oracle
        language: String,
        /// ISO 639-2/T form of `language`
        language_iso: String,
        /// Oracle certainty in [0, 1]
        confidence: f64,
        /// Transcript of the speech, empty unless requested
        transcription: String,
    },
    /// The voice activity filter found too little speech.
    NoSpeech {
        /// Share of frames classified as speech, in [0, 1]
        voice_ratio: f64,
    },
    /// The oracle answered below the configured per-sample floor.
    LowConfidence { language: String, confidence: f64 },
    /// Audio could not be extracted or filtered.
    DecodeFailed { reason: String },
    /// The oracle failed or timed out.
    OracleFailed { reason: String },
}

impl SampleOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SampleOutcome::Speech { .. } => "speech",
            SampleOutcome::NoSpeech { .. } => "no_speech",
            SampleOutcome::LowConfidence { .. } => "low_confidence",
            SampleOutcome::DecodeFailed { .. } => "decode_failed",
            SampleOutcome::OracleFailed { .. } => "oracle_failed",
        }
    }
}

/// Result of one pipeline pass over a sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SampleResult {
    pub window: SampleWindow,
    pub outcome: SampleOutcome,
}

impl SampleResult {
    pub fn new(window: SampleWindow, outcome: SampleOutcome) -> Self {
        Self { window, outcome }
    }

    /// Valid samples had speech and a successful oracle answer.
    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Speech { .. })
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self.outcome, SampleOutcome::DecodeFailed { .. })
    }

    pub fn is_oracle_failure(&self) -> bool {
        matches!(self.outcome, SampleOutcome::OracleFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> SampleWindow {
        SampleWindow {
            index: 0,
            offset_fraction: 0.15,
            start_secs: 810.0,
            duration_secs: 90.0,
            extended: false,
        }
    }

    #[test]
    fn test_validity() {
        let speech = SampleResult::new(
            window(),
            SampleOutcome::Speech {
                language: "en".into(),
                language_iso: "eng".into(),
                confidence: 0.9,
                transcription: String::new(),
            },
        );
        assert!(speech.is_valid());

        let silent = SampleResult::new(window(), SampleOutcome::NoSpeech { voice_ratio: 0.02 });
        assert!(!silent.is_valid());
        assert!(!silent.is_decode_failure());
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(SampleOutcome::DecodeFailed {
            reason: "ffmpeg exited 1".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "decode_failed");
        assert_eq!(window().end_secs(), 900.0);
    }
}
