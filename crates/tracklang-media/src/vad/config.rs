//! Configuration for voice activity filtering.
//!
//! Thresholds are tunable; the defaults match the behaviour the sampling
//! pipeline was calibrated with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which frame classifier to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VadBackend {
    /// Silero VAD v5 (ONNX, bundled model)
    #[default]
    Silero,
    /// Mean-square frame energy against a fixed threshold
    Energy,
}

impl FromStr for VadBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silero" => Ok(VadBackend::Silero),
            "energy" => Ok(VadBackend::Energy),
            other => Err(format!("unknown VAD backend '{}'", other)),
        }
    }
}

impl fmt::Display for VadBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VadBackend::Silero => f.write_str("silero"),
            VadBackend::Energy => f.write_str("energy"),
        }
    }
}

/// Configuration for the voice activity filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    pub backend: VadBackend,

    /// Speech probability at or above which a Silero frame counts as speech (0.0-1.0).
    ///
    /// Silero VAD is trained to output ~0.5 for borderline cases.
    pub speech_threshold: f32,

    /// Mean-square energy above which an energy frame counts as speech.
    ///
    /// 0.0005 is roughly -33 dBFS RMS.
    pub energy_threshold: f32,

    /// Frame length for the energy backend (milliseconds).
    pub energy_frame_ms: u32,

    /// Minimum share of speech frames (0.0-1.0) for a window to be usable.
    ///
    /// Windows below it are reported as "no speech".
    /// - Default: 10% (0.1)
    pub min_voice_ratio: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            backend: VadBackend::Silero,
            speech_threshold: 0.5,
            energy_threshold: 0.0005,
            energy_frame_ms: 30,
            min_voice_ratio: 0.1,
        }
    }
}

impl VadConfig {
    /// Builder-style setter for the backend.
    pub fn with_backend(mut self, backend: VadBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Builder-style setter for the Silero speech threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.speech_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder-style setter for the energy threshold.
    pub fn with_energy_threshold(mut self, threshold: f32) -> Self {
        self.energy_threshold = threshold.max(0.0);
        self
    }

    /// Builder-style setter for the minimum speech share.
    pub fn with_min_voice_ratio(mut self, ratio: f32) -> Self {
        self.min_voice_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}
