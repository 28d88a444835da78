//! Voice activity filtering.
//!
//! Reduces a decoded window to the frames that contain speech so the
//! language oracle never listens to music beds or silence.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ Window PCM   │───►│ Frame classifier │───►│ Speech frames    │
//! │ (16kHz mono) │    │ (Silero/energy)  │    │ or NoSpeech      │
//! └──────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! "No speech" is an outcome, not an error: [`VadError`] is reserved for
//! detector failures.

mod config;
mod energy;
mod filter;
mod silero;

pub use config::{VadBackend, VadConfig};
pub use energy::EnergyVad;
pub use filter::{
    filter_speech, FrameClassifier, SpeechAudio, SpeechFilter, SpeechFilterOutcome,
    VoiceActivityFilter,
};
pub use silero::SileroVad;

use thiserror::Error;

/// Errors from VAD operations.
#[derive(Error, Debug)]
pub enum VadError {
    #[error("Failed to initialize Silero VAD: {0}")]
    InitializationFailed(String),

    #[error("VAD inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

/// Result type for VAD operations.
pub type VadResult<T> = Result<T, VadError>;
