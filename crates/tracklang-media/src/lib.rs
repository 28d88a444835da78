#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for audio sampling.
//!
//! This crate provides:
//! - Container probing (ffprobe) into a [`VideoAsset`](tracklang_models::VideoAsset)
//! - Type-safe FFmpeg command building with timeout and cancellation
//! - Bounded audio window extraction into scoped scratch files
//! - Voice activity filtering (Silero VAD v5 or frame energy)

pub mod command;
pub mod error;
pub mod inspect;
pub mod sampler;
pub mod scratch;
pub mod vad;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use inspect::{inspect_video, InspectOptions};
pub use sampler::{load_f32le, AudioSource, FfmpegAudioSource, SampleAudio, TARGET_SAMPLE_RATE};
pub use scratch::{ScratchDir, ScratchFile};
pub use vad::{
    SpeechAudio, SpeechFilter, SpeechFilterOutcome, VadBackend, VadConfig, VadError, VadResult,
    VoiceActivityFilter,
};
