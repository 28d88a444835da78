//! Spoken language identification for speech buffers.
//!
//! This crate provides:
//! - The [`LanguageModel`] seam and its backends (HTTP service, whisper.cpp)
//! - [`LanguageOracle`]: chunk voting, ISO 639 normalisation, inference gating and timeouts
//! - Transcript sanity checks

pub mod error;
pub mod http;
pub mod model;
pub mod oracle;
pub mod transcript;
pub mod vote;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use error::{OracleError, OracleResult};
pub use http::{encode_wav, HttpLanguageModel, HttpModelConfig};
pub use model::{LanguageModel, LanguageProbability, MODEL_SAMPLE_RATE};
pub use oracle::{Detection, LanguageOracle, OracleOptions};
pub use transcript::looks_hallucinated;
pub use vote::{split_chunks, tally, Vote};
#[cfg(feature = "whisper")]
pub use whisper::WhisperModel;
