//! Language model seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleResult;

/// Sample rate every model receives.
pub const MODEL_SAMPLE_RATE: u32 = 16_000;

/// Most likely language of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProbability {
    /// ISO 639-1 code (`"en"`, `"es"`, ...)
    pub language: String,
    /// Model certainty, nominally in [0, 1]
    pub probability: f32,
}

impl LanguageProbability {
    pub fn new(language: impl Into<String>, probability: f32) -> Self {
        Self {
            language: language.into(),
            probability,
        }
    }
}

/// A spoken-language identification model.
///
/// Implementations receive 16kHz mono PCM. Loading happens once, before the
/// first call; calls are serialised by [`LanguageOracle`](crate::LanguageOracle).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Identify the language of one chunk (at most 30 s).
    async fn identify(&self, pcm: &[f32]) -> OracleResult<LanguageProbability>;

    /// Transcribe `pcm`, assuming it is spoken in `language` (ISO 639-1).
    async fn transcribe(&self, pcm: &[f32], language: &str) -> OracleResult<String>;

    /// Check that the backend can serve requests. In-process models are
    /// ready once loaded.
    async fn health(&self) -> OracleResult<()> {
        Ok(())
    }
}
