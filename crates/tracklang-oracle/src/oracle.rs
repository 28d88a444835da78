//! Language oracle adapter.
//!
//! Wraps a [`LanguageModel`] with chunk voting, ISO 639 normalisation,
//! a single-inference gate and a per-call timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use tracklang_models::{detected_iso639_2, to_iso639_1};

use crate::error::{OracleError, OracleResult};
use crate::model::{LanguageModel, MODEL_SAMPLE_RATE};
use crate::transcript::looks_hallucinated;
use crate::vote::{split_chunks, tally};

/// Tuning for [`LanguageOracle`].
#[derive(Debug, Clone)]
pub struct OracleOptions {
    /// Upper bound on one detection or transcription, gate wait excluded
    pub timeout: Duration,
    /// Length of one identification chunk in seconds
    pub chunk_secs: u32,
    /// Maximum number of chunks identified per buffer
    pub max_chunks: usize,
    /// Longest stretch of speech sent for transcription, in seconds
    pub transcribe_secs: u32,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            chunk_secs: 30,
            max_chunks: 3,
            transcribe_secs: 90,
        }
    }
}

/// Language identified for one speech buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-1 code where one exists, else the model's code
    pub language: String,
    /// ISO 639-2/T code
    pub language_iso: String,
    /// Certainty in [0, 1]
    pub confidence: f64,
    /// Chunks that voted for `language`
    pub votes: usize,
    /// Chunks identified
    pub chunks: usize,
    pub elapsed: Duration,
}

/// Shared entry point to the loaded language model.
///
/// Cloning is cheap; clones share the model and the inference gate.
#[derive(Clone)]
pub struct LanguageOracle {
    model: Arc<dyn LanguageModel>,
    gate: Arc<Semaphore>,
    options: OracleOptions,
}

impl std::fmt::Debug for LanguageOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageOracle")
            .field("model", &self.model.name())
            .field("options", &self.options)
            .finish()
    }
}

impl LanguageOracle {
    pub fn new(model: Arc<dyn LanguageModel>, options: OracleOptions) -> Self {
        Self {
            model,
            gate: Arc::new(Semaphore::new(1)),
            options,
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn options(&self) -> &OracleOptions {
        &self.options
    }

    /// Identify the language spoken in `speech` (16kHz mono).
    pub async fn detect(&self, speech: &[f32]) -> OracleResult<Detection> {
        if speech.is_empty() {
            return Err(OracleError::EmptyAudio);
        }

        let chunk_len = (self.options.chunk_secs * MODEL_SAMPLE_RATE) as usize;
        let max_chunks = self.options.max_chunks;
        let model = Arc::clone(&self.model);
        // Only the voted chunks leave this call
        let pcm = speech[..voting_span(speech.len(), chunk_len, max_chunks)].to_vec();
        let started = Instant::now();

        let results = self
            .gated(async move {
                let chunks = split_chunks(&pcm, chunk_len, max_chunks);
                let mut results = Vec::with_capacity(chunks.len());
                for (index, chunk) in chunks.into_iter().enumerate() {
                    let result = model.identify(chunk).await?;
                    debug!(
                        chunk = index,
                        language = %result.language,
                        probability = result.probability,
                        "Chunk identified"
                    );
                    results.push(result);
                }
                Ok(results)
            })
            .await?;

        let vote = tally(&results)
            .ok_or_else(|| OracleError::invalid_response("model returned no language"))?;
        let language = normalize_code(&vote.language);
        if language.is_empty() {
            return Err(OracleError::invalid_response("model returned an empty language code"));
        }

        Ok(Detection {
            language_iso: detected_iso639_2(&language),
            language,
            confidence: f64::from(vote.confidence).clamp(0.0, 1.0),
            votes: vote.votes,
            chunks: results.len(),
            elapsed: started.elapsed(),
        })
    }

    /// Transcribe `speech` in `language`.
    ///
    /// Repetition loops are discarded and reported as an empty transcript.
    pub async fn transcribe(&self, speech: &[f32], language: &str) -> OracleResult<String> {
        if speech.is_empty() {
            return Err(OracleError::EmptyAudio);
        }

        let model = Arc::clone(&self.model);
        let limit = (self.options.transcribe_secs as usize)
            .saturating_mul(MODEL_SAMPLE_RATE as usize)
            .max(1);
        let pcm = speech[..speech.len().min(limit)].to_vec();
        let language = language.to_string();

        let text = self
            .gated(async move { model.transcribe(&pcm, &language).await })
            .await?;
        let text = text.trim();

        if looks_hallucinated(text) {
            let snippet: String = text.chars().take(150).collect();
            warn!(snippet = %snippet, "Discarding repetitive transcript");
            return Ok(String::new());
        }

        Ok(text.to_string())
    }

    /// Run `work` while holding the inference permit.
    ///
    /// On timeout the work keeps its permit until it finishes, so a stuck
    /// inference still blocks later ones instead of overlapping them.
    async fn gated<T, F>(&self, work: F) -> OracleResult<T>
    where
        T: Send + 'static,
        F: Future<Output = OracleResult<T>> + Send + 'static,
    {
        let permit = Arc::clone(&self.gate)
            .acquire_owned()
            .await
            .map_err(|_| OracleError::inference("inference gate closed"))?;

        let task = tokio::spawn(async move {
            let _permit = permit;
            work.await
        });

        match tokio::time::timeout(self.options.timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                let millis = self.options.timeout.as_millis() as u64;
                warn!(timeout_ms = millis, model = self.model.name(), "Inference timed out");
                Err(OracleError::Timeout(millis))
            }
        }
    }
}

/// Samples of a `len`-sample buffer covered by at most `max_chunks` chunks.
fn voting_span(len: usize, chunk_len: usize, max_chunks: usize) -> usize {
    chunk_len.saturating_mul(max_chunks.max(1)).min(len)
}

/// Lowercase, strip region subtags and fold 3-letter codes to ISO 639-1.
fn normalize_code(code: &str) -> String {
    let code = code
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match to_iso639_1(&code) {
        Some(short) if code.len() == 3 => short.to_string(),
        _ => code,
    }
}
