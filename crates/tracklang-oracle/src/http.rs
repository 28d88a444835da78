//! HTTP language identification backend.
//!
//! Talks to a language-id service over two endpoints, each taking a 16kHz
//! mono 16-bit WAV body:
//! - `POST {base}/v1/detect-language` -> `{"language": "es", "probability": 0.93}`
//! - `POST {base}/v1/transcribe?language=es` -> `{"text": "..."}`

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{OracleError, OracleResult};
use crate::model::{LanguageModel, LanguageProbability, MODEL_SAMPLE_RATE};

/// Connection settings for [`HttpLanguageModel`].
#[derive(Debug, Clone)]
pub struct HttpModelConfig {
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl HttpModelConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    language: String,
    probability: f32,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: String,
}

/// [`LanguageModel`] served by a remote language-id service.
#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    http: Client,
    base_url: String,
}

impl HttpLanguageModel {
    pub fn new(config: HttpModelConfig) -> OracleResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(OracleError::model_load("language service URL is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| OracleError::model_load(format!("failed to build HTTP client: {}", e)))?;

        info!(base_url = %base_url, "Using HTTP language service");

        Ok(Self { http, base_url })
    }

    async fn post_wav(
        &self,
        url: String,
        query: &[(&str, &str)],
        pcm: &[f32],
    ) -> OracleResult<Response> {
        let body = encode_wav(pcm, MODEL_SAMPLE_RATE)?;
        debug!(url = %url, bytes = body.len(), "Posting audio to language service");

        let response = self
            .http
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, "audio/wav")
            .body(body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    fn name(&self) -> &'static str {
        "http"
    }

    /// `GET {base}/health` must answer with a success status.
    async fn health(&self) -> OracleResult<()> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn identify(&self, pcm: &[f32]) -> OracleResult<LanguageProbability> {
        let response = self
            .post_wav(format!("{}/v1/detect-language", self.base_url), &[], pcm)
            .await?;
        let detected: DetectResponse = response
            .json()
            .await
            .map_err(|e| OracleError::invalid_response(e.to_string()))?;

        if detected.language.trim().is_empty() {
            return Err(OracleError::invalid_response("empty language code"));
        }

        Ok(LanguageProbability::new(detected.language, detected.probability))
    }

    async fn transcribe(&self, pcm: &[f32], language: &str) -> OracleResult<String> {
        let response = self
            .post_wav(
                format!("{}/v1/transcribe", self.base_url),
                &[("language", language)],
                pcm,
            )
            .await?;
        let transcript: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| OracleError::invalid_response(e.to_string()))?;
        Ok(transcript.text)
    }
}

async fn check_status(response: Response) -> OracleResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(OracleError::from_http_status(status.as_u16(), body))
}

/// Encode mono f32 PCM as a 16-bit WAV file in memory.
pub fn encode_wav(pcm: &[f32], sample_rate: u32) -> OracleResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in pcm {
            let scaled = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(scaled)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
