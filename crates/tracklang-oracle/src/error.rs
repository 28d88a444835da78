//! Error types for language identification.

use thiserror::Error;

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors raised by a language model or the adapter around it.
///
/// These are hard failures: a buffer without speech never reaches the oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Failed to load language model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Inference timed out after {0} ms")]
    Timeout(u64),

    #[error("Empty audio buffer")]
    EmptyAudio,

    #[error("Language service returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("Inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl OracleError {
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Build an error from a non-success HTTP status.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: body.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OracleError::Timeout(_))
    }
}
