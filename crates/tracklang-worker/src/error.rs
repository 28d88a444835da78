//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The video cannot be analysed at all (missing, unreadable, no audio).
    #[error("Input error: {0}")]
    Input(String),

    #[error("Language model initialization failed: {0}")]
    OracleInit(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Track analysis failed: {0}")]
    TrackFailed(String),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Media error: {0}")]
    Media(#[from] tracklang_media::MediaError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] tracklang_oracle::OracleError),

    #[error("VAD error: {0}")]
    Vad(#[from] tracklang_media::VadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn oracle_init(msg: impl Into<String>) -> Self {
        Self::OracleInit(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn track_failed(msg: impl Into<String>) -> Self {
        Self::TrackFailed(msg.into())
    }

    /// Check if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
            || matches!(self, WorkerError::Media(e) if e.is_cancelled())
    }

    /// Check if this error ends the whole run rather than one track.
    pub fn is_fatal(&self) -> bool {
        self.is_cancelled()
            || matches!(
                self,
                WorkerError::Input(_) | WorkerError::OracleInit(_) | WorkerError::ConfigError(_)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklang_media::MediaError;

    #[test]
    fn test_fatal_classification() {
        assert!(WorkerError::input("no audio tracks").is_fatal());
        assert!(WorkerError::Media(MediaError::Cancelled).is_cancelled());
        assert!(!WorkerError::track_failed("boom").is_fatal());
        assert!(!WorkerError::Media(MediaError::Timeout(300)).is_fatal());
    }
}
