//! Language model construction.

use std::sync::Arc;
use tracing::info;

use tracklang_oracle::{
    HttpLanguageModel, HttpModelConfig, LanguageModel, LanguageOracle, OracleOptions,
};

use crate::config::OracleConfig;
use crate::error::{WorkerError, WorkerResult};

/// Load the configured language model once for the whole run.
///
/// A service URL takes precedence over a local model file.
pub fn build_model(config: &OracleConfig) -> WorkerResult<Arc<dyn LanguageModel>> {
    if let Some(url) = &config.service_url {
        let mut http = HttpModelConfig::new(url.clone());
        http.timeout = config.timeout;
        let model =
            HttpLanguageModel::new(http).map_err(|e| WorkerError::oracle_init(e.to_string()))?;
        return Ok(Arc::new(model));
    }

    match &config.model_path {
        Some(path) => load_local_model(path, config.threads),
        None => Err(WorkerError::oracle_init(
            "no language model configured (set --model or --oracle-url)",
        )),
    }
}

#[cfg(feature = "whisper")]
fn load_local_model(path: &std::path::Path, threads: usize) -> WorkerResult<Arc<dyn LanguageModel>> {
    let model = tracklang_oracle::WhisperModel::load(path, threads)
        .map_err(|e| WorkerError::oracle_init(e.to_string()))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "whisper"))]
fn load_local_model(path: &std::path::Path, _threads: usize) -> WorkerResult<Arc<dyn LanguageModel>> {
    Err(WorkerError::oracle_init(format!(
        "cannot load {}: built without the `whisper` feature, use --oracle-url",
        path.display()
    )))
}

/// Build the configured model and make sure it can serve requests.
///
/// Returns the backend name.
pub async fn check_model(config: &OracleConfig) -> WorkerResult<&'static str> {
    let model = build_model(config)?;
    model.health().await.map_err(|e| {
        WorkerError::oracle_init(format!("{} backend unhealthy: {}", model.name(), e))
    })?;
    Ok(model.name())
}

/// Adapter options derived from the oracle configuration.
pub fn oracle_options(config: &OracleConfig) -> OracleOptions {
    OracleOptions {
        timeout: config.timeout,
        chunk_secs: config.chunk_secs,
        max_chunks: config.max_chunks,
        transcribe_secs: config.transcribe_secs,
    }
}

/// Build the shared oracle for the run.
pub fn build_oracle(config: &OracleConfig) -> WorkerResult<LanguageOracle> {
    let model = build_model(config)?;
    info!(backend = model.name(), "Language model ready");
    Ok(LanguageOracle::new(model, oracle_options(config)))
}
