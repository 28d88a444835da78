//! Local whisper.cpp backend.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

use crate::error::{OracleError, OracleResult};
use crate::model::{LanguageModel, LanguageProbability};

/// [`LanguageModel`] running a ggml Whisper model in-process.
///
/// The model is loaded once; inference runs on the blocking pool against a
/// single reusable decoder state.
pub struct WhisperModel {
    state: Arc<Mutex<WhisperState>>,
    threads: usize,
}

impl WhisperModel {
    /// Load a ggml model file.
    pub fn load(model_path: impl AsRef<Path>, threads: usize) -> OracleResult<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(OracleError::model_load(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        info!(path = %model_path.display(), "Loading Whisper model");

        let path = model_path
            .to_str()
            .ok_or_else(|| OracleError::model_load("Invalid path encoding"))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| OracleError::model_load(e.to_string()))?;
        let state = context
            .create_state()
            .map_err(|e| OracleError::model_load(e.to_string()))?;

        info!(threads, "Whisper model loaded");

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            threads: threads.max(1),
        })
    }

    async fn with_state<T, F>(&self, work: F) -> OracleResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WhisperState, usize) -> OracleResult<T> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let threads = self.threads;
        tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| OracleError::inference("whisper state poisoned"))?;
            work(&mut state, threads)
        })
        .await?
    }
}

#[async_trait]
impl LanguageModel for WhisperModel {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn identify(&self, pcm: &[f32]) -> OracleResult<LanguageProbability> {
        let pcm = pcm.to_vec();
        self.with_state(move |state, threads| {
            state
                .pcm_to_mel(&pcm, threads)
                .map_err(|e| OracleError::inference(e.to_string()))?;
            let (lang_id, probabilities) = state
                .lang_detect(0, threads)
                .map_err(|e| OracleError::inference(e.to_string()))?;
            let language = whisper_rs::get_lang_str(lang_id)
                .ok_or_else(|| OracleError::inference(format!("unknown language id {}", lang_id)))?;
            let probability = usize::try_from(lang_id)
                .ok()
                .and_then(|i| probabilities.get(i).copied())
                .unwrap_or(0.0);
            Ok(LanguageProbability::new(language, probability))
        })
        .await
    }

    async fn transcribe(&self, pcm: &[f32], language: &str) -> OracleResult<String> {
        let pcm = pcm.to_vec();
        let language = language.to_string();
        self.with_state(move |state, threads| {
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_n_threads(threads as i32);
            params.set_language(Some(language.as_str()));
            params.set_no_context(true);
            params.set_temperature(0.0);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_special(false);
            params.set_print_timestamps(false);

            state
                .full(params, &pcm)
                .map_err(|e| OracleError::inference(e.to_string()))?;

            let segments = state
                .full_n_segments()
                .map_err(|e| OracleError::inference(e.to_string()))?;
            let mut text = String::new();
            for segment in 0..segments {
                let piece = state
                    .full_get_segment_text(segment)
                    .map_err(|e| OracleError::inference(e.to_string()))?;
                text.push_str(piece.trim());
                text.push(' ');
            }
            Ok(text.trim_end().to_string())
        })
        .await
    }
}
