//! Video processor.
//!
//! Inspects a container, runs every audio track through the
//! [`TrackAnalyzer`] and assembles the report.

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tracing::{info, Instrument};

use tracklang_media::{
    inspect_video, AudioSource, FfmpegAudioSource, FfmpegRunner, MediaError, InspectOptions,
    ScratchDir, SpeechFilter, VoiceActivityFilter, TARGET_SAMPLE_RATE,
};
use tracklang_models::{
    AnalysisMethod, AnalysisStats, AudioTrack, Report, TrackVerdict, VideoAsset,
};
use tracklang_oracle::LanguageOracle;

use crate::analyzer::TrackAnalyzer;
use crate::config::AnalyzerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TrackLogger;
use crate::metrics;
use crate::sampling::SamplingStrategy;
use crate::verifier::TrackVerifier;

/// Analyses every audio track of a video.
pub struct VideoProcessor {
    config: AnalyzerConfig,
    oracle: LanguageOracle,
    speech: Arc<dyn SpeechFilter>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl VideoProcessor {
    pub fn new(config: AnalyzerConfig, oracle: LanguageOracle) -> Self {
        let speech = Arc::new(VoiceActivityFilter::new(config.vad.clone()));
        Self {
            config,
            oracle,
            speech,
            cancel_rx: None,
        }
    }

    /// Replace the voice activity filter.
    pub fn with_speech_filter(mut self, speech: Arc<dyn SpeechFilter>) -> Self {
        self.speech = speech;
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Make sure the voice activity filter can be built.
    pub fn check_vad(&self) -> WorkerResult<()> {
        VoiceActivityFilter::new(self.config.vad.clone()).check(TARGET_SAMPLE_RATE)?;
        Ok(())
    }

    /// Inspect `path` and analyse all of its audio tracks.
    pub async fn process(&self, path: &Path) -> WorkerResult<Report> {
        let asset = inspect_video(
            path,
            &InspectOptions {
                timeout: self.config.inspect_timeout,
            },
        )
        .await
        .map_err(input_error)?;

        if asset.audio_tracks.is_empty() {
            return Err(WorkerError::input(format!(
                "no audio tracks in {}",
                path.display()
            )));
        }

        // Removed with everything in it when this function returns
        let scratch = Arc::new(ScratchDir::new_in(&self.config.work_dir)?);

        let mut runner = FfmpegRunner::new().with_timeout(self.config.decode_timeout);
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }
        let source: Arc<dyn AudioSource> =
            Arc::new(FfmpegAudioSource::new(path, Arc::clone(&scratch), runner));

        self.analyze_asset(&asset, source).await
    }

    /// Analyse an already inspected asset with the given audio source.
    ///
    /// The report holds exactly one verdict per track, in track order.
    pub async fn analyze_asset(
        &self,
        asset: &VideoAsset,
        source: Arc<dyn AudioSource>,
    ) -> WorkerResult<Report> {
        info!(
            file = %asset.path.display(),
            duration = asset.duration,
            tracks = asset.audio_tracks.len(),
            parallel = self.config.max_parallel_tracks,
            "Analysing audio tracks"
        );

        let analyzer = Arc::new(self.analyzer(source));
        let gate = Arc::new(Semaphore::new(self.config.max_parallel_tracks.max(1)));
        let duration = asset.duration;

        let handles = asset.audio_tracks.iter().cloned().map(|track| {
            let analyzer = Arc::clone(&analyzer);
            let gate = Arc::clone(&gate);
            let span = TrackLogger::new(&track).create_span();
            tokio::spawn(
                async move {
                    let _permit = gate
                        .acquire_owned()
                        .await
                        .map_err(|_| WorkerError::track_failed("track gate closed"))?;
                    analyzer.analyze(&track, duration).await
                }
                .instrument(span),
            )
        });
        let outcomes = join_all(handles).await;

        let mut verdicts = Vec::with_capacity(outcomes.len());
        let mut cancelled = false;
        for (track, outcome) in asset.audio_tracks.iter().zip(outcomes) {
            let verdict = match outcome {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) if e.is_cancelled() => {
                    cancelled = true;
                    continue;
                }
                Ok(Err(e)) => track_error(track, &e.to_string()),
                Err(e) => track_error(track, &format!("track task failed: {}", e)),
            };
            metrics::record_track(verdict.analysis_stats.analysis_method.as_str());
            verdicts.push(verdict);
        }

        if cancelled || self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(WorkerError::Cancelled);
        }

        let report = Report {
            file: asset.path.display().to_string(),
            duration: asset.duration,
            audio_tracks: verdicts,
        };

        info!(
            processed = report.processed_tracks().count(),
            ignored = report.ignored_tracks().count(),
            needs_review = report.tracks_needing_review().count(),
            "Analysis complete"
        );

        Ok(report)
    }

    fn analyzer(&self, source: Arc<dyn AudioSource>) -> TrackAnalyzer {
        let analyzer = TrackAnalyzer::new(
            source,
            Arc::clone(&self.speech),
            self.oracle.clone(),
            SamplingStrategy::new(self.config.sampling.clone()),
            TrackVerifier::new(self.config.verifier.clone()),
        )
        .with_transcription(self.config.oracle.transcribe);

        match &self.cancel_rx {
            Some(rx) => analyzer.with_cancel(rx.clone()),
            None => analyzer,
        }
    }
}

/// Degraded verdict for a track whose pipeline failed outright.
fn track_error(track: &AudioTrack, reason: &str) -> TrackVerdict {
    TrackLogger::new(track).log_error(reason);
    TrackVerdict::ignored(
        track,
        AnalysisStats {
            analysis_method: AnalysisMethod::TrackError,
            ..AnalysisStats::default()
        },
    )
}

fn input_error(e: MediaError) -> WorkerError {
    match e {
        MediaError::Cancelled => WorkerError::Cancelled,
        MediaError::FileNotFound(_)
        | MediaError::FfprobeFailed { .. }
        | MediaError::InvalidVideo(_)
        | MediaError::JsonParse(_)
        | MediaError::Timeout(_) => WorkerError::input(e.to_string()),
        other => WorkerError::Media(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_failures_are_input_errors() {
        let err = input_error(MediaError::FileNotFound("/nope.mkv".into()));
        assert!(matches!(err, WorkerError::Input(_)));
        assert!(input_error(MediaError::Cancelled).is_cancelled());
        assert!(matches!(
            input_error(MediaError::FfprobeNotFound),
            WorkerError::Media(_)
        ));
    }

    #[test]
    fn test_track_error_verdict() {
        let track = AudioTrack {
            id: 1,
            stream_order: Some(2),
            codec: "dts".into(),
            channels: Some(6),
            title: None,
            language: Some("fre".into()),
        };
        let verdict = track_error(&track, "boom");
        assert!(verdict.should_ignore);
        assert_eq!(verdict.analysis_stats.analysis_method, AnalysisMethod::TrackError);
        assert_eq!(verdict.original_language_iso.as_deref(), Some("fra"));
    }
}
