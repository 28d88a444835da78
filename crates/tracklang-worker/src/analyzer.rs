//! Per-track analysis.
//!
//! Each track moves through a two-stage state machine:
//!
//! ```text
//! Normal ──(valid samples, confident)──────────────────────► Done
//!    │
//!    └──(no valid samples | weak winner, if enabled)──► Extended ──► Done
//! ```
//!
//! A weak winner whose extended window adds nothing keeps the `sampling` method.
//!
//! A track with nothing valid after the extended pass gets the ignored verdict.

use std::sync::Arc;
use tokio::sync::watch;

use tracklang_media::{AudioSource, MediaError, SpeechFilter, SpeechFilterOutcome};
use tracklang_models::{
    AnalysisMethod, AnalysisStats, AudioTrack, SampleOutcome, SampleResult, SampleWindow,
    TrackVerdict,
};
use tracklang_oracle::LanguageOracle;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::TrackLogger;
use crate::metrics;
use crate::sampling::SamplingStrategy;
use crate::verifier::TrackVerifier;

/// Where a track is in its analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Normal,
    Extended,
    Done(AnalysisMethod),
}

/// Runs the sampling pipeline for one track at a time.
pub struct TrackAnalyzer {
    source: Arc<dyn AudioSource>,
    speech: Arc<dyn SpeechFilter>,
    oracle: LanguageOracle,
    strategy: SamplingStrategy,
    verifier: TrackVerifier,
    transcribe: bool,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl TrackAnalyzer {
    pub fn new(
        source: Arc<dyn AudioSource>,
        speech: Arc<dyn SpeechFilter>,
        oracle: LanguageOracle,
        strategy: SamplingStrategy,
        verifier: TrackVerifier,
    ) -> Self {
        Self {
            source,
            speech,
            oracle,
            strategy,
            verifier,
            transcribe: false,
            cancel_rx: None,
        }
    }

    /// Transcribe valid samples.
    pub fn with_transcription(mut self, transcribe: bool) -> Self {
        self.transcribe = transcribe;
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Analyse one track of a video lasting `total_secs`.
    ///
    /// Only cancellation is returned as an error; every other failure is
    /// folded into the sample results and the verdict.
    pub async fn analyze(&self, track: &AudioTrack, total_secs: f64) -> WorkerResult<TrackVerdict> {
        let logger = TrackLogger::new(track);

        if self.verifier.skips_title(track) {
            logger.log_progress(&format!(
                "skipped by title '{}'",
                track.title.as_deref().unwrap_or_default()
            ));
            return Ok(TrackVerdict::ignored(
                track,
                AnalysisStats {
                    analysis_method: AnalysisMethod::TitleFilter,
                    ..AnalysisStats::default()
                },
            ));
        }

        logger.log_start(&format!("{}", track));

        let mut results: Vec<SampleResult> = Vec::new();
        let mut extended = false;
        let mut stage = AnalysisStage::Normal;

        let method = loop {
            stage = match stage {
                AnalysisStage::Normal => {
                    for window in self.strategy.plan(total_secs) {
                        results.push(self.sample(track, window, &logger).await?);
                    }

                    let interim = self
                        .verifier
                        .verify(track, &results, false, AnalysisMethod::Sampling);
                    let valid = interim.analysis_stats.valid_samples;
                    logger.log_progress(&format!(
                        "{}/{} valid samples in regular pass",
                        valid,
                        results.len()
                    ));

                    if valid == 0 {
                        AnalysisStage::Extended
                    } else if self.verifier.config().extend_on_low_confidence
                        && self.verifier.is_weak(&interim)
                    {
                        logger.log_progress(&format!(
                            "winner confidence {:.2} too weak, extending",
                            interim.confidence
                        ));
                        AnalysisStage::Extended
                    } else {
                        AnalysisStage::Done(AnalysisMethod::Sampling)
                    }
                }
                AnalysisStage::Extended => {
                    let had_valid = results.iter().any(SampleResult::is_valid);
                    let window = self
                        .strategy
                        .extended_window(total_secs, results.len() as u32);
                    logger.log_progress(&format!(
                        "extended window {:.0}s-{:.0}s",
                        window.start_secs,
                        window.end_secs()
                    ));

                    extended = true;
                    let result = self.sample(track, window, &logger).await?;
                    let method = match (had_valid, result.is_valid()) {
                        (true, true) => AnalysisMethod::Hybrid,
                        // Nothing joined the regular samples
                        (true, false) => AnalysisMethod::Sampling,
                        (false, _) => AnalysisMethod::ExtendedSampling,
                    };
                    results.push(result);

                    AnalysisStage::Done(method)
                }
                AnalysisStage::Done(method) => break method,
            };
        };

        let verdict = self.verifier.verify(track, &results, extended, method);

        if verdict.should_ignore {
            logger.log_warning(&format!(
                "no usable speech ({})",
                verdict.analysis_stats.analysis_method
            ));
        } else {
            logger.log_completion(&format!(
                "detected {} ({:.2}), review: {}",
                verdict.detected_language_iso.as_deref().unwrap_or("?"),
                verdict.confidence,
                verdict.needs_review
            ));
        }

        Ok(verdict)
    }

    /// Run one window through decode, VAD and the oracle.
    async fn sample(
        &self,
        track: &AudioTrack,
        window: SampleWindow,
        logger: &TrackLogger,
    ) -> WorkerResult<SampleResult> {
        if self.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        let outcome = self.sample_outcome(track, &window, logger).await?;
        metrics::record_sample(outcome.label());

        tracing::debug!(
            track_id = track.id,
            sample = window.index,
            start_secs = window.start_secs,
            outcome = outcome.label(),
            "Sample finished"
        );

        Ok(SampleResult::new(window, outcome))
    }

    async fn sample_outcome(
        &self,
        track: &AudioTrack,
        window: &SampleWindow,
        logger: &TrackLogger,
    ) -> WorkerResult<SampleOutcome> {
        let audio = match self.source.extract(track, window).await {
            Ok(audio) => audio,
            Err(MediaError::Cancelled) => return Err(WorkerError::Cancelled),
            Err(e) => {
                logger.log_warning(&format!(
                    "sample {} decode failed: {}",
                    window.index,
                    e.stderr_tail().unwrap_or(&e.to_string())
                ));
                return Ok(SampleOutcome::DecodeFailed {
                    reason: e.to_string(),
                });
            }
        };

        if audio.is_empty() {
            return Ok(SampleOutcome::NoSpeech { voice_ratio: 0.0 });
        }

        let speech = Arc::clone(&self.speech);
        let sample_rate = audio.sample_rate;
        let filtered =
            tokio::task::spawn_blocking(move || speech.filter(&audio.pcm, sample_rate)).await;

        let speech = match filtered {
            Ok(Ok(SpeechFilterOutcome::Speech(speech))) => speech,
            Ok(Ok(SpeechFilterOutcome::NoSpeech { voice_ratio })) => {
                return Ok(SampleOutcome::NoSpeech { voice_ratio });
            }
            Ok(Err(e)) => {
                logger.log_warning(&format!("sample {} VAD failed: {}", window.index, e));
                return Ok(SampleOutcome::DecodeFailed {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                return Ok(SampleOutcome::DecodeFailed {
                    reason: format!("VAD task failed: {}", e),
                });
            }
        };

        if self.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        let detection = match self.oracle.detect(&speech.pcm).await {
            Ok(detection) => detection,
            Err(e) => {
                logger.log_warning(&format!("sample {} oracle failed: {}", window.index, e));
                return Ok(SampleOutcome::OracleFailed {
                    reason: e.to_string(),
                });
            }
        };
        metrics::record_oracle_duration(self.oracle.model_name(), detection.elapsed.as_secs_f64());

        let outcome = self.verifier.classify(SampleOutcome::Speech {
            language: detection.language.clone(),
            language_iso: detection.language_iso.clone(),
            confidence: detection.confidence,
            transcription: String::new(),
        });

        let SampleOutcome::Speech {
            language,
            language_iso,
            confidence,
            ..
        } = outcome
        else {
            return Ok(outcome);
        };

        let transcription = if self.transcribe {
            match self.oracle.transcribe(&speech.pcm, &language).await {
                Ok(text) => text,
                Err(e) => {
                    logger.log_warning(&format!(
                        "sample {} transcription failed: {}",
                        window.index, e
                    ));
                    String::new()
                }
            }
        } else {
            String::new()
        };

        Ok(SampleOutcome::Speech {
            language,
            language_iso,
            confidence,
            transcription,
        })
    }
}
