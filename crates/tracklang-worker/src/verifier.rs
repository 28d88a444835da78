//! Track verifier.
//!
//! Turns the sample results of one track into its verdict.

use std::collections::BTreeMap;

use tracklang_models::{
    AnalysisMethod, AnalysisStats, AudioTrack, SampleOutcome, SampleResult, TrackVerdict,
};

use crate::config::VerifierConfig;

/// Title keywords of tracks that are not the main dialogue.
const COMMENTARY_KEYWORDS: &[&str] = &[
    "comment",
    "coment",
    "director",
    "interview",
    "entrevista",
    "behind",
    "making",
    "extras",
    "bonus",
    "special",
    "isolated",
    "music score",
    "soundtrack",
    "instrumental",
];

/// Aggregate of the valid samples of one language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageScore {
    pub language: String,
    pub language_iso: String,
    /// Mean sample confidence
    pub confidence: f64,
    pub samples: u32,
    /// Transcript of the most confident sample
    pub transcription: String,
    best_sample_confidence: f64,
}

#[derive(Debug, Clone)]
pub struct TrackVerifier {
    config: VerifierConfig,
}

impl TrackVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Whether a track should be skipped because of its title.
    pub fn skips_title(&self, track: &AudioTrack) -> bool {
        if !self.config.skip_commentary_tracks {
            return false;
        }
        track.title.as_deref().is_some_and(|title| {
            let title = title.to_lowercase();
            COMMENTARY_KEYWORDS.iter().any(|k| title.contains(k))
        })
    }

    /// Apply the per-sample confidence floor to a fresh detection.
    pub fn classify(&self, outcome: SampleOutcome) -> SampleOutcome {
        match outcome {
            SampleOutcome::Speech {
                language,
                confidence,
                ..
            } if confidence < self.config.min_sample_confidence => {
                SampleOutcome::LowConfidence {
                    language,
                    confidence,
                }
            }
            other => other,
        }
    }

    /// Whether a verdict is too weak to trust without the extended pass.
    pub fn is_weak(&self, verdict: &TrackVerdict) -> bool {
        verdict.analysis_stats.valid_samples > 0
            && verdict.confidence <= self.config.review_confidence_floor
    }

    /// Per-language aggregates of the valid samples, best first.
    pub fn rank(&self, track: &AudioTrack, results: &[SampleResult]) -> Vec<LanguageScore> {
        let mut groups: BTreeMap<&str, LanguageScore> = BTreeMap::new();
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();

        for result in results {
            let SampleOutcome::Speech {
                language,
                language_iso,
                confidence,
                transcription,
            } = &result.outcome
            else {
                continue;
            };
            let confidence = confidence.clamp(0.0, 1.0);

            *sums.entry(language.as_str()).or_default() += confidence;
            let group = groups.entry(language.as_str()).or_insert_with(|| LanguageScore {
                language: language.clone(),
                language_iso: language_iso.clone(),
                confidence: 0.0,
                samples: 0,
                transcription: String::new(),
                best_sample_confidence: -1.0,
            });
            group.samples += 1;
            if confidence > group.best_sample_confidence {
                group.best_sample_confidence = confidence;
                group.transcription = transcription.clone();
            }
        }

        let declared = track.declared_iso639_2();
        let mut ranked: Vec<LanguageScore> = groups
            .into_iter()
            .map(|(language, mut group)| {
                group.confidence = (sums[language] / f64::from(group.samples)).clamp(0.0, 1.0);
                group
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.samples.cmp(&a.samples))
                .then_with(|| {
                    let a_declared = declared.as_deref() == Some(a.language_iso.as_str());
                    let b_declared = declared.as_deref() == Some(b.language_iso.as_str());
                    b_declared.cmp(&a_declared)
                })
                .then_with(|| a.language.cmp(&b.language))
        });
        ranked
    }

    /// Build the verdict of a track from its sample results.
    ///
    /// `method` is how the results were gathered; it is replaced by a
    /// failure method when no sample is valid.
    pub fn verify(
        &self,
        track: &AudioTrack,
        results: &[SampleResult],
        extended_analysis: bool,
        method: AnalysisMethod,
    ) -> TrackVerdict {
        let valid = results.iter().filter(|r| r.is_valid()).count() as u32;
        let attempted = results.len() as u32;

        if valid == 0 {
            let method = if attempted > 0 && results.iter().all(SampleResult::is_decode_failure) {
                AnalysisMethod::DecodeFailure
            } else if attempted > 0 && results.iter().all(SampleResult::is_oracle_failure) {
                AnalysisMethod::OracleFailure
            } else {
                AnalysisMethod::InsufficientAudio
            };
            return TrackVerdict::ignored(
                track,
                AnalysisStats {
                    valid_samples: 0,
                    total_samples_attempted: attempted,
                    extended_analysis,
                    analysis_method: method,
                },
            );
        }

        let ranked = self.rank(track, results);
        let mut verdict = TrackVerdict::for_track(track);
        verdict.analysis_stats = AnalysisStats {
            valid_samples: valid,
            total_samples_attempted: attempted,
            extended_analysis,
            analysis_method: method,
        };

        if let Some(winner) = ranked.into_iter().next() {
            verdict.needs_review = match &verdict.original_language_iso {
                Some(declared) => {
                    winner.confidence > self.config.review_confidence_floor
                        && !winner.language_iso.eq_ignore_ascii_case(declared)
                }
                None => false,
            };
            verdict.detected_language = Some(winner.language);
            verdict.detected_language_iso = Some(winner.language_iso);
            verdict.confidence = winner.confidence;
            verdict.transcription = winner.transcription;
        }

        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklang_models::SampleWindow;

    fn track(language: Option<&str>) -> AudioTrack {
        AudioTrack {
            id: 0,
            stream_order: Some(1),
            codec: "aac".into(),
            channels: Some(2),
            title: None,
            language: language.map(str::to_string),
        }
    }

    fn window(index: u32) -> SampleWindow {
        SampleWindow {
            index,
            offset_fraction: 0.0,
            start_secs: 0.0,
            duration_secs: 90.0,
            extended: false,
        }
    }

    fn speech(index: u32, language: &str, iso: &str, confidence: f64) -> SampleResult {
        SampleResult::new(
            window(index),
            SampleOutcome::Speech {
                language: language.into(),
                language_iso: iso.into(),
                confidence,
                transcription: format!("{language} sample {index}"),
            },
        )
    }

    fn silent(index: u32) -> SampleResult {
        SampleResult::new(window(index), SampleOutcome::NoSpeech { voice_ratio: 0.01 })
    }

    fn verifier() -> TrackVerifier {
        TrackVerifier::new(VerifierConfig::default())
    }

    #[test]
    fn test_tie_goes_to_declared_language() {
        let results = [speech(0, "en", "eng", 0.9), speech(1, "es", "spa", 0.9)];
        let verdict = verifier().verify(&track(Some("spa")), &results, false, AnalysisMethod::Sampling);
        assert_eq!(verdict.detected_language.as_deref(), Some("es"));
        assert!(!verdict.needs_review);

        // Without a declared language the lowest code wins
        let verdict = verifier().verify(&track(None), &results, false, AnalysisMethod::Sampling);
        assert_eq!(verdict.detected_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_count_breaks_confidence_tie() {
        let results = [
            speech(0, "fr", "fra", 0.8),
            speech(1, "fr", "fra", 0.8),
            speech(2, "de", "deu", 0.8),
        ];
        let verdict = verifier().verify(&track(Some("deu")), &results, false, AnalysisMethod::Sampling);
        assert_eq!(verdict.detected_language.as_deref(), Some("fr"));
        assert!(verdict.needs_review);
    }

    #[test]
    fn test_mixed_scenario() {
        let results = [
            speech(0, "en", "eng", 0.95),
            speech(1, "en", "eng", 0.40),
            speech(2, "es", "spa", 0.99),
            silent(3),
            silent(4),
        ];
        let verdict = verifier().verify(&track(Some("eng")), &results, false, AnalysisMethod::Sampling);
        assert_eq!(verdict.detected_language.as_deref(), Some("es"));
        assert_eq!(verdict.detected_language_iso.as_deref(), Some("spa"));
        assert!((verdict.confidence - 0.99).abs() < 1e-12);
        assert!(verdict.needs_review);
        assert!(!verdict.should_ignore);
        assert_eq!(verdict.analysis_stats.valid_samples, 3);
        assert_eq!(verdict.analysis_stats.total_samples_attempted, 5);
        assert_eq!(verdict.transcription, "es sample 2");
    }

    #[test]
    fn test_review_floor_is_strict() {
        let at_floor = [speech(0, "es", "spa", 0.5)];
        let verdict = verifier().verify(&track(Some("eng")), &at_floor, false, AnalysisMethod::Sampling);
        assert!(!verdict.needs_review);

        let above = [speech(0, "es", "spa", 0.5000001)];
        let verdict = verifier().verify(&track(Some("eng")), &above, false, AnalysisMethod::Sampling);
        assert!(verdict.needs_review);
    }

    #[test]
    fn test_no_declared_language_never_needs_review() {
        for tag in [None, Some("und"), Some("zxx")] {
            let results = [speech(0, "ja", "jpn", 0.97)];
            let verdict = verifier().verify(&track(tag), &results, false, AnalysisMethod::Sampling);
            assert!(!verdict.needs_review);
            assert_eq!(verdict.detected_language_iso.as_deref(), Some("jpn"));
        }
    }

    #[test]
    fn test_bibliographic_declared_tag_matches() {
        let results = [speech(0, "de", "deu", 0.9)];
        let verdict = verifier().verify(&track(Some("ger")), &results, false, AnalysisMethod::Sampling);
        assert!(!verdict.needs_review);
        assert!(verdict.language_matches());
    }

    #[test]
    fn test_all_silent_is_insufficient_audio() {
        let results: Vec<_> = (0..5).map(silent).collect();
        let verdict = verifier().verify(&track(Some("eng")), &results, true, AnalysisMethod::ExtendedSampling);
        assert!(verdict.should_ignore);
        assert!(!verdict.needs_review);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.detected_language.is_none());
        assert_eq!(verdict.analysis_stats.analysis_method, AnalysisMethod::InsufficientAudio);
        assert_eq!(verdict.analysis_stats.valid_samples, 0);
        assert_eq!(verdict.analysis_stats.total_samples_attempted, 5);
    }

    #[test]
    fn test_failure_methods() {
        let decode: Vec<_> = (0..3)
            .map(|i| SampleResult::new(window(i), SampleOutcome::DecodeFailed { reason: "x".into() }))
            .collect();
        let verdict = verifier().verify(&track(None), &decode, true, AnalysisMethod::Sampling);
        assert_eq!(verdict.analysis_stats.analysis_method, AnalysisMethod::DecodeFailure);

        let oracle: Vec<_> = (0..3)
            .map(|i| SampleResult::new(window(i), SampleOutcome::OracleFailed { reason: "x".into() }))
            .collect();
        let verdict = verifier().verify(&track(None), &oracle, true, AnalysisMethod::Sampling);
        assert_eq!(verdict.analysis_stats.analysis_method, AnalysisMethod::OracleFailure);

        let verdict = verifier().verify(&track(None), &[], false, AnalysisMethod::Sampling);
        assert_eq!(verdict.analysis_stats.analysis_method, AnalysisMethod::InsufficientAudio);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let results = [
            speech(0, "it", "ita", 0.7),
            speech(1, "pt", "por", 0.7),
            silent(2),
        ];
        let first = verifier().verify(&track(Some("por")), &results, false, AnalysisMethod::Sampling);
        let second = verifier().verify(&track(Some("por")), &results, false, AnalysisMethod::Sampling);
        assert_eq!(first, second);
    }

    #[test]
    fn test_low_confidence_floor() {
        let verifier = TrackVerifier::new(VerifierConfig {
            min_sample_confidence: 0.3,
            ..VerifierConfig::default()
        });
        let outcome = verifier.classify(SampleOutcome::Speech {
            language: "en".into(),
            language_iso: "eng".into(),
            confidence: 0.2,
            transcription: String::new(),
        });
        assert!(matches!(outcome, SampleOutcome::LowConfidence { .. }));
    }

    #[test]
    fn test_title_filter() {
        let verifier = TrackVerifier::new(VerifierConfig {
            skip_commentary_tracks: true,
            ..VerifierConfig::default()
        });
        let mut commentary = track(Some("eng"));
        commentary.title = Some("Director's Commentary".into());
        assert!(verifier.skips_title(&commentary));

        let mut main = track(Some("eng"));
        main.title = Some("English 5.1".into());
        assert!(!verifier.skips_title(&main));
        assert!(!TrackVerifier::new(VerifierConfig::default()).skips_title(&commentary));
    }
}
