//! Analyzer configuration.
//!
//! Every threshold of the pipeline lives here. Values come from defaults,
//! then `TRACKLANG_*` environment variables, then CLI flags.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracklang_media::{VadBackend, VadConfig};

use crate::error::{WorkerError, WorkerResult};

/// Where and how long to sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Sample offsets as fractions of the total duration
    pub positions: Vec<f64>,
    /// Length of one sample (seconds)
    pub sample_duration_secs: f64,
    /// Start of the extended window as a fraction of the duration
    pub extended_start_fraction: f64,
    /// Length of the extended window as a fraction of the duration
    pub extended_span_fraction: f64,
    /// Upper bound on the extended window (seconds)
    pub extended_max_secs: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            positions: vec![0.15, 0.25, 0.35, 0.50, 0.65],
            sample_duration_secs: 90.0,
            extended_start_fraction: 0.10,
            extended_span_fraction: 0.80,
            extended_max_secs: 3600.0,
        }
    }
}

/// How per-sample results become a verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    /// A mismatch is only flagged above this confidence (strict)
    pub review_confidence_floor: f64,
    /// Detections below this are not counted (0.0 disables)
    pub min_sample_confidence: f64,
    /// Also run the extended pass when the winner is not above the review floor
    pub extend_on_low_confidence: bool,
    /// Skip tracks titled as commentary, extras, music only, ...
    pub skip_commentary_tracks: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            review_confidence_floor: 0.5,
            min_sample_confidence: 0.0,
            extend_on_low_confidence: false,
            skip_commentary_tracks: false,
        }
    }
}

/// Language model selection and limits.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// Local ggml Whisper model
    pub model_path: Option<PathBuf>,
    /// Remote language-id service (takes precedence over `model_path`)
    pub service_url: Option<String>,
    /// Inference threads for the local model
    pub threads: usize,
    /// Upper bound on one inference
    pub timeout: Duration,
    /// Identification chunk length (seconds)
    pub chunk_secs: u32,
    /// Maximum chunks identified per sample
    pub max_chunks: usize,
    /// Transcribe valid samples
    pub transcribe: bool,
    /// Longest stretch of speech transcribed per sample (seconds)
    pub transcribe_secs: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            service_url: None,
            threads: 4,
            timeout: Duration::from_secs(120),
            chunk_secs: 30,
            max_chunks: 3,
            transcribe: false,
            transcribe_secs: 90,
        }
    }
}

/// Full analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub sampling: SamplingConfig,
    pub vad: VadConfig,
    pub oracle: OracleConfig,
    pub verifier: VerifierConfig,
    /// Tracks analysed concurrently
    pub max_parallel_tracks: usize,
    /// Parent of the per-run scratch directory
    pub work_dir: PathBuf,
    /// Upper bound on one ffmpeg window extraction
    pub decode_timeout: Duration,
    /// Upper bound on the ffprobe call
    pub inspect_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            vad: VadConfig::default(),
            oracle: OracleConfig::default(),
            verifier: VerifierConfig::default(),
            max_parallel_tracks: 1,
            work_dir: std::env::temp_dir(),
            decode_timeout: Duration::from_secs(300),
            inspect_timeout: Duration::from_secs(60),
        }
    }
}

impl AnalyzerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sampling = SamplingConfig {
            positions: parse("TRACKLANG_SAMPLE_POSITIONS")
                .and_then(|v| parse_list(&v))
                .unwrap_or(defaults.sampling.positions),
            sample_duration_secs: parse_or(
                parse("TRACKLANG_SAMPLE_DURATION_SECS"),
                defaults.sampling.sample_duration_secs,
            ),
            extended_start_fraction: parse_or(
                parse("TRACKLANG_EXTENDED_START"),
                defaults.sampling.extended_start_fraction,
            ),
            extended_span_fraction: parse_or(
                parse("TRACKLANG_EXTENDED_SPAN"),
                defaults.sampling.extended_span_fraction,
            ),
            extended_max_secs: parse_or(
                parse("TRACKLANG_EXTENDED_MAX_SECS"),
                defaults.sampling.extended_max_secs,
            ),
        };

        let vad = VadConfig {
            backend: parse_or::<VadBackend>(parse("TRACKLANG_VAD_BACKEND"), defaults.vad.backend),
            ..defaults.vad.clone()
        }
        .with_threshold(parse_or(parse("TRACKLANG_VAD_THRESHOLD"), defaults.vad.speech_threshold))
        .with_energy_threshold(parse_or(
            parse("TRACKLANG_VAD_ENERGY_THRESHOLD"),
            defaults.vad.energy_threshold,
        ))
        .with_min_voice_ratio(parse_or(
            parse("TRACKLANG_MIN_VOICE_RATIO"),
            defaults.vad.min_voice_ratio,
        ));

        let oracle = OracleConfig {
            model_path: parse("TRACKLANG_MODEL").map(PathBuf::from),
            service_url: parse("TRACKLANG_ORACLE_URL"),
            threads: parse_or(parse("TRACKLANG_ORACLE_THREADS"), defaults.oracle.threads),
            timeout: Duration::from_secs(parse_or(
                parse("TRACKLANG_ORACLE_TIMEOUT_SECS"),
                defaults.oracle.timeout.as_secs(),
            )),
            chunk_secs: parse_or(parse("TRACKLANG_ORACLE_CHUNK_SECS"), defaults.oracle.chunk_secs),
            max_chunks: parse_or(parse("TRACKLANG_ORACLE_MAX_CHUNKS"), defaults.oracle.max_chunks),
            transcribe: parse_flag(parse("TRACKLANG_TRANSCRIBE"), defaults.oracle.transcribe),
            transcribe_secs: parse_or(
                parse("TRACKLANG_TRANSCRIBE_SECS"),
                defaults.oracle.transcribe_secs,
            ),
        };

        let verifier = VerifierConfig {
            review_confidence_floor: parse_or(
                parse("TRACKLANG_REVIEW_FLOOR"),
                defaults.verifier.review_confidence_floor,
            ),
            min_sample_confidence: parse_or(
                parse("TRACKLANG_MIN_SAMPLE_CONFIDENCE"),
                defaults.verifier.min_sample_confidence,
            ),
            extend_on_low_confidence: parse_flag(
                parse("TRACKLANG_EXTEND_ON_LOW_CONFIDENCE"),
                defaults.verifier.extend_on_low_confidence,
            ),
            skip_commentary_tracks: parse_flag(
                parse("TRACKLANG_SKIP_COMMENTARY"),
                defaults.verifier.skip_commentary_tracks,
            ),
        };

        Self {
            sampling,
            vad,
            oracle,
            verifier,
            max_parallel_tracks: parse_or(
                parse("TRACKLANG_PARALLEL_TRACKS"),
                defaults.max_parallel_tracks,
            ),
            work_dir: parse("TRACKLANG_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            decode_timeout: Duration::from_secs(parse_or(
                parse("TRACKLANG_DECODE_TIMEOUT_SECS"),
                defaults.decode_timeout.as_secs(),
            )),
            inspect_timeout: Duration::from_secs(parse_or(
                parse("TRACKLANG_INSPECT_TIMEOUT_SECS"),
                defaults.inspect_timeout.as_secs(),
            )),
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        let sampling = &self.sampling;
        if sampling.positions.is_empty() {
            return Err(WorkerError::config_error("at least one sample position is required"));
        }
        if let Some(p) = sampling.positions.iter().find(|p| !(0.0..1.0).contains(*p)) {
            return Err(WorkerError::config_error(format!(
                "sample position {} is outside [0, 1)",
                p
            )));
        }
        if !(sampling.sample_duration_secs.is_finite() && sampling.sample_duration_secs > 0.0) {
            return Err(WorkerError::config_error("sample duration must be positive"));
        }
        if !(0.0..1.0).contains(&sampling.extended_start_fraction)
            || !(sampling.extended_span_fraction > 0.0
                && sampling.extended_start_fraction + sampling.extended_span_fraction <= 1.0)
        {
            return Err(WorkerError::config_error(
                "extended window must lie within the track",
            ));
        }
        if !(sampling.extended_max_secs > 0.0) {
            return Err(WorkerError::config_error("extended window cap must be positive"));
        }
        if !(0.0..=1.0).contains(&self.verifier.review_confidence_floor) {
            return Err(WorkerError::config_error("review floor must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.verifier.min_sample_confidence) {
            return Err(WorkerError::config_error(
                "minimum sample confidence must be within [0, 1]",
            ));
        }
        if self.max_parallel_tracks == 0 {
            return Err(WorkerError::config_error("parallel tracks must be at least 1"));
        }
        if self.oracle.chunk_secs == 0
            || self.oracle.max_chunks == 0
            || self.oracle.transcribe_secs == 0
        {
            return Err(WorkerError::config_error("oracle chunking must be non-zero"));
        }
        if self.oracle.timeout.is_zero() || self.decode_timeout.is_zero() {
            return Err(WorkerError::config_error("timeouts must be non-zero"));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_list(value: &str) -> Option<Vec<f64>> {
    value
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> AnalyzerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnalyzerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.sampling.positions, vec![0.15, 0.25, 0.35, 0.50, 0.65]);
        assert_eq!(config.sampling.sample_duration_secs, 90.0);
        assert_eq!(config.verifier.review_confidence_floor, 0.5);
        assert_eq!(config.vad.min_voice_ratio, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = from_map(&[
            ("TRACKLANG_SAMPLE_POSITIONS", "0.2, 0.4,0.6"),
            ("TRACKLANG_SAMPLE_DURATION_SECS", "45"),
            ("TRACKLANG_VAD_BACKEND", "energy"),
            ("TRACKLANG_ORACLE_URL", "http://langid:8080"),
            ("TRACKLANG_TRANSCRIBE", "yes"),
            ("TRACKLANG_PARALLEL_TRACKS", "3"),
            ("TRACKLANG_REVIEW_FLOOR", "0.7"),
        ]);
        assert_eq!(config.sampling.positions, vec![0.2, 0.4, 0.6]);
        assert_eq!(config.sampling.sample_duration_secs, 45.0);
        assert_eq!(config.vad.backend, VadBackend::Energy);
        assert_eq!(config.oracle.service_url.as_deref(), Some("http://langid:8080"));
        assert!(config.oracle.transcribe);
        assert_eq!(config.max_parallel_tracks, 3);
        assert_eq!(config.verifier.review_confidence_floor, 0.7);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let config = from_map(&[
            ("TRACKLANG_SAMPLE_POSITIONS", "0.2,abc"),
            ("TRACKLANG_PARALLEL_TRACKS", "many"),
            ("TRACKLANG_VAD_BACKEND", "webrtc"),
            ("TRACKLANG_MODEL", "  "),
        ]);
        assert_eq!(config.sampling.positions.len(), 5);
        assert_eq!(config.max_parallel_tracks, 1);
        assert_eq!(config.vad.backend, VadBackend::Silero);
        assert!(config.oracle.model_path.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalyzerConfig::default();
        config.sampling.positions = vec![0.5, 1.2];
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.max_parallel_tracks = 0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.verifier.review_confidence_floor = 1.5;
        assert!(config.validate().is_err());
    }
}
