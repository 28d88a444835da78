//! Audio track language verification.
//!
//! This crate provides:
//! - Sampling strategy and the per-track analysis state machine
//! - Track verifier (aggregation, tie-breaks, review flag)
//! - Video processor with bounded track parallelism and cancellation
//! - Configuration, structured logging and metrics

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod sampling;
pub mod summary;
pub mod verifier;

pub use analyzer::{AnalysisStage, TrackAnalyzer};
pub use backend::{build_model, build_oracle, check_model, oracle_options};
pub use config::{AnalyzerConfig, OracleConfig, SamplingConfig, VerifierConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::TrackLogger;
pub use processor::VideoProcessor;
pub use sampling::SamplingStrategy;
pub use summary::render_summary;
pub use verifier::{LanguageScore, TrackVerifier};
