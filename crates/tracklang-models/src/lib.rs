//! Shared data models for tracklang.
//!
//! This crate provides Serde-serializable types for:
//! - Video assets and their audio tracks
//! - Sample windows and per-sample outcomes
//! - Per-track verdicts with analysis statistics
//! - The final report
//! - ISO 639-1 / ISO 639-2 language code mapping

pub mod language;
pub mod report;
pub mod sample;
pub mod verdict;
pub mod video;

// Re-export common types
pub use language::{
    detected_iso639_2, is_no_linguistic_content, normalize_declared, to_iso639_1, to_iso639_2,
};
pub use report::{report_schema, Report};
pub use sample::{SampleOutcome, SampleResult, SampleWindow};
pub use verdict::{AnalysisMethod, AnalysisStats, TrackVerdict};
pub use video::{AudioTrack, VideoAsset};
