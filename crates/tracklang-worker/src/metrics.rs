//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SAMPLES_TOTAL: &str = "tracklang_samples_total";
    pub const TRACKS_TOTAL: &str = "tracklang_tracks_total";
    pub const ORACLE_DURATION_SECONDS: &str = "tracklang_oracle_duration_seconds";
}

/// Record one sample outcome.
pub fn record_sample(outcome: &'static str) {
    counter!(names::SAMPLES_TOTAL, "outcome" => outcome).increment(1);
}

/// Record one track verdict.
pub fn record_track(method: &'static str) {
    counter!(names::TRACKS_TOTAL, "method" => method).increment(1);
}

/// Record one oracle call.
pub fn record_oracle_duration(backend: &'static str, duration_secs: f64) {
    histogram!(names::ORACLE_DURATION_SECONDS, "backend" => backend).record(duration_secs);
}
