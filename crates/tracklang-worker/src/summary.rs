//! Human-readable report summary.

use std::fmt::Write;

use tracklang_models::{AnalysisMethod, Report, TrackVerdict};

/// Render `report` as a plain-text summary.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "File: {}", report.file);
    if report.duration > 0.0 {
        let _ = writeln!(out, "Duration: {:.1}s", report.duration);
    } else {
        let _ = writeln!(out, "Duration: unknown");
    }
    let _ = writeln!(out, "Audio tracks: {}", report.audio_tracks.len());

    let ignored: Vec<&TrackVerdict> = report.ignored_tracks().collect();
    if !ignored.is_empty() {
        let _ = writeln!(out, "\nIgnored tracks ({}):", ignored.len());
        for track in &ignored {
            let _ = writeln!(
                out,
                "  Track {}: {} ({})",
                track.id,
                track.title.as_deref().unwrap_or("untitled"),
                ignore_reason(track.analysis_stats.analysis_method)
            );
        }
    }

    let processed: Vec<&TrackVerdict> = report.processed_tracks().collect();
    if !processed.is_empty() {
        let _ = writeln!(out, "\nProcessed tracks ({}):", processed.len());
        for track in &processed {
            write_track(&mut out, track);
        }
    }

    let review: Vec<&TrackVerdict> = report.tracks_needing_review().collect();
    if review.is_empty() {
        let _ = writeln!(out, "\nNo processed track needs a language review");
    } else {
        let _ = writeln!(out, "\n{} track(s) need a language review:", review.len());
        for track in review {
            let _ = writeln!(
                out,
                "  - Track {}: tagged '{}', set '{}'",
                track.id,
                track.original_language.as_deref().unwrap_or("none"),
                track.detected_language_iso.as_deref().unwrap_or("?")
            );
        }
    }

    out
}

fn write_track(out: &mut String, track: &TrackVerdict) {
    let marker = if track.needs_review { "!" } else { "✓" };
    let _ = writeln!(
        out,
        "\n  [{}] Track {} ({}, {} ch)",
        marker,
        track.id,
        track.codec,
        channels(track)
    );
    if let Some(title) = &track.title {
        let _ = writeln!(out, "      Title: {}", title);
    }
    let _ = writeln!(
        out,
        "      Declared: {}",
        track.original_language.as_deref().unwrap_or("unset")
    );
    if let (Some(language), Some(iso)) = (&track.detected_language, &track.detected_language_iso) {
        let _ = writeln!(out, "      Detected: {} ({})", language, iso);
    }
    let _ = writeln!(out, "      Confidence: {:.2}%", track.confidence * 100.0);
    let stats = &track.analysis_stats;
    let _ = writeln!(
        out,
        "      Samples: {}/{} valid, method {}{}",
        stats.valid_samples,
        stats.total_samples_attempted,
        stats.analysis_method,
        if stats.extended_analysis { ", extended" } else { "" }
    );
    if !track.transcription.is_empty() {
        let _ = writeln!(out, "      Transcript: {}", track.transcription);
    }
}

fn channels(track: &TrackVerdict) -> String {
    track
        .channels
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn ignore_reason(method: AnalysisMethod) -> &'static str {
    match method {
        AnalysisMethod::TitleFilter => "skipped by title",
        AnalysisMethod::DecodeFailure => "audio could not be decoded",
        AnalysisMethod::OracleFailure => "language model failed",
        AnalysisMethod::TrackError => "analysis failed",
        _ => "no speech found",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklang_models::{AnalysisStats, AudioTrack};

    #[test]
    fn test_summary_lists_review_tracks() {
        let track = AudioTrack {
            id: 0,
            stream_order: Some(1),
            codec: "aac".into(),
            channels: Some(2),
            title: None,
            language: Some("eng".into()),
        };
        let mut verdict = TrackVerdict::for_track(&track);
        verdict.detected_language = Some("es".into());
        verdict.detected_language_iso = Some("spa".into());
        verdict.confidence = 0.99;
        verdict.needs_review = true;
        verdict.analysis_stats = AnalysisStats {
            valid_samples: 3,
            total_samples_attempted: 5,
            ..AnalysisStats::default()
        };

        let mut music = TrackVerdict::ignored(
            &AudioTrack {
                id: 1,
                title: Some("Music only".into()),
                language: Some("zxx".into()),
                ..track.clone()
            },
            AnalysisStats {
                analysis_method: AnalysisMethod::InsufficientAudio,
                ..AnalysisStats::default()
            },
        );
        music.analysis_stats.total_samples_attempted = 6;

        let report = Report {
            file: "movie.mkv".into(),
            duration: 5400.0,
            audio_tracks: vec![verdict, music],
        };
        let summary = render_summary(&report);
        assert!(summary.contains("Detected: es (spa)"));
        assert!(summary.contains("Confidence: 99.00%"));
        assert!(summary.contains("Track 1: Music only (no speech found)"));
        assert!(summary.contains("Track 0: tagged 'eng', set 'spa'"));
    }
}
