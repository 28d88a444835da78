//! FFprobe container probing.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use tracklang_models::{AudioTrack, VideoAsset};

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Options for [`inspect_video`].
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Upper bound on the ffprobe invocation
    pub timeout: Duration,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: Option<u32>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl FfprobeStream {
    /// Tag lookup ignoring key case (Matroska writers disagree on `LANGUAGE` vs `language`).
    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Inspect a video file for its duration and audio tracks.
pub async fn inspect_video(path: impl AsRef<Path>, options: &InspectOptions) -> MediaResult<VideoAsset> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    debug!(path = %path.display(), "Probing container");

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(options.timeout, output)
        .await
        .map_err(|_| MediaError::Timeout(options.timeout.as_secs()))??;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let asset = asset_from_inspect(path, parsed);

    info!(
        path = %path.display(),
        duration = asset.duration,
        audio_tracks = asset.audio_tracks.len(),
        "Container inspected"
    );

    Ok(asset)
}

fn asset_from_inspect(path: &Path, parsed: FfprobeOutput) -> VideoAsset {
    let audio_streams: Vec<&FfprobeStream> = parsed
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("audio"))
        .collect();

    // Container duration, else the longest stream
    let duration = parsed
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| {
            parsed
                .streams
                .iter()
                .filter_map(|s| parse_seconds(s.duration.as_deref()))
                .reduce(f64::max)
        })
        .unwrap_or(0.0);

    let audio_tracks = audio_streams
        .into_iter()
        .enumerate()
        .map(|(audio_index, stream)| AudioTrack {
            id: audio_index as u32,
            stream_order: stream.index,
            codec: stream.codec_name.clone().unwrap_or_default(),
            channels: stream.channels,
            title: stream.tag("title"),
            language: stream.tag("language"),
        })
        .collect();

    VideoAsset {
        path: path.to_path_buf(),
        duration,
        audio_tracks,
    }
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FFPROBE_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "duration": "5400.2"},
            {"index": 1, "codec_type": "audio", "codec_name": "ac3", "channels": 6,
             "tags": {"language": "spa", "title": "Castellano 5.1"}},
            {"index": 2, "codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "eng"}},
            {"index": 3, "codec_type": "audio", "codec_name": "aac", "channels": 2,
             "tags": {"LANGUAGE": "eng", "title": "  "}},
            {"index": 4, "codec_type": "audio", "codec_name": "opus", "channels": 2}
        ],
        "format": {"duration": "5401.344000"}
    }"#;

    #[test]
    fn test_audio_tracks_use_audio_relative_ids() {
        let parsed: FfprobeOutput = serde_json::from_str(FFPROBE_JSON).unwrap();
        let asset = asset_from_inspect(Path::new("movie.mkv"), parsed);

        assert!((asset.duration - 5401.344).abs() < 1e-9);
        assert_eq!(asset.audio_tracks.len(), 3);

        let first = &asset.audio_tracks[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.stream_order, Some(1));
        assert_eq!(first.codec, "ac3");
        assert_eq!(first.channels, Some(6));
        assert_eq!(first.language.as_deref(), Some("spa"));
        assert_eq!(first.title.as_deref(), Some("Castellano 5.1"));

        let second = &asset.audio_tracks[1];
        assert_eq!(second.id, 1);
        assert_eq!(second.stream_order, Some(3));
        assert_eq!(second.language.as_deref(), Some("eng"));
        assert_eq!(second.title, None);

        assert_eq!(asset.audio_tracks[2].language, None);
    }

    #[test]
    fn test_duration_falls_back_to_streams() {
        let parsed: FfprobeOutput = serde_json::from_str(
            r#"{"streams": [
                {"codec_type": "audio", "duration": "61.5"},
                {"codec_type": "video", "duration": "62.0"}
            ], "format": {"duration": "N/A"}}"#,
        )
        .unwrap();
        let asset = asset_from_inspect(Path::new("clip.mp4"), parsed);
        assert!((asset.duration - 62.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds(Some("12.5")), Some(12.5));
        assert_eq!(parse_seconds(Some("N/A")), None);
        assert_eq!(parse_seconds(Some("0")), None);
        assert_eq!(parse_seconds(None), None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = inspect_video("/definitely/not/here.mkv", &InspectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
