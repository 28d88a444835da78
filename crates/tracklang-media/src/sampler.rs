//! Bounded audio window extraction.
//!
//! Each window is decoded by FFmpeg to 16kHz mono f32le into a scratch file,
//! loaded into memory and the file removed before returning.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use tracklang_models::{AudioTrack, SampleWindow};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::scratch::ScratchDir;

/// Sample rate expected by the voice activity filter and the oracle.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded mono PCM for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAudio {
    pub pcm: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleAudio {
    pub fn duration_secs(&self) -> f64 {
        self.pcm.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Source of decoded audio windows.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Decode `window` of `track` to 16kHz mono PCM.
    ///
    /// A window extending past the end of the stream yields whatever audio
    /// exists, possibly none.
    async fn extract(&self, track: &AudioTrack, window: &SampleWindow) -> MediaResult<SampleAudio>;
}

/// [`AudioSource`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegAudioSource {
    input: PathBuf,
    scratch: Arc<ScratchDir>,
    runner: FfmpegRunner,
}

impl FfmpegAudioSource {
    pub fn new(input: impl AsRef<Path>, scratch: Arc<ScratchDir>, runner: FfmpegRunner) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            scratch,
            runner,
        }
    }

    fn command(&self, track: &AudioTrack, window: &SampleWindow, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(&self.input, output)
            .generate_pts()
            .seek(window.start_secs)
            .duration(window.duration_secs)
            .map_audio(track.id)
            .no_video()
            .sample_rate(TARGET_SAMPLE_RATE)
            .channels(1)
            .format("f32le")
    }
}

#[async_trait]
impl AudioSource for FfmpegAudioSource {
    async fn extract(&self, track: &AudioTrack, window: &SampleWindow) -> MediaResult<SampleAudio> {
        let prefix = format!(
            "track{}_{}{}_",
            track.id,
            if window.extended { "ext" } else { "s" },
            window.index
        );
        // Dropped on every early return, which deletes the file
        let scratch = self.scratch.file(&prefix)?;

        debug!(
            track = track.id,
            sample = window.index,
            start = window.start_secs,
            duration = window.duration_secs,
            "Extracting audio window"
        );

        let cmd = self.command(track, window, scratch.path());
        self.runner.run(&cmd).await?;

        let pcm = load_f32le(scratch.path()).await?;
        scratch.remove()?;

        debug!(
            track = track.id,
            sample = window.index,
            samples = pcm.len(),
            "Audio window decoded"
        );

        Ok(SampleAudio {
            pcm,
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }
}

/// Load raw f32le samples from a file.
pub async fn load_f32le(path: &Path) -> MediaResult<Vec<f32>> {
    let bytes = tokio::fs::read(path).await?;

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::check_ffmpeg;
    use tokio::sync::watch;

    fn track() -> AudioTrack {
        AudioTrack {
            id: 1,
            stream_order: Some(2),
            codec: "aac".into(),
            channels: Some(2),
            title: None,
            language: Some("eng".into()),
        }
    }

    fn window() -> SampleWindow {
        SampleWindow {
            index: 3,
            offset_fraction: 0.5,
            start_secs: 300.0,
            duration_secs: 90.0,
            extended: false,
        }
    }

    #[tokio::test]
    async fn test_load_f32le() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = Vec::new();
        for v in [0.5f32, -0.25, 1.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        // Trailing partial sample is ignored
        bytes.push(0xff);
        tokio::fs::write(file.path(), &bytes).await.unwrap();

        let samples = load_f32le(file.path()).await.unwrap();
        assert_eq!(samples, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_command_targets_window_and_track() {
        let scratch = Arc::new(ScratchDir::new_in(std::env::temp_dir()).unwrap());
        let source = FfmpegAudioSource::new("movie.mkv", scratch, FfmpegRunner::new());
        let args = source
            .command(&track(), &window(), Path::new("/tmp/out.pcm"))
            .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "300.000"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "90.000"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:a:1"));
        assert!(args.windows(2).any(|w| w[0] == "-ac" && w[1] == "1"));
    }

    #[tokio::test]
    async fn test_extraction_decodes_window_and_cleans_up() {
        if check_ffmpeg().is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        let status = tokio::process::Command::new("ffmpeg")
            .args(["-y", "-v", "error", "-f", "lavfi", "-i", "sine=frequency=440:duration=4"])
            .arg(&input)
            .status()
            .await
            .unwrap();
        // ffmpeg built without lavfi
        if !status.success() {
            return;
        }

        let scratch = Arc::new(ScratchDir::new_in(dir.path()).unwrap());
        let source = FfmpegAudioSource::new(&input, scratch.clone(), FfmpegRunner::new());
        let mut track = track();
        track.id = 0;
        let window = SampleWindow {
            index: 0,
            offset_fraction: 0.25,
            start_secs: 1.0,
            duration_secs: 2.0,
            extended: false,
        };

        let audio = source.extract(&track, &window).await.unwrap();
        assert_eq!(audio.sample_rate, TARGET_SAMPLE_RATE);
        assert!((audio.duration_secs() - 2.0).abs() < 0.1);
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_no_scratch_files() {
        let scratch = Arc::new(ScratchDir::new_in(std::env::temp_dir()).unwrap());
        let (_tx, rx) = watch::channel(true);
        let source = FfmpegAudioSource::new(
            "missing.mkv",
            scratch.clone(),
            FfmpegRunner::new().with_cancel(rx),
        );

        // Either ffmpeg is missing or the run is already cancelled
        assert!(source.extract(&track(), &window()).await.is_err());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
