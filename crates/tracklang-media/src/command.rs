//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Regenerate missing presentation timestamps (broken remuxes seek badly without it).
    pub fn generate_pts(self) -> Self {
        self.input_arg("-fflags").input_arg("+genpts")
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Select the N-th audio stream of the first input.
    pub fn map_audio(self, audio_index: u32) -> Self {
        self.output_arg("-map").output_arg(format!("0:a:{}", audio_index))
    }

    /// Drop video.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Resample audio.
    pub fn sample_rate(self, hz: u32) -> Self {
        self.output_arg("-ar").output_arg(hz.to_string())
    }

    /// Set output channel count.
    pub fn channels(self, channels: u32) -> Self {
        self.output_arg("-ac").output_arg(channels.to_string())
    }

    /// Force the output container/format (e.g. `f32le`).
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output file path.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-nostdin".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// How a child process wait ended.
enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Runner for FFmpeg commands with timeout and cancellation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Upper bound on a single invocation
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        if self.is_cancelled() {
            return Err(MediaError::Cancelled);
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take();
        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr = stderr_handle.await.unwrap_or_default();

        let status = result?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                status.code(),
            ))
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let timeout = self.timeout;
        let mut cancel_rx = self.cancel_rx.clone();

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            _ = sleep_or_forever(timeout) => WaitOutcome::TimedOut,
            _ = cancelled(cancel_rx.as_mut()) => WaitOutcome::Cancelled,
        };

        match outcome {
            WaitOutcome::Exited(status) => Ok(status?),
            WaitOutcome::TimedOut => {
                let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
            WaitOutcome::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
        }
    }
}

async fn sleep_or_forever(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the cancel flag turns true; never resolves without a receiver.
pub(crate) async fn cancelled(cancel_rx: Option<&mut watch::Receiver<bool>>) {
    let Some(rx) = cancel_rx else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: cancellation can no longer happen.
            return std::future::pending().await;
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("movie.mkv", "/tmp/sample.f32")
            .generate_pts()
            .seek(810.0)
            .duration(90.0)
            .map_audio(1)
            .no_video()
            .sample_rate(16000)
            .channels(1)
            .format("f32le");

        let args = cmd.build_args();
        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();

        assert_eq!(args[pos("-ss") + 1], "810.000");
        assert_eq!(args[pos("-t") + 1], "90.000");
        assert_eq!(args[pos("-map") + 1], "0:a:1");
        assert_eq!(args[pos("-ar") + 1], "16000");
        assert_eq!(args[pos("-f") + 1], "f32le");
        // Seek and duration are input options
        assert!(pos("-ss") < pos("-i"));
        assert!(pos("-map") > pos("-i"));
        assert_eq!(args.last().unwrap(), "/tmp/sample.f32");
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_flag_set() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { cancelled(Some(&mut rx)).await });
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancellation not observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_runner_refuses_when_already_cancelled() {
        let (tx, rx) = watch::channel(true);
        let runner = FfmpegRunner::new().with_cancel(rx);
        assert!(runner.is_cancelled());
        drop(tx);
    }
}
