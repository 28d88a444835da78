//! Speech extraction over frame classifiers.

use tracing::debug;

use super::config::{VadBackend, VadConfig};
use super::energy::EnergyVad;
use super::silero::SileroVad;
use super::{VadError, VadResult};

/// Anything that scores fixed-size frames with a speech probability.
pub trait FrameClassifier {
    /// Samples per frame.
    fn frame_size(&self) -> usize;

    /// Speech probability of one frame, in [0, 1].
    fn speech_probability(&mut self, frame: &[f32]) -> VadResult<f32>;
}

/// Speech-only audio extracted from a window.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    /// Concatenated speech frames
    pub pcm: Vec<f32>,
    pub sample_rate: u32,
    /// Share of frames classified as speech, in [0, 1]
    pub voice_ratio: f64,
}

impl SpeechAudio {
    pub fn duration_secs(&self) -> f64 {
        self.pcm.len() as f64 / self.sample_rate as f64
    }
}

/// Result of filtering one window.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechFilterOutcome {
    Speech(SpeechAudio),
    NoSpeech { voice_ratio: f64 },
}

impl SpeechFilterOutcome {
    pub fn voice_ratio(&self) -> f64 {
        match self {
            SpeechFilterOutcome::Speech(audio) => audio.voice_ratio,
            SpeechFilterOutcome::NoSpeech { voice_ratio } => *voice_ratio,
        }
    }
}

/// Keep the frames scored at or above `threshold`.
///
/// The trailing partial frame is skipped. Windows whose speech share is
/// below `min_voice_ratio` are reported as [`SpeechFilterOutcome::NoSpeech`].
pub fn filter_speech<C: FrameClassifier + ?Sized>(
    classifier: &mut C,
    pcm: &[f32],
    sample_rate: u32,
    threshold: f32,
    min_voice_ratio: f32,
) -> VadResult<SpeechFilterOutcome> {
    let frame_size = classifier.frame_size();
    if frame_size == 0 {
        return Err(VadError::InvalidAudioFormat("zero frame size".to_string()));
    }

    let mut speech = Vec::new();
    let mut total_frames = 0usize;
    let mut voiced_frames = 0usize;

    for frame in pcm.chunks_exact(frame_size) {
        total_frames += 1;
        if classifier.speech_probability(frame)? >= threshold {
            voiced_frames += 1;
            speech.extend_from_slice(frame);
        }
    }

    let voice_ratio = if total_frames > 0 {
        voiced_frames as f64 / total_frames as f64
    } else {
        0.0
    };

    debug!(
        voiced_frames,
        total_frames,
        voice_ratio = format!("{:.1}%", voice_ratio * 100.0),
        voiced_secs = speech.len() as f64 / sample_rate as f64,
        "Voice activity filtered"
    );

    if voiced_frames == 0 || voice_ratio < f64::from(min_voice_ratio) {
        return Ok(SpeechFilterOutcome::NoSpeech { voice_ratio });
    }

    Ok(SpeechFilterOutcome::Speech(SpeechAudio {
        pcm: speech,
        sample_rate,
        voice_ratio,
    }))
}

/// Reduces decoded windows to their speech.
pub trait SpeechFilter: Send + Sync {
    fn filter(&self, pcm: &[f32], sample_rate: u32) -> VadResult<SpeechFilterOutcome>;
}

/// [`SpeechFilter`] driven by a [`VadConfig`].
///
/// A fresh classifier is built for every window so recurrent Silero state
/// never leaks between samples.
#[derive(Debug, Clone, Default)]
pub struct VoiceActivityFilter {
    config: VadConfig,
}

impl VoiceActivityFilter {
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }

    /// Build a classifier once to surface initialisation errors early.
    pub fn check(&self, sample_rate: u32) -> VadResult<()> {
        self.classifier(sample_rate).map(|_| ())
    }

    fn classifier(&self, sample_rate: u32) -> VadResult<Box<dyn FrameClassifier>> {
        Ok(match self.config.backend {
            VadBackend::Silero => Box::new(SileroVad::new(sample_rate as usize)?),
            VadBackend::Energy => Box::new(EnergyVad::new(
                sample_rate as usize,
                self.config.energy_frame_ms,
                self.config.energy_threshold,
            )?),
        })
    }
}

impl SpeechFilter for VoiceActivityFilter {
    fn filter(&self, pcm: &[f32], sample_rate: u32) -> VadResult<SpeechFilterOutcome> {
        let mut classifier = self.classifier(sample_rate)?;
        filter_speech(
            classifier.as_mut(),
            pcm,
            sample_rate,
            self.config.speech_threshold,
            self.config.min_voice_ratio,
        )
    }
}
