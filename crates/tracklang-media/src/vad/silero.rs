//! Silero VAD v5 frame classifier.
//!
//! Frames are ~32ms: 256 samples at 8kHz, 512 at 16kHz.

use tracing::{debug, trace};
use voice_activity_detector::VoiceActivityDetector;

use super::filter::FrameClassifier;
use super::{VadError, VadResult};

/// Frame length Silero v5 accepts at `sample_rate`, if supported.
fn silero_frame_len(sample_rate: usize) -> Option<usize> {
    match sample_rate {
        8000 => Some(256),
        16000 => Some(512),
        _ => None,
    }
}

/// Recurrent Silero detector for one window of audio.
pub struct SileroVad {
    detector: VoiceActivityDetector,
    sample_rate: usize,
    frame_len: usize,
}

impl SileroVad {
    /// Load the bundled model for `sample_rate` (8000 or 16000).
    pub fn new(sample_rate: usize) -> VadResult<Self> {
        let frame_len = silero_frame_len(sample_rate).ok_or_else(|| {
            VadError::InvalidAudioFormat(format!(
                "Silero needs 8kHz or 16kHz audio, got {}Hz",
                sample_rate
            ))
        })?;

        let detector = VoiceActivityDetector::builder()
            .sample_rate(sample_rate as i64)
            .chunk_size(frame_len)
            .build()
            .map_err(|e| VadError::InitializationFailed(format!("{:?}", e)))?;

        debug!(sample_rate, frame_len, "Silero detector ready");

        Ok(Self {
            detector,
            sample_rate,
            frame_len,
        })
    }

    pub fn frame_duration_ms(&self) -> u64 {
        (self.frame_len * 1000 / self.sample_rate) as u64
    }
}

impl FrameClassifier for SileroVad {
    fn frame_size(&self) -> usize {
        self.frame_len
    }

    fn speech_probability(&mut self, frame: &[f32]) -> VadResult<f32> {
        let probability = self.detector.predict(frame.iter().copied());
        if !probability.is_finite() {
            return Err(VadError::InferenceFailed(format!(
                "detector returned {}",
                probability
            )));
        }
        trace!(probability, "Frame scored");
        Ok(probability)
    }
}
