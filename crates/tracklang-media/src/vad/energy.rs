//! Frame-energy speech classifier.

use super::filter::FrameClassifier;
use super::{VadError, VadResult};

/// Classifies frames by mean-square energy.
///
/// Output is binary: 1.0 above the threshold, 0.0 otherwise.
#[derive(Debug, Clone)]
pub struct EnergyVad {
    threshold: f32,
    frame_size: usize,
}

impl EnergyVad {
    pub fn new(sample_rate: usize, frame_ms: u32, threshold: f32) -> VadResult<Self> {
        let frame_size = sample_rate * frame_ms as usize / 1000;
        if frame_size == 0 {
            return Err(VadError::InvalidAudioFormat(format!(
                "{} ms frames at {} Hz are empty",
                frame_ms, sample_rate
            )));
        }
        Ok(Self {
            threshold,
            frame_size,
        })
    }

    fn energy(frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32
    }
}

impl FrameClassifier for EnergyVad {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn speech_probability(&mut self, frame: &[f32]) -> VadResult<f32> {
        Ok(if Self::energy(frame) > self.threshold {
            1.0
        } else {
            0.0
        })
    }
}
