//! Sampling strategy.
//!
//! Decides how many windows to take from a track, where, and for how long.
//! Pure functions of the configuration and the total duration.

use tracklang_models::SampleWindow;

use crate::config::SamplingConfig;

#[derive(Debug, Clone)]
pub struct SamplingStrategy {
    config: SamplingConfig,
}

impl SamplingStrategy {
    pub fn new(config: SamplingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Windows of the regular pass, in position order.
    ///
    /// Every window satisfies `start + duration <= total` when the total is known.
    pub fn plan(&self, total_secs: f64) -> Vec<SampleWindow> {
        let sample = self.config.sample_duration_secs;

        // Unknown duration: read from the top and take what exists
        if !(total_secs.is_finite() && total_secs > 0.0) {
            return vec![window(0, 0.0, 0.0, sample, false)];
        }

        if total_secs <= sample {
            return vec![window(0, 0.0, 0.0, total_secs, false)];
        }

        let positions = &self.config.positions;
        let mut count = positions.len();
        if total_secs < count as f64 * sample {
            count = ((total_secs / sample).floor() as usize).max(1);
        }

        spread(positions, count)
            .into_iter()
            .enumerate()
            .map(|(index, fraction)| {
                let start = (total_secs * fraction).min(total_secs - sample).max(0.0);
                window(index as u32, fraction, start, sample, false)
            })
            .collect()
    }

    /// The single long window of the extended pass.
    pub fn extended_window(&self, total_secs: f64, index: u32) -> SampleWindow {
        let cap = self.config.extended_max_secs;

        if !(total_secs.is_finite() && total_secs > 0.0) {
            return window(index, 0.0, 0.0, cap, true);
        }

        let fraction = self.config.extended_start_fraction;
        let start = total_secs * fraction;
        let duration = (total_secs * self.config.extended_span_fraction)
            .min(cap)
            .min(total_secs - start);
        window(index, fraction, start, duration, true)
    }
}

fn window(index: u32, offset_fraction: f64, start_secs: f64, duration_secs: f64, extended: bool) -> SampleWindow {
    SampleWindow {
        index,
        offset_fraction,
        start_secs,
        duration_secs,
        extended,
    }
}

/// Pick `count` evenly spread entries, keeping the first and last.
///
/// A single pick takes the middle entry.
fn spread(positions: &[f64], count: usize) -> Vec<f64> {
    let len = positions.len();
    if count >= len {
        return positions.to_vec();
    }
    if count <= 1 {
        return vec![positions[len / 2]];
    }
    (0..count)
        .map(|i| {
            let idx = (i as f64 * (len - 1) as f64 / (count - 1) as f64).round() as usize;
            positions[idx.min(len - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> SamplingStrategy {
        SamplingStrategy::new(SamplingConfig::default())
    }

    fn assert_starts(windows: &[SampleWindow], expected: &[f64]) {
        assert_eq!(windows.len(), expected.len());
        for (w, e) in windows.iter().zip(expected) {
            assert!((w.start_secs - e).abs() < 1e-6, "{} != {}", w.start_secs, e);
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_feature_length_track() {
        let windows = strategy().plan(5400.0);
        assert_eq!(windows.len(), 5);
        assert_starts(&windows, &[810.0, 1350.0, 1890.0, 2700.0, 3510.0]);
        assert!(windows.iter().all(|w| w.duration_secs == 90.0 && !w.extended));
        assert_eq!(windows.iter().map(|w| w.index).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_windows_stay_inside_track() {
        for total in [91.0, 180.0, 200.0, 449.0, 450.0, 451.0, 600.0, 7200.5] {
            for w in strategy().plan(total) {
                assert!(w.start_secs >= 0.0);
                assert!(w.end_secs() <= total + 1e-9, "total {total}: {w:?}");
            }
        }
    }

    #[test]
    fn test_short_track_reduces_count() {
        let windows = strategy().plan(200.0);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].offset_fraction, 0.15);
        assert_eq!(windows[1].offset_fraction, 0.65);
        // 0.65 * 200 = 130, clipped so the window ends at 200
        assert_starts(&windows, &[30.0, 110.0]);

        let windows = strategy().plan(100.0);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].offset_fraction, 0.35);
        assert!(approx(windows[0].start_secs, 10.0));
    }

    #[test]
    fn test_track_shorter_than_one_sample() {
        let windows = strategy().plan(42.5);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_secs, 0.0);
        assert_eq!(windows[0].duration_secs, 42.5);
    }

    #[test]
    fn test_unknown_duration() {
        for total in [0.0, -1.0, f64::NAN] {
            let windows = strategy().plan(total);
            assert_eq!(windows.len(), 1);
            assert_eq!(windows[0].start_secs, 0.0);
            assert_eq!(windows[0].duration_secs, 90.0);
        }
    }

    #[test]
    fn test_extended_window() {
        let w = strategy().extended_window(3000.0, 5);
        assert!(w.extended);
        assert_eq!(w.index, 5);
        assert!(approx(w.start_secs, 300.0));
        assert!(approx(w.duration_secs, 2400.0));

        // Capped at an hour
        let w = strategy().extended_window(10_000.0, 5);
        assert!(approx(w.start_secs, 1000.0));
        assert_eq!(w.duration_secs, 3600.0);

        let w = strategy().extended_window(0.0, 1);
        assert_eq!(w.start_secs, 0.0);
        assert_eq!(w.duration_secs, 3600.0);
    }

    #[test]
    fn test_spread() {
        let p = [0.15, 0.25, 0.35, 0.50, 0.65];
        assert_eq!(spread(&p, 5), p.to_vec());
        assert_eq!(spread(&p, 3), vec![0.15, 0.35, 0.65]);
        assert_eq!(spread(&p, 4), vec![0.15, 0.25, 0.50, 0.65]);
        assert_eq!(spread(&p, 1), vec![0.35]);
    }
}
