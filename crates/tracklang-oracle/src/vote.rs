//! Chunk splitting and language voting.

use std::collections::BTreeMap;

use crate::model::LanguageProbability;

/// Winning language of a set of chunk identifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub language: String,
    /// Highest chunk probability of the winner, in [0, 1]
    pub confidence: f32,
    /// Chunks that voted for the winner
    pub votes: usize,
}

/// Split `pcm` into at most `max_chunks` windows of `chunk_len` samples.
///
/// Only whole chunks count, except that a buffer shorter than one chunk is
/// used as is.
pub fn split_chunks(pcm: &[f32], chunk_len: usize, max_chunks: usize) -> Vec<&[f32]> {
    if pcm.is_empty() || chunk_len == 0 {
        return Vec::new();
    }

    let count = (pcm.len() / chunk_len).max(1).min(max_chunks.max(1));
    (0..count)
        .map(|i| {
            let start = i * chunk_len;
            &pcm[start..((i + 1) * chunk_len).min(pcm.len())]
        })
        .collect()
}

/// Pick the language with the best `mean × votes + max` score.
///
/// Equal scores go to the alphabetically first code.
pub fn tally(results: &[LanguageProbability]) -> Option<Vote> {
    let mut by_language: BTreeMap<&str, Vec<f32>> = BTreeMap::new();
    for result in results {
        let probability = if result.probability.is_finite() {
            result.probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        by_language
            .entry(result.language.as_str())
            .or_default()
            .push(probability);
    }

    let mut best: Option<(f32, Vote)> = None;
    for (language, probabilities) in by_language {
        let votes = probabilities.len();
        let max = probabilities.iter().copied().fold(0.0f32, f32::max);
        let mean = probabilities.iter().sum::<f32>() / votes as f32;
        let score = mean * votes as f32 + max;

        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((
                score,
                Vote {
                    language: language.to_string(),
                    confidence: max,
                    votes,
                },
            ));
        }
    }

    best.map(|(_, vote)| vote)
}
