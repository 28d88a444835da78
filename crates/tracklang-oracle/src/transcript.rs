//! Transcript sanity checks.
//!
//! Whisper-family models loop on short phrases when fed music or noise.
//! Transcripts that look like that are discarded rather than reported.

/// Share of the text a run of 3+ consecutive repeats may cover.
const MAX_CONSECUTIVE_REPEAT_SHARE: f64 = 0.3;

/// Share of the text a single short phrase may cover.
const MAX_DOMINANT_PHRASE_SHARE: f64 = 0.4;

/// Whether `text` looks like a repetition loop rather than speech.
pub fn looks_hallucinated(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    if normalized.chars().count() < 20 {
        return false;
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.len() < 5 {
        return false;
    }

    let text_len = normalized.len() as f64;

    // A 2-10 word sequence repeated back to back at least three times
    for seq_len in 2..=(words.len() / 2).min(10) {
        for start in 0..words.len().saturating_sub(seq_len * 2) {
            let sequence = &words[start..start + seq_len];
            let repeats = consecutive_repeats(&words[start..], sequence);
            if repeats >= 3 {
                let share = (repeats * sequence.join(" ").len()) as f64 / text_len;
                if share > MAX_CONSECUTIVE_REPEAT_SHARE {
                    return true;
                }
            }
        }
    }

    // A 3-7 word phrase dominating the text
    for seq_len in 3..=(words.len() / 3).min(7) {
        for start in 0..words.len().saturating_sub(seq_len) {
            let phrase = words[start..start + seq_len].join(" ");
            let count = normalized.matches(phrase.as_str()).count();
            if count > 1 && (count * phrase.len()) as f64 / text_len > MAX_DOMINANT_PHRASE_SHARE {
                return true;
            }
        }
    }

    false
}

fn consecutive_repeats(words: &[&str], sequence: &[&str]) -> usize {
    words
        .chunks(sequence.len())
        .take_while(|chunk| *chunk == sequence)
        .count()
}
