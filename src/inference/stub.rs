//! Weight-free stand-ins for local runs and tests.

use super::{AiDetector, ChunkSummarizer};
use crate::error::AppResult;
use crate::models::ScoreResult;
use crate::services::text::take_chars;

/// Pseudo-random score derived from the text itself, so the same input
/// always gets the same number.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubDetector;

impl StubDetector {
    fn fingerprint(text: &str) -> u64 {
        // FNV-1a
        text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl AiDetector for StubDetector {
    fn name(&self) -> &str {
        "stub"
    }

    fn score(&self, text: &str) -> AppResult<ScoreResult> {
        let ai = (Self::fingerprint(text) % 10_000) as f64 / 10_000.0;
        Ok(ScoreResult::from_ai_probability(ai))
    }
}

/// Returns the first sentence of each chunk, whitespace-collapsed.
#[derive(Debug, Clone)]
pub struct LeadSentenceSummarizer {
    max_chars: usize,
}

impl LeadSentenceSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for LeadSentenceSummarizer {
    fn default() -> Self {
        Self::new(300)
    }
}

impl ChunkSummarizer for LeadSentenceSummarizer {
    fn name(&self) -> &str {
        "lead-sentence"
    }

    fn summarize(&self, chunk: &str) -> AppResult<String> {
        let collapsed = chunk.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut chars = collapsed.char_indices().peekable();
        let mut end = collapsed.len();
        while let Some((idx, ch)) = chars.next() {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if matches!(ch, '.' | '!' | '?') && at_boundary {
                end = idx + ch.len_utf8();
                break;
            }
        }

        Ok(take_chars(&collapsed[..end], self.max_chars).to_string())
    }
}
