use crate::error::AppResult;
use crate::inference::ChunkSummarizer;
use crate::services::text::{chunk_chars, take_chars};

/// Summarises the first `input_cap` characters of `text` in fixed-size
/// character chunks. Chunk summaries are joined with single spaces in chunk
/// order. Anything past `input_cap` is not summarised.
pub fn summarize_text(
    summarizer: &dyn ChunkSummarizer,
    text: &str,
    input_cap: usize,
    chunk_size: usize,
) -> AppResult<String> {
    let capped = take_chars(text, input_cap);
    let chunks = chunk_chars(capped, chunk_size);

    tracing::debug!(chunks = chunks.len(), input_chars = capped.chars().count(), "Summarizing");

    let mut parts = Vec::with_capacity(chunks.len());
    for (idx, chunk) in chunks.iter().enumerate() {
        let part = summarizer.summarize(chunk)?;
        let part = part.trim();
        tracing::debug!(chunk = idx, summary_chars = part.len(), "Chunk summarized");
        if !part.is_empty() {
            parts.push(part.to_string());
        }
    }

    Ok(parts.join(" "))
}
