//! Character-based slicing helpers. Every cap in the pipeline counts
//! characters, never bytes, so a cut can not land inside a UTF-8 sequence.

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Shortens `text` in place to at most `max_chars` characters.
/// Returns true when something was cut.
pub fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}

/// Splits `text` into consecutive slices of `chunk_chars` characters; the
/// last slice holds the remainder. Boundaries ignore words and sentences.
pub fn chunk_chars(text: &str, chunk_chars: usize) -> Vec<&str> {
    if chunk_chars == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == chunk_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}
