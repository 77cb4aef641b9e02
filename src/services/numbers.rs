use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::NumberList;

/// A number is either digit-grouped (`1,000,000`, `1.250.000,50`) or plain
/// (`2023`, `3.14`, `12,5`), and may carry one directly attached `%`, `€`,
/// `$` or `£`. A bare number must end on a word boundary, so `2nd` and
/// `12abc` yield nothing.
static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[0-9]{1,3}(?:[.,][0-9]{3})+(?:[.,][0-9]+)?|[0-9]+(?:[.,][0-9]+)?)(?:[%€$£]|\b)",
    )
    .expect("number pattern is a valid regex")
});

/// Distinct numeric tokens ordered by where each value first occurs in the
/// text as a substring, which may precede its first match (`v12 ... 12`).
/// Tokens are raw substrings; nothing is parsed or normalised.
pub fn extract_numbers(text: &str) -> NumberList {
    let mut seen = HashSet::new();
    let mut numbers = Vec::new();

    for m in NUMBER_PATTERN.find_iter(text) {
        let token = m.as_str();
        if seen.insert(token) {
            numbers.push(token.to_string());
        }
    }
    // Stable: values first seen at the same offset keep match order
    numbers.sort_by_key(|token| text.find(token.as_str()).unwrap_or(usize::MAX));

    tracing::debug!(distinct = numbers.len(), "Numeric tokens extracted");
    numbers
}

/// Text shown in the numbers panel.
pub fn numbers_display(numbers: &[String]) -> String {
    if numbers.is_empty() {
        "no numeric data found".to_string()
    } else {
        numbers.join(", ")
    }
}
