use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tokenizers::Tokenizer;

pub fn load_session(path: &Path, intra_threads: usize) -> Result<Session> {
    require_file(path)?;
    tracing::info!("Loading ONNX model from {}", path.display());

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)
        .with_context(|| format!("failed to build session for {}", path.display()))?;

    tracing::debug!(
        inputs = session.inputs.len(),
        outputs = session.outputs.len(),
        "ONNX session ready"
    );
    Ok(session)
}

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    require_file(path)?;
    Tokenizer::from_file(path).map_err(|e| anyhow!("failed to load tokenizer {}: {}", path.display(), e))
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(anyhow!("model file not found: {}", path.display()))
    }
}

pub fn token_id(tokenizer: &Tokenizer, token: &str, fallback: u32) -> u32 {
    tokenizer.token_to_id(token).unwrap_or_else(|| {
        tracing::warn!(token = token, fallback = fallback, "Token missing from vocabulary");
        fallback
    })
}

/// Index of the largest logit. NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
}

/// Tokens that would complete an n-gram already present in `tokens`.
pub fn banned_ngram_tokens(tokens: &[i64], ngram_size: usize) -> Vec<i64> {
    if ngram_size == 0 || tokens.len() < ngram_size {
        return Vec::new();
    }
    let prefix_len = ngram_size - 1;
    let current = &tokens[tokens.len() - prefix_len..];

    tokens
        .windows(ngram_size)
        .filter(|window| &window[..prefix_len] == current)
        .map(|window| window[prefix_len])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest_and_skips_nan() {
        assert_eq!(argmax(&[0.1, 2.5, -1.0]), Some(1));
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn trigram_repeats_are_banned() {
        // "a b c a b" -> next "c" would repeat "a b c"
        let tokens = [1, 2, 3, 1, 2];
        assert_eq!(banned_ngram_tokens(&tokens, 3), vec![3]);
        assert!(banned_ngram_tokens(&[1, 2], 3).is_empty());
        assert!(banned_ngram_tokens(&[1, 2, 3, 4], 3).is_empty());
    }
}
