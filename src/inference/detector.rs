use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use ort::{inputs, session::Session, value::Value};
use tokenizers::{Tokenizer, TruncationParams};

use super::onnx::{load_session, load_tokenizer};
use super::AiDetector;
use crate::error::{AppError, AppResult};
use crate::models::ScoreResult;

/// RoBERTa sequence classifier exported to ONNX (`model.onnx` plus
/// `tokenizer.json`). Two output classes; which one means "generated" is
/// set by `ai_label_index`.
pub struct OnnxDetector {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    ai_label_index: usize,
}

impl OnnxDetector {
    pub fn load(
        dir: &Path,
        max_tokens: usize,
        ai_label_index: usize,
        intra_threads: usize,
    ) -> Result<Self> {
        let mut tokenizer = load_tokenizer(&dir.join("tokenizer.json"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("invalid truncation settings: {}", e))?;
        tokenizer.with_padding(None);

        let session = load_session(&dir.join("model.onnx"), intra_threads)?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            ai_label_index,
        })
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        let input_ids = Value::from_array(([1_usize, seq_len], input_ids.into_boxed_slice()))?;
        let attention_mask =
            Value::from_array(([1_usize, seq_len], attention_mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("detector session lock poisoned"))?;
        let outputs = session
            .run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
            .context("classifier forward pass failed")?;

        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;
        Ok(logits.to_vec())
    }
}

impl AiDetector for OnnxDetector {
    fn name(&self) -> &str {
        "roberta-onnx"
    }

    fn score(&self, text: &str) -> AppResult<ScoreResult> {
        let start = Instant::now();
        let logits = self
            .logits(text)
            .map_err(|e| AppError::inference(format!("{:#}", e)))?;

        let score = ScoreResult::from_logits(&logits, self.ai_label_index).ok_or_else(|| {
            AppError::inference(format!("expected 2 logits, model returned {}", logits.len()))
        })?;

        tracing::debug!(
            ai_probability = score.ai_probability,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Detector scored text"
        );
        Ok(score)
    }
}
