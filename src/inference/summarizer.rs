use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use ort::{inputs, session::Session, value::Value};
use tokenizers::{Tokenizer, TruncationParams};

use super::onnx::{argmax, banned_ngram_tokens, load_session, load_tokenizer, token_id};
use super::ChunkSummarizer;
use crate::error::{AppError, AppResult};

/// Greedy decoding limits. Lengths count decoder tokens including the
/// start token, as the summarization pipelines of the exported models do.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
    pub no_repeat_ngram_size: usize,
    pub max_input_tokens: usize,
}

impl GenerationParams {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            no_repeat_ngram_size: 3,
            max_input_tokens: 1024,
        }
    }
}

/// BART-family encoder/decoder pair (`encoder_model.onnx`,
/// `decoder_model.onnx`, `tokenizer.json`) decoded without sampling.
pub struct OnnxSummarizer {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    params: GenerationParams,
    bos_token_id: i64,
    eos_token_id: i64,
    decoder_start_token_id: i64,
}

impl OnnxSummarizer {
    pub fn load(dir: &Path, params: GenerationParams, intra_threads: usize) -> Result<Self> {
        let mut tokenizer = load_tokenizer(&dir.join("tokenizer.json"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: params.max_input_tokens,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("invalid truncation settings: {}", e))?;
        tokenizer.with_padding(None);

        let bos_token_id = token_id(&tokenizer, "<s>", 0) as i64;
        let eos_token_id = token_id(&tokenizer, "</s>", 2) as i64;

        let encoder = load_session(&dir.join("encoder_model.onnx"), intra_threads)?;
        let decoder = load_session(&dir.join("decoder_model.onnx"), intra_threads)?;

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            params,
            bos_token_id,
            eos_token_id,
            // BART starts decoding from </s> and forces <s> next
            decoder_start_token_id: eos_token_id,
        })
    }

    /// Returns the encoder hidden states as (dims, data) and the source
    /// attention mask.
    fn encode(&self, chunk: &str) -> Result<([usize; 3], Vec<f32>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(chunk, true)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        let input_ids_tensor = Value::from_array(([1_usize, seq_len], input_ids.into_boxed_slice()))?;
        let attention_mask_tensor =
            Value::from_array(([1_usize, seq_len], attention_mask.clone().into_boxed_slice()))?;

        let mut encoder = self
            .encoder
            .lock()
            .map_err(|_| anyhow!("encoder session lock poisoned"))?;
        let outputs = encoder
            .run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])
            .context("encoder forward pass failed")?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 {
            return Err(anyhow!("unexpected encoder output rank {}", dims.len()));
        }

        Ok(([dims[0], dims[1], dims[2]], data.to_vec(), attention_mask))
    }

    /// Logits of the last decoder position for the tokens so far.
    fn next_token_logits(
        &self,
        tokens: &[i64],
        hidden_dims: [usize; 3],
        hidden: &[f32],
        source_mask: &[i64],
    ) -> Result<Vec<f32>> {
        let input_ids = Value::from_array(([1_usize, tokens.len()], tokens.to_vec().into_boxed_slice()))?;
        let encoder_attention_mask = Value::from_array((
            [1_usize, source_mask.len()],
            source_mask.to_vec().into_boxed_slice(),
        ))?;
        let encoder_hidden_states = Value::from_array((hidden_dims, hidden.to_vec().into_boxed_slice()))?;

        let mut decoder = self
            .decoder
            .lock()
            .map_err(|_| anyhow!("decoder session lock poisoned"))?;
        let outputs = decoder
            .run(inputs![
                "input_ids" => input_ids,
                "encoder_attention_mask" => encoder_attention_mask,
                "encoder_hidden_states" => encoder_hidden_states
            ])
            .context("decoder forward pass failed")?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        if shape.len() != 3 {
            return Err(anyhow!("unexpected decoder output rank {}", shape.len()));
        }
        let vocab_size = shape[2] as usize;
        let last_start = (shape[1] as usize - 1) * vocab_size;
        Ok(data[last_start..last_start + vocab_size].to_vec())
    }

    fn generate(&self, chunk: &str) -> Result<String> {
        let (hidden_dims, hidden, source_mask) = self.encode(chunk)?;
        let params = &self.params;

        let mut tokens = vec![self.decoder_start_token_id];

        while tokens.len() < params.max_length {
            let next = if tokens.len() == 1 {
                self.bos_token_id
            } else {
                let mut logits =
                    self.next_token_logits(&tokens, hidden_dims, &hidden, &source_mask)?;

                if tokens.len() < params.min_length {
                    suppress(&mut logits, self.eos_token_id);
                }
                for banned in banned_ngram_tokens(&tokens, params.no_repeat_ngram_size) {
                    suppress(&mut logits, banned);
                }

                argmax(&logits).ok_or_else(|| anyhow!("decoder produced no usable logits"))? as i64
            };

            tokens.push(next);
            if next == self.eos_token_id {
                break;
            }
        }

        let ids: Vec<u32> = tokens.iter().map(|&t| t as u32).collect();
        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| anyhow!("detokenization failed: {}", e))
    }
}

fn suppress(logits: &mut [f32], token: i64) {
    if let Some(logit) = usize::try_from(token).ok().and_then(|idx| logits.get_mut(idx)) {
        *logit = f32::NEG_INFINITY;
    }
}

impl ChunkSummarizer for OnnxSummarizer {
    fn name(&self) -> &str {
        "distilbart-onnx"
    }

    fn summarize(&self, chunk: &str) -> AppResult<String> {
        let start = Instant::now();
        let summary = self
            .generate(chunk)
            .map_err(|e| AppError::inference(format!("{:#}", e)))?;

        tracing::debug!(
            input_chars = chunk.chars().count(),
            summary_chars = summary.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chunk summarized"
        );
        Ok(summary.trim().to_string())
    }
}
