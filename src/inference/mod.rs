//! Pretrained-model seams. The pipeline only sees [`AiDetector`] and
//! [`ChunkSummarizer`]; which implementation sits behind them is decided
//! once per process by [`ModelSet::load`].

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::{Config, ModelBackend};
use crate::error::{AppError, AppResult};
use crate::models::ScoreResult;

pub mod detector;
pub mod onnx;
pub mod stub;
pub mod summarizer;

pub use detector::OnnxDetector;
pub use stub::{LeadSentenceSummarizer, StubDetector};
pub use summarizer::{GenerationParams, OnnxSummarizer};

/// Scores how likely a text was produced by a language model.
pub trait AiDetector: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, text: &str) -> AppResult<ScoreResult>;
}

/// Summarises one chunk of text. Chunking is the caller's job.
pub trait ChunkSummarizer: Send + Sync {
    fn name(&self) -> &str;

    fn summarize(&self, chunk: &str) -> AppResult<String>;
}

pub struct ModelSet {
    backend: ModelBackend,
    detector: Box<dyn AiDetector>,
    summarizer: Box<dyn ChunkSummarizer>,
}

impl ModelSet {
    pub fn new(
        backend: ModelBackend,
        detector: Box<dyn AiDetector>,
        summarizer: Box<dyn ChunkSummarizer>,
    ) -> Self {
        Self {
            backend,
            detector,
            summarizer,
        }
    }

    pub fn stub() -> Self {
        Self::new(
            ModelBackend::Stub,
            Box::new(StubDetector),
            Box::new(LeadSentenceSummarizer::default()),
        )
    }

    pub fn load(config: &Config) -> AppResult<Self> {
        let start = Instant::now();

        let models = match config.model_backend {
            ModelBackend::Stub => {
                tracing::warn!("Using stub models: scores and summaries are not model output");
                Self::stub()
            }
            ModelBackend::Onnx => {
                let settings = &config.analysis;
                let detector = OnnxDetector::load(
                    &config.models_dir.join("detector"),
                    settings.detector_max_tokens,
                    settings.detector_ai_label_index,
                    config.inference_threads,
                )
                .map_err(|e| AppError::model_load(format!("detector: {:#}", e)))?;

                let summarizer = OnnxSummarizer::load(
                    &config.models_dir.join("summarizer"),
                    GenerationParams::new(settings.summary_min_tokens, settings.summary_max_tokens),
                    config.inference_threads,
                )
                .map_err(|e| AppError::model_load(format!("summarizer: {:#}", e)))?;

                Self::new(ModelBackend::Onnx, Box::new(detector), Box::new(summarizer))
            }
        };

        info!(
            backend = ?models.backend,
            detector = models.detector.name(),
            summarizer = models.summarizer.name(),
            "Models loaded in {}ms",
            start.elapsed().as_millis()
        );
        Ok(models)
    }

    pub fn backend(&self) -> ModelBackend {
        self.backend
    }

    pub fn detector(&self) -> &dyn AiDetector {
        self.detector.as_ref()
    }

    pub fn summarizer(&self) -> &dyn ChunkSummarizer {
        self.summarizer.as_ref()
    }
}

static SHARED_MODELS: OnceCell<Arc<ModelSet>> = OnceCell::new();

/// Process-wide model set. The first caller loads the weights; concurrent
/// callers block until that load finishes and then share the result. A
/// failed load leaves the cell empty.
pub fn shared(config: &Config) -> AppResult<Arc<ModelSet>> {
    SHARED_MODELS
        .get_or_try_init(|| ModelSet::load(config).map(Arc::new))
        .map(Arc::clone)
}

/// The shared model set if it has already been initialised.
pub fn try_shared() -> Option<Arc<ModelSet>> {
    SHARED_MODELS.get().cloned()
}
