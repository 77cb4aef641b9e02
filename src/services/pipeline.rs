use std::time::Instant;

use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::error::{AppError, AppResult};
use crate::inference::ModelSet;
use crate::models::{AnalysisReport, ExtractedDocument, UploadedFile};
use crate::services::numbers::extract_numbers;
use crate::services::pdf_extractor::PdfExtractor;
use crate::services::summary::summarize_text;
use crate::services::text::take_chars;

/// Why a run stopped before producing a report. These are outcomes of the
/// document, not faults of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// The upload could not be parsed as a PDF.
    Unreadable(String),
    /// The PDF parsed but held no extractable text (e.g. scanned pages).
    EmptyText,
}

impl From<HaltReason> for AppError {
    fn from(reason: HaltReason) -> Self {
        match reason {
            HaltReason::Unreadable(message) => AppError::ExtractionError { message },
            HaltReason::EmptyText => AppError::EmptyText,
        }
    }
}

/// Result of one pipeline stage: either the value for the next stage or
/// the reason the run stopped.
#[derive(Debug)]
pub enum Stage<T> {
    Continue(T),
    Halted(HaltReason),
}

impl<T> Stage<T> {
    pub fn and_then<U, F>(self, next: F) -> AppResult<Stage<U>>
    where
        F: FnOnce(T) -> AppResult<Stage<U>>,
    {
        match self {
            Stage::Continue(value) => next(value),
            Stage::Halted(reason) => Ok(Stage::Halted(reason)),
        }
    }

    pub fn into_result(self) -> AppResult<T> {
        match self {
            Stage::Continue(value) => Ok(value),
            Stage::Halted(reason) => Err(reason.into()),
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Stage::Halted(_))
    }
}

/// Linear, fail-fast analysis: extract, check for text, score, summarise,
/// collect numbers. An inference error aborts the run.
pub struct AnalysisPipeline<'a> {
    models: &'a ModelSet,
    settings: &'a AnalysisSettings,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(models: &'a ModelSet, settings: &'a AnalysisSettings) -> Self {
        Self { models, settings }
    }

    pub fn run(&self, file: &UploadedFile) -> AppResult<Stage<AnalysisReport>> {
        self.extract(file)?
            .and_then(|document| self.analyze(document))
    }

    pub fn extract(&self, file: &UploadedFile) -> AppResult<Stage<ExtractedDocument>> {
        let extractor = PdfExtractor::new(self.settings.extract_char_cap);
        match extractor.extract(file) {
            Ok(document) => Ok(Stage::Continue(document)),
            Err(AppError::ExtractionError { message }) => {
                info!(file_name = %file.name, reason = %message, "Halting: unreadable PDF");
                Ok(Stage::Halted(HaltReason::Unreadable(message)))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the model stages on already extracted text. Blank text halts
    /// before any model is called.
    pub fn analyze(&self, document: ExtractedDocument) -> AppResult<Stage<AnalysisReport>> {
        if !document.has_text() {
            info!(pages = document.pages, "Halting: no extractable text");
            return Ok(Stage::Halted(HaltReason::EmptyText));
        }

        let settings = self.settings;

        let start = Instant::now();
        let detector_input = take_chars(&document.text, settings.detector_char_limit);
        let score = self.models.detector().score(detector_input)?;
        debug!(
            detector = self.models.detector().name(),
            input_chars = detector_input.chars().count(),
            ai_probability = score.ai_probability,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scoring stage finished"
        );

        let start = Instant::now();
        let summary = summarize_text(
            self.models.summarizer(),
            &document.text,
            settings.summary_input_cap,
            settings.summary_chunk_chars,
        )?;
        debug!(
            summarizer = self.models.summarizer().name(),
            summary_chars = summary.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Summary stage finished"
        );

        let numbers = extract_numbers(&document.text);

        info!(
            ai_probability = score.ai_probability,
            band = score.band().label(),
            numbers = numbers.len(),
            "Analysis completed"
        );

        Ok(Stage::Continue(AnalysisReport {
            document,
            score,
            summary,
            numbers,
        }))
    }
}
