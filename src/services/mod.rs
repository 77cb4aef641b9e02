pub mod chart;
pub mod numbers;
pub mod pdf_extractor;
pub mod pipeline;
pub mod presentation;
pub mod summary;
pub mod text;

pub use numbers::{extract_numbers, numbers_display};
pub use pdf_extractor::PdfExtractor;
pub use pipeline::{AnalysisPipeline, HaltReason, Stage};
pub use presentation::build_response;
pub use summary::summarize_text;
