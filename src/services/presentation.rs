use crate::models::{AnalysisReport, AnalyzeData, AnalyzeResponse, ChartView, DocumentInfo};
use crate::services::chart::{donut_slices, render_donut_svg, CHART_TITLE};
use crate::services::numbers::numbers_display;
use crate::services::text::take_chars;

/// Turns a finished report into the API payload the upload page renders.
pub fn build_response(
    report: AnalysisReport,
    file_name: &str,
    preview_chars: usize,
    processing_time_ms: u64,
) -> AnalyzeResponse {
    let AnalysisReport {
        document,
        score,
        summary,
        numbers,
    } = report;

    let slices = donut_slices(&score);
    let svg = render_donut_svg(&slices, CHART_TITLE);

    AnalyzeResponse {
        success: true,
        data: AnalyzeData {
            ai_probability: score.ai_probability,
            human_probability: score.human_probability,
            ai_percentage: score.ai_percentage(),
            band: score.band().into(),
            chart: ChartView {
                title: CHART_TITLE,
                slices,
                svg,
            },
            summary,
            numbers_display: numbers_display(&numbers),
            numbers,
            text_preview: take_chars(&document.text, preview_chars).to_string(),
            document: DocumentInfo {
                file_name: file_name.to_string(),
                pages: document.pages,
                extracted_chars: document.char_count(),
                title: document.title,
                author: document.author,
                file_size_bytes: document.file_size_bytes,
                truncated: document.truncated,
            },
        },
        processing_time_ms,
    }
}
