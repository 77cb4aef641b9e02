use serde::{Deserialize, Serialize};

use super::analysis::RiskBand;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalyzeData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    pub ai_probability: f64,
    pub human_probability: f64,
    pub ai_percentage: String,
    pub band: BandView,
    pub chart: ChartView,
    pub summary: String,
    pub numbers: Vec<String>,
    pub numbers_display: String,
    pub text_preview: String,
    pub document: DocumentInfo,
}

#[derive(Debug, Serialize)]
pub struct BandView {
    pub level: RiskBand,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

impl From<RiskBand> for BandView {
    fn from(band: RiskBand) -> Self {
        Self {
            level: band,
            label: band.label(),
            description: band.description(),
            color: band.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct ChartView {
    pub title: &'static str,
    pub slices: Vec<ChartSlice>,
    pub svg: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub file_name: String,
    pub pages: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub file_size_bytes: usize,
    pub extracted_chars: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub request_id: String,
}
