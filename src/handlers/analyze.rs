use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError, rejection::BytesRejection, Extension, Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::logging::request_id_from;
use crate::middleware::rate_limit::AnalysisSlot;
use crate::models::{AnalyzeResponse, UploadedFile};
use crate::services::{build_response, AnalysisPipeline};
use crate::state::AppState;

/// `POST /api/v1/analyze` with a multipart `file` field.
pub async fn analyze_handler(
    State(state): State<AppState>,
    Extension(slot): Extension<AnalysisSlot>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<AnalyzeResponse>> {
    let request_id = request_id_from(&headers);
    info!(request_id = %request_id, "Starting PDF analysis request");

    let limit = UploadLimit::new(&state.config, &headers);
    let file = match extract_file_from_multipart(&mut multipart, &limit).await {
        Ok(file) => {
            info!(
                request_id = %request_id,
                file_name = %file.name,
                file_size = file.size,
                "File extracted from multipart form"
            );
            file
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Failed to extract file from multipart");
            return Err(e);
        }
    };

    run_analysis(&state, slot, file, &request_id).await.map(Json)
}

/// `POST /api/v1/analyze/binary` with the PDF as the raw body.
pub async fn analyze_binary_handler(
    State(state): State<AppState>,
    Extension(slot): Extension<AnalysisSlot>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let request_id = request_id_from(&headers);
    info!(request_id = %request_id, "Starting binary PDF analysis request");

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            warn!(request_id = %request_id, "Request body exceeds the upload limit");
            UploadLimit::new(&state.config, &headers).exceeded()
        } else {
            AppError::InvalidFile {
                message: rejection.body_text(),
            }
        }
    })?;

    let content_type = headers
        .get("content-type")
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("");

    if !content_type.contains("application/pdf") {
        warn!(
            request_id = %request_id,
            content_type = content_type,
            "Invalid content type for binary upload"
        );
        return Err(AppError::InvalidContentType);
    }

    if body.is_empty() {
        warn!(request_id = %request_id, "Empty body received");
        return Err(AppError::MissingFile);
    }

    let file_name = headers
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("uploaded.pdf")
        .to_string();
    let file = UploadedFile::new(file_name, body).with_mime_type("application/pdf");

    run_analysis(&state, slot, file, &request_id).await.map(Json)
}

/// Upload size limit plus the size the client declared, for reporting
/// bodies that were cut off before they were fully read.
struct UploadLimit {
    limit_mb: usize,
    declared_bytes: Option<usize>,
}

impl UploadLimit {
    fn new(config: &Config, headers: &HeaderMap) -> Self {
        let declared_bytes = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        Self {
            limit_mb: config.max_file_size_mb,
            declared_bytes,
        }
    }

    fn exceeded(&self) -> AppError {
        AppError::FileTooLarge {
            size: self
                .declared_bytes
                .map(|bytes| bytes.div_ceil(1024 * 1024))
                .unwrap_or(self.limit_mb + 1),
            limit: self.limit_mb,
        }
    }

    fn map_multipart_error(&self, err: MultipartError, context: &str) -> AppError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            self.exceeded()
        } else {
            AppError::InvalidFile {
                message: format!("{}: {}", context, err),
            }
        }
    }
}

/// Size check, then the blocking pipeline on the blocking pool under the
/// configured timeout.
async fn run_analysis(
    state: &AppState,
    slot: AnalysisSlot,
    file: UploadedFile,
    request_id: &str,
) -> AppResult<AnalyzeResponse> {
    let start = Instant::now();
    let config = state.config.clone();

    let max_size_bytes = config.max_file_size_bytes();
    if file.size > max_size_bytes {
        warn!(
            request_id = %request_id,
            file_size = file.size,
            max_size = max_size_bytes,
            "File size exceeds limit"
        );
        return Err(AppError::FileTooLarge {
            size: file.size.div_ceil(1024 * 1024),
            limit: config.max_file_size_mb,
        });
    }

    let file_name = file.name.clone();
    let models = state.models.clone();
    let pipeline_config = config.clone();
    let task = tokio::task::spawn_blocking(move || {
        let _slot = slot;
        AnalysisPipeline::new(&models, &pipeline_config.analysis).run(&file)
    });

    // On timeout the blocking task keeps running and keeps its slot; its
    // result is dropped
    let stage = tokio::time::timeout(config.request_timeout(), task).await???;

    let report = match stage.into_result() {
        Ok(report) => report,
        Err(e) => {
            info!(request_id = %request_id, reason = %e, "Analysis halted");
            return Err(e);
        }
    };

    let total_time = start.elapsed().as_millis() as u64;
    let response = build_response(report, &file_name, config.analysis.preview_chars, total_time);

    info!(
        request_id = %request_id,
        ai_probability = response.data.ai_probability,
        band = response.data.band.label,
        total_time_ms = total_time,
        "Request completed successfully"
    );

    Ok(response)
}

async fn extract_file_from_multipart(
    multipart: &mut Multipart,
    limit: &UploadLimit,
) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| limit.map_multipart_error(e, "Failed to read multipart field"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unknown.pdf").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| limit.map_multipart_error(e, "Failed to read file data"))?;

        if data.is_empty() {
            return Err(AppError::InvalidFile {
                message: "File is empty".to_string(),
            });
        }

        let mut file = UploadedFile::new(file_name, data);
        if let Some(mime_type) = content_type {
            file = file.with_mime_type(mime_type);
        }

        if !file.is_pdf() {
            return Err(AppError::InvalidFile {
                message: "File is not a valid PDF document".to_string(),
            });
        }

        debug!(
            "Extracted file: {} ({} bytes, type: {:?})",
            file.name,
            file.size,
            file.mime_type
        );

        return Ok(file);
    }

    Err(AppError::MissingFile)
}
