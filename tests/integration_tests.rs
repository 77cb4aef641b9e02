//! Integration tests for the Ghostwriter analysis service, driven over a
//! real socket with stub models.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ghostwriter::{
    build_router,
    config::{Config, ModelBackend},
    inference::ModelSet,
    models::ErrorResponse,
    AppState,
};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::net::TcpListener;

use common::{
    config_with, pdf_with_info, pdf_with_pages, stub_config, RecordingSummarizer, SlowDetector,
};

async fn spawn_app(config: Config) -> String {
    spawn_app_with(config, ModelSet::stub()).await
}

async fn spawn_app_with(config: Config, models: ModelSet) -> String {
    let state = AppState::new(config, Arc::new(models));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

fn slow_models(delay: Duration) -> (ModelSet, Arc<std::sync::atomic::AtomicUsize>) {
    let detector = SlowDetector::new(delay);
    let peak = detector.peak.clone();
    let models = ModelSet::new(
        ModelBackend::Stub,
        Box::new(detector),
        Box::new(RecordingSummarizer::default()),
    );
    (models, peak)
}

async fn post_binary(client: &reqwest::Client, base: &str, body: Vec<u8>) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/analyze/binary", base))
        .header("content-type", "application/pdf")
        .body(body)
        .send()
        .await
        .unwrap()
}

fn pdf_form(name: &str, pdf: Vec<u8>) -> Form {
    let part = Part::bytes(pdf)
        .file_name(name.to_string())
        .mime_str("application/pdf")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_analyze_multipart_returns_full_report() {
    let base = spawn_app(stub_config()).await;
    let pdf = pdf_with_info(
        &["Revenue grew 12% to 1,000,000$ in 2023. The board approved the plan."],
        Some("Annual Report"),
    );

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(pdf_form("annual.pdf", pdf))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    let ai = data["ai_probability"].as_f64().unwrap();
    let human = data["human_probability"].as_f64().unwrap();
    assert!((ai + human - 1.0).abs() < 1e-9);
    assert_eq!(data["ai_percentage"], format!("{:.2} %", ai * 100.0));

    let expected_label = ghostwriter::models::RiskBand::from_score(ai).label();
    assert_eq!(data["band"]["label"], expected_label);

    assert_eq!(data["summary"], "Revenue grew 12% to 1,000,000$ in 2023.");
    assert_eq!(data["numbers"], serde_json::json!(["12%", "1,000,000$", "2023"]));
    assert_eq!(data["numbers_display"], "12%, 1,000,000$, 2023");
    assert!(data["text_preview"].as_str().unwrap().contains("The board approved the plan."));
    assert_eq!(data["chart"]["slices"].as_array().unwrap().len(), 2);
    assert!(data["chart"]["svg"].as_str().unwrap().starts_with("<svg"));

    assert_eq!(data["document"]["file_name"], "annual.pdf");
    assert_eq!(data["document"]["pages"], 1);
    assert_eq!(data["document"]["title"], "Annual Report");
}

#[tokio::test]
async fn test_analyze_binary_upload() {
    let base = spawn_app(stub_config()).await;
    let pdf = pdf_with_pages(&["A plain human written note about the garden."]);

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/binary", base))
        .header("content-type", "application/pdf")
        .header("x-file-name", "note.pdf")
        .body(pdf)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["document"]["file_name"], "note.pdf");
    assert_eq!(body["data"]["numbers_display"], "no numeric data found");
}

#[tokio::test]
async fn test_empty_text_pdf_is_rejected() {
    let base = spawn_app(stub_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(pdf_form("scan.pdf", pdf_with_pages(&[""])))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.error.code, "EMPTY_TEXT");
}

#[tokio::test]
async fn test_unreadable_pdf_is_rejected() {
    let base = spawn_app(stub_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(pdf_form("broken.pdf", b"%PDF-1.4 truncated garbage".to_vec()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "EXTRACTION_ERROR");
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected() {
    let base = spawn_app(stub_config()).await;
    let part = Part::bytes(b"just some notes".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "INVALID_FILE");
}

#[tokio::test]
async fn test_missing_file_field() {
    let base = spawn_app(stub_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(Form::new().text("comment", "no file here"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "MISSING_FILE");
}

#[tokio::test]
async fn test_binary_upload_requires_pdf_content_type() {
    let base = spawn_app(stub_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/binary", base))
        .header("content-type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "INVALID_CONTENT_TYPE");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let base = spawn_app(config_with(&[("MAX_FILE_SIZE_MB", "1")])).await;
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(1024 * 1024 + 512 * 1024, b' ');

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze/binary", base))
        .header("content-type", "application/pdf")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 413);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "FILE_TOO_LARGE");
}

#[tokio::test]
async fn test_health_reports_stub_backend() {
    let base = spawn_app(stub_config()).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["model_backend"], "stub");
    assert_eq!(body["services"]["pdf_extractor"], true);
    assert_eq!(body["rate_limiting"]["max_concurrent_requests"], 4);
}

#[tokio::test]
async fn test_ready_and_index_page() {
    let base = spawn_app(stub_config()).await;

    let ready = reqwest::get(format!("{}/ready", base)).await.unwrap();
    assert_eq!(ready.status(), 200);
    let body: Value = ready.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    let index = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(index.status(), 200);
    let html = index.text().await.unwrap();
    assert!(html.contains("<form id=\"upload\">"));
    assert!(html.contains("/api/v1/analyze"));
}

#[tokio::test]
async fn test_ready_while_every_slot_is_busy() {
    let (models, _) = slow_models(Duration::from_millis(1500));
    let base = spawn_app_with(config_with(&[("MAX_CONCURRENT_REQUESTS", "1")]), models).await;
    let client = reqwest::Client::new();

    let in_flight = {
        let client = client.clone();
        let base = base.clone();
        tokio::spawn(async move {
            post_binary(&client, &base, pdf_with_pages(&["Busy document."])).await.status()
        })
    };
    tokio::time::sleep(Duration::from_millis(400)).await;

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["rate_limiting"]["available_permits"], 0);

    let ready = client.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(ready.status(), 200);

    assert_eq!(in_flight.await.unwrap(), 200);
}

#[tokio::test]
async fn test_timed_out_analysis_holds_its_slot_until_inference_returns() {
    let (models, peak) = slow_models(Duration::from_millis(2500));
    let config = config_with(&[
        ("MAX_CONCURRENT_REQUESTS", "1"),
        ("REQUEST_TIMEOUT_SECONDS", "1"),
    ]);
    let base = spawn_app_with(config, models).await;
    let client = reqwest::Client::new();
    let pdf = pdf_with_pages(&["Some text worth scoring."]);

    let first = post_binary(&client, &base, pdf.clone()).await;
    assert_eq!(first.status(), 408);
    let body: ErrorResponse = first.json().await.unwrap();
    assert_eq!(body.error.code, "REQUEST_TIMEOUT");

    // Inference from the first request is still running
    let second = post_binary(&client, &base, pdf).await;
    assert_eq!(second.status(), 429);
    let body: ErrorResponse = second.json().await.unwrap();
    assert_eq!(body.error.code, "RATE_LIMIT_EXCEEDED");

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["rate_limiting"]["available_permits"], 1);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_binary_body_past_transport_limit_gets_json_envelope() {
    let base = spawn_app(config_with(&[("MAX_FILE_SIZE_MB", "1")])).await;
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(3 * 1024 * 1024, b' ');

    let response = post_binary(&reqwest::Client::new(), &base, body).await;

    assert_eq!(response.status(), 413);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.error.code, "FILE_TOO_LARGE");
    assert!(body.error.message.contains("limit of 1MB"));
}

#[tokio::test]
async fn test_multipart_body_past_transport_limit_is_file_too_large() {
    let base = spawn_app(config_with(&[("MAX_FILE_SIZE_MB", "1")])).await;
    let mut pdf = b"%PDF-1.4\n".to_vec();
    pdf.resize(3 * 1024 * 1024, b' ');

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .multipart(pdf_form("huge.pdf", pdf))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 413);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "FILE_TOO_LARGE");
}

#[tokio::test]
async fn test_error_envelope_carries_request_id_header() {
    let base = spawn_app(stub_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/analyze", base))
        .header("x-request-id", "trace-me-42")
        .multipart(Form::new().text("comment", "no file here"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(response.headers()["x-request-id"], "trace-me-42");
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error.code, "MISSING_FILE");
    assert_eq!(body.error.request_id, "trace-me-42");
}

#[tokio::test]
async fn test_rate_limiter_rejects_when_saturated() {
    let limiter = ghostwriter::middleware::RateLimiter::new(1);

    let held = limiter.try_acquire().unwrap();
    assert!(matches!(
        limiter.try_acquire(),
        Err(ghostwriter::AppError::RateLimitExceeded)
    ));

    let metrics = limiter.metrics();
    assert_eq!(metrics.total_requests, 2);
    assert_eq!(metrics.rejected_requests, 1);
    assert_eq!(metrics.available_permits, 0);

    drop(held);
    assert!(limiter.try_acquire().is_ok());
}
