use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use harvest_report::core::generator::ReportSettings;
use harvest_report::server::{create_router, AppState};
use harvest_report::{LocalStorage, PdfRenderer, ReportService};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const API_KEY: &str = "test-secret";
const BASE_URL: &str = "http://localhost:8000";

fn api_key_header() -> HeaderName {
    HeaderName::from_static("x-api-key")
}

fn test_server(dir: &TempDir) -> TestServer {
    let storage = LocalStorage::new(dir.path(), BASE_URL);
    let reports = ReportService::new(
        Arc::new(PdfRenderer::new()),
        Arc::new(storage),
        ReportSettings {
            object_prefix: "reports/".to_string(),
            ..ReportSettings::default()
        },
    );
    let state = AppState::new(reports, API_KEY, dir.path());
    TestServer::new(create_router(state)).unwrap()
}

fn report_body() -> Value {
    json!({
        "executive_summary": "Harvesting $1,240 of losses this quarter.\n\nNo wash sales detected.",
        "portfolio_summary": "| Symbol | Shares | Price |\n|---|---|---|\n| XYZ | 10 | 40.00 |\n| ABC | 5 | 150.00 |",
        "tax_loss_harvesting_analysis": "| Symbol | Loss | Term |\n|:---|---:|:---:|\n| XYZ | -$100.00 | Short |",
        "reinvestment_strategy": "Rotate XYZ proceeds into a broad market ETF.",
        "portfolio_outlook": "Volatility is expected to stay elevated.",
        "actionable_next_steps": "1. Sell XYZ\n2. Buy VTI\n3. Review in 31 days",
        "irs_compliance_warning": "Avoid repurchasing XYZ within 30 days."
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_generate_without_api_key_is_unauthorized() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let response = server.post("/generate-pdf").json(&report_body()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["detail"], "Invalid or missing API Key");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_generate_with_wrong_api_key_is_unauthorized() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let response = server
        .post("/generate-pdf")
        .add_header(api_key_header(), HeaderValue::from_static("wrong"))
        .json(&report_body())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generate_pdf_and_download_it() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let response = server
        .post("/generate-pdf")
        .add_header(api_key_header(), HeaderValue::from_static(API_KEY))
        .json(&report_body())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], "PDF generated successfully");
    let file_url = body["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("http://localhost:8000/files/reports/Portfolio_Optimization_Report_"));
    assert!(file_url.ends_with(".pdf"));

    // 透過 /files 下載剛產生的報告
    let path = file_url.strip_prefix(BASE_URL).unwrap();
    let download = server.get(path).await;
    download.assert_status_ok();
    assert!(download.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_generate_rejects_malformed_table() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let mut body = report_body();
    body["portfolio_summary"] = json!("| Symbol | Shares |\n| XYZ | 10 |\n| ABC | 5 |");

    let response = server
        .post("/generate-pdf")
        .add_header(api_key_header(), HeaderValue::from_static(API_KEY))
        .json(&body)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let detail = response.json::<Value>()["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Error generating PDF"));
    assert!(detail.contains("Portfolio Summary"));
}

#[tokio::test]
async fn test_generate_upload_failure_is_server_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("storage");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let reports = ReportService::new(
        Arc::new(PdfRenderer::new()),
        Arc::new(LocalStorage::new(&blocker, BASE_URL)),
        ReportSettings::default(),
    );
    let server = TestServer::new(create_router(AppState::new(reports, API_KEY, dir.path()))).unwrap();

    let response = server
        .post("/generate-pdf")
        .add_header(api_key_header(), HeaderValue::from_static(API_KEY))
        .json(&report_body())
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["detail"], "Error uploading PDF to object storage.");
}

#[tokio::test]
async fn test_generate_rejects_missing_fields() {
    let dir = TempDir::new().unwrap();
    let server = test_server(&dir);

    let response = server
        .post("/generate-pdf")
        .add_header(api_key_header(), HeaderValue::from_static(API_KEY))
        .json(&json!({ "executive_summary": "only one field" }))
        .await;
    assert!(response.status_code().is_client_error());
}
