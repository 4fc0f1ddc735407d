pub mod error;

use crate::core::generator::ReportService;
use crate::domain::model::{GenerateResponse, ReportRequest};
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use error::{ApiError, ApiResult};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportService>,
    pub api_key: Arc<str>,
    pub files_dir: PathBuf,
}

impl AppState {
    pub fn new(reports: ReportService, api_key: &str, files_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports: Arc::new(reports),
            api_key: Arc::from(api_key),
            files_dir: files_dir.into(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/generate-pdf", post(generate_pdf))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .nest_service("/files", ServeDir::new(&state.files_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == &*state.api_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("🔒 Unauthorized access attempt with an invalid API key");
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::warn!("🔒 Unauthorized access attempt without an API key");
            Err(ApiError::Unauthorized)
        }
    }
}

async fn generate_pdf(
    State(state): State<AppState>,
    Json(body): Json<ReportRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    tracing::info!("Received request to generate PDF");
    let report = state.reports.generate(&body).await?;
    tracing::info!("✅ Report available at {}", report.file_url);

    Ok(Json(GenerateResponse {
        message: "PDF generated successfully".to_string(),
        file_url: report.file_url,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
