//! HTTP surface: report upload, symptom lookup and per-user report history.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::analysis::Analyzer;
use crate::classify::Reading;
use crate::extract::{DocumentKind, TextExtractor};
use crate::store::{Authenticator, ReportRecord, ReportStore, UserId};

/// Multipart field carrying the uploaded report.
pub const REPORT_FIELD: &str = "report-file";

pub struct AppState {
    pub analyzer: Analyzer,
    pub extractor: TextExtractor,
    pub store: Arc<dyn ReportStore>,
    pub auth: Arc<dyn Authenticator>,
    pub upload_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("unsupported file type: {0}")]
    UnsupportedMediaType(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let error = match &self {
            ApiError::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub analysis: Vec<Reading>,
    pub doctor_recommendation: String,
    pub file_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SymptomsRequest {
    #[serde(default)]
    pub symptoms: String,
}

#[derive(Debug, Serialize)]
pub struct SymptomsResponse {
    pub recommended_tests: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    parameters: usize,
    ocr: bool,
}

pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload-report", post(upload_report))
        .route("/recommend-tests", post(recommend_tests))
        .route("/reports", get(list_reports))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        parameters: state.analyzer.knowledge().ranges.len(),
        ocr: state.extractor.has_ocr(),
    })
}

/// `None` when no bearer token was sent, `Unauthorized` when it is unknown.
fn caller(state: &AppState, headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    state
        .auth
        .authenticate(token.trim())
        .map(Some)
        .ok_or(ApiError::Unauthorized)
}

async fn upload_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let user = caller(&state, &headers)?;

    // Find the report field and read its data
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("failed to read form field", e))?
    {
        if field.name() != Some(REPORT_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("failed to read file data", e))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| ApiError::BadRequest("no file part".to_string()))?;
    if filename.is_empty() {
        return Err(ApiError::BadRequest("no selected file".to_string()));
    }
    let kind = DocumentKind::from_filename(&filename)
        .map_err(|_| ApiError::UnsupportedMediaType(filename.clone()))?;

    // Calculate SHA-256 hash
    let file_hash = format!("{:x}", Sha256::digest(&data));
    tracing::info!(%filename, kind = kind.as_str(), bytes = data.len(), %file_hash, "report uploaded");

    // Create a temporary file; unique per upload, removed when dropped
    let temp_file = tempfile::Builder::new()
        .prefix("report-")
        .suffix(&extension_suffix(&filename))
        .tempfile_in(&state.upload_dir)
        .map_err(|e| ApiError::Internal(format!("failed to create upload file: {e}")))?;
    // Write the data to the temporary file
    std::io::Write::write_all(&mut temp_file.as_file(), &data)
        .map_err(|e| ApiError::Internal(format!("failed to write upload file: {e}")))?;

    // Extract text and analyze on a blocking thread
    let worker = Arc::clone(&state);
    let analysis = tokio::task::spawn_blocking(move || {
        let text = worker.extractor.extract(temp_file.path(), kind);
        worker.analyzer.analyze(&text)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))?;

    tracing::info!(
        %filename,
        matched = analysis.readings.len(),
        abnormal = analysis.abnormal().count(),
        "report analyzed"
    );

    // Keep a summary for authenticated callers
    let report_id = user.map(|user| {
        let record = ReportRecord::new(user, filename, file_hash.clone(), &analysis);
        let id = record.id;
        state.store.store_report(record);
        id
    });

    Ok(Json(UploadResponse {
        doctor_recommendation: analysis.recommendation.to_string(),
        analysis: analysis.readings,
        file_hash,
        report_id,
    }))
}

/// Body limit overruns map to 413, any other malformed form to 400.
fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    let message = format!("{context}: {}", e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

async fn recommend_tests(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SymptomsRequest>,
) -> Json<SymptomsResponse> {
    let recommended_tests = state.analyzer.recommend_tests(&request.symptoms);
    tracing::debug!(count = recommended_tests.len(), "tests recommended");
    Json(SymptomsResponse { recommended_tests })
}

async fn list_reports(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReportRecord>>, ApiError> {
    let user = caller(&state, &headers)?.ok_or(ApiError::Unauthorized)?;
    Ok(Json(state.store.list_reports(&user)))
}
