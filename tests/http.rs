use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use labreport::store::{MemoryReportStore, StaticTokens};
use labreport::web::{self, AppState};
use labreport::{Analyzer, KnowledgeBase, TextExtractor, ALL_NORMAL};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "labreport-test-boundary";

fn app(upload_dir: &std::path::Path) -> Router {
    app_with_limit(upload_dir, 1024 * 1024)
}

fn app_with_limit(upload_dir: &std::path::Path, body_limit: usize) -> Router {
    let state = Arc::new(AppState {
        analyzer: Analyzer::new(KnowledgeBase::builtin()).unwrap(),
        extractor: TextExtractor::without_ocr(),
        store: Arc::new(MemoryReportStore::new()),
        auth: Arc::new(StaticTokens::parse("secret=alice")),
        upload_dir: upload_dir.to_path_buf(),
    });
    web::router(state, body_limit)
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, filename: &str, content: &[u8], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload-report")
        .header("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(t) = token {
        builder = builder.header("Authorization", format!("Bearer {t}"));
    }
    builder.body(Body::from(multipart_body(field, filename, content))).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_analyzes_plain_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "labs.txt", b"Hemoglobin: 10.2\nWBC 12000", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let analysis = body["analysis"].as_array().unwrap();
    assert_eq!(analysis.len(), 2);
    assert_eq!(analysis[0]["parameter"], "hemoglobin");
    assert_eq!(analysis[0]["value"], 10.2);
    assert_eq!(analysis[0]["status"], "Abnormal");
    assert_eq!(analysis[1]["parameter"], "wbc");
    assert_eq!(analysis[1]["unit"], "cells/mcL");
    assert_eq!(body["doctor_recommendation"], "Consult: Hematologist.");
    assert_eq!(body["file_hash"].as_str().unwrap().len(), 64);
    assert!(body.get("report_id").is_none());
}

#[tokio::test]
async fn upload_without_known_parameters_returns_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "notes.txt", b"nothing to see here", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["analysis"], json!([]));
    assert_eq!(body["doctor_recommendation"], ALL_NORMAL);
}

#[tokio::test]
async fn corrupt_document_degrades_to_empty_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "scan.pdf", b"%PDF-garbage", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["doctor_recommendation"], ALL_NORMAL);
}

#[tokio::test]
async fn upload_file_is_removed_after_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "labs.txt", b"glucose 90", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("attachment", "labs.txt", b"glucose 90", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "no file part");
}

#[tokio::test]
async fn empty_filename_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "", b"glucose 90", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "labs.xlsx", b"glucose 90", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let content = "glucose 90\n".repeat(1024);
    let response = app_with_limit(dir.path(), 4 * 1024)
        .oneshot(upload_request("report-file", "labs.txt", content.as_bytes(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(upload_request("report-file", "labs.txt", b"glucose 90", Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_uploads_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let response = app
        .clone()
        .oneshot(upload_request("report-file", "labs.txt", b"ldl 170 hdl 50", Some("secret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let upload = json_body(response).await;
    assert!(upload["report_id"].is_string());

    let request = Request::builder()
        .uri("/reports")
        .header("Authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = json_body(response).await;
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], upload["report_id"]);
    assert_eq!(reports[0]["user"], "alice");
    assert_eq!(reports[0]["filename"], "labs.txt");
    assert_eq!(reports[0]["abnormal_parameters"], json!(["ldl"]));
    assert_eq!(
        reports[0]["recommendation"],
        "Consult: Cardiologist, Endocrinologist."
    );
}

#[tokio::test]
async fn report_listing_requires_auth() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/reports").body(Body::empty()).unwrap();
    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recommend_tests_unions_matches() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/recommend-tests")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"symptoms": "I have Fatigue and joint pain"}).to_string()))
        .unwrap();
    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let tests: Vec<&str> = body["recommended_tests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(tests.len(), 6);
    assert!(tests.contains(&"Thyroid Function Test"));
    assert!(tests.contains(&"Uric Acid Test"));
}

#[tokio::test]
async fn recommend_tests_without_symptoms_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/recommend-tests")
        .header("Content-Type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["recommended_tests"], json!([]));
}

#[tokio::test]
async fn health_reports_table_size() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["parameters"], 24);
    assert_eq!(body["ocr"], false);
}
