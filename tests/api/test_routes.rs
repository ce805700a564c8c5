// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// HTTP routes exercised through the router without binding a socket

use crate::common::{hash_session, study_notes_pdf};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pdf_chat::api::pages::{PAGE_TITLE, WELCOME_TEXT};
use pdf_chat::api::UNSUPPORTED_FILE_MESSAGE;
use pdf_chat::{create_app, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf-chat-test-boundary";

fn test_app(temp: &TempDir) -> Router {
    create_app(AppState::new(hash_session(temp), 5))
}

fn multipart_upload(filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get_state(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn assert_redirect_home(response: &axum::response::Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn test_index_page_shows_welcome() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(PAGE_TITLE));
    assert!(html.contains(WELCOME_TEXT));
    assert!(html.contains("action=\"/upload\""));
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["document_loaded"], false);
}

#[tokio::test]
async fn test_upload_then_ask() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .clone()
        .oneshot(multipart_upload("notes.pdf", "application/pdf", &study_notes_pdf()))
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    assert_eq!(state["processing_complete"], true);
    assert_eq!(state["pdf_filename"], "notes.pdf");
    assert_eq!(state["stats"]["pages"], 3);
    assert!(state["db_path"].as_str().unwrap().contains("vector_db_"));

    let response = app
        .clone()
        .oneshot(form_post("/ask", "question=mitochondria+ATP"))
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    let history = state["chat_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "mitochondria ATP");
    assert_eq!(history[1]["role"], "bot");

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("stats-grid"));
    assert!(html.contains("user-message-content"));
    assert!(!html.contains(WELCOME_TEXT));
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .clone()
        .oneshot(multipart_upload("notes.txt", "text/plain", b"plain text"))
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    assert_eq!(state["processing_complete"], false);
    assert_eq!(state["error_message"], UNSUPPORTED_FILE_MESSAGE);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let temp = TempDir::new().unwrap();
    let app = create_app(AppState::new(hash_session(&temp), 1));

    let oversized = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .clone()
        .oneshot(multipart_upload("big.pdf", "application/pdf", &oversized))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error_type"], "payload_too_large");
    assert_eq!(json["details"]["limit_mb"], 1);

    let state = get_state(&app).await;
    assert_eq!(state["processing_complete"], false);
}

#[test]
fn test_upload_limit_saturates() {
    let temp = TempDir::new().unwrap();
    let state = AppState::new(hash_session(&temp), usize::MAX);
    assert_eq!(state.max_upload_bytes(), usize::MAX);
    let _app = create_app(state);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_ask_without_document_sets_error() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .clone()
        .oneshot(form_post("/ask", "question=hello"))
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    assert_eq!(state["error_message"], "Сначала загрузите PDF-файл");
    assert!(state["chat_history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_json_ask_without_document() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let request = Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"question": "hello"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error_type"], "no_document");
}

#[tokio::test]
async fn test_json_ask_returns_reply() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);
    app.clone()
        .oneshot(multipart_upload("notes.pdf", "application/pdf", &study_notes_pdf()))
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"question": "consuls senate"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["role"], "bot");
    assert!(json["time"].as_str().unwrap().contains(':'));
}

#[tokio::test]
async fn test_settings_are_clamped() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);

    let response = app
        .clone()
        .oneshot(form_post("/settings", "k_results=10&min_relevance=0.35&chunk_size=50"))
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    assert_eq!(state["settings"]["k_results"], 5);
    assert_eq!(state["settings"]["chunk_size"], 100);
    assert_eq!(state["settings"]["chunk_overlap"], 30);
    let min = state["settings"]["min_relevance"].as_f64().unwrap();
    assert!((min - 0.35).abs() < 1e-6);
}

#[tokio::test]
async fn test_clear_resets_state() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp);
    app.clone()
        .oneshot(multipart_upload("notes.pdf", "application/pdf", &study_notes_pdf()))
        .await
        .unwrap();
    let db_path = get_state(&app).await["db_path"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_redirect_home(&response);

    let state = get_state(&app).await;
    assert_eq!(state["processing_complete"], false);
    assert!(state["pdf_filename"].is_null());
    assert!(state["stats"].is_null());
    assert!(!std::path::Path::new(&db_path).exists());
}
