// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP handlers
//!
//! Form routes always redirect back to `/`; their failures are stored on the
//! session and shown on the next render. The JSON routes return [`ApiError`].

use axum::{
    extract::{Form, Json, State},
    response::{Html, Redirect},
};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::errors::ApiError;
use super::http_server::AppState;
use super::pages::render_page;
use crate::session::{AskError, ChatMessage, SessionSnapshot, SettingsUpdate};
use crate::version::{get_version_info, VERSION_NUMBER};

pub const UNSUPPORTED_FILE_MESSAGE: &str = "Поддерживаются только PDF-файлы";

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub document_loaded: bool,
    pub build: serde_json::Value,
}

/// Accept by extension or by declared content type
pub fn is_pdf_upload(filename: &str, content_type: Option<&str>) -> bool {
    filename.to_lowercase().ends_with(".pdf") || content_type == Some("application/pdf")
}

pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render_page(&session))
}

/// POST /upload, multipart field `file`
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let limit_mb = state.max_upload_mb;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart(e, limit_mb))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::from_multipart(e, limit_mb))?;

        let mut session = state.session.lock().await;
        if !is_pdf_upload(&filename, content_type.as_deref()) {
            info!("Rejected upload '{}' ({:?})", filename, content_type);
            session.set_error(UNSUPPORTED_FILE_MESSAGE);
            return Ok(Redirect::to("/"));
        }

        // Failures are recorded on the session
        if let Err(e) = session.ingest_pdf(&filename, &bytes).await {
            debug!("Upload of '{}' not indexed: {}", filename, e);
        }
        return Ok(Redirect::to("/"));
    }

    Err(ApiError::InvalidRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

pub async fn ask_handler(State(state): State<AppState>, Form(form): Form<AskForm>) -> Redirect {
    let mut session = state.session.lock().await;
    match session.ask(&form.question).await {
        Ok(_) | Err(AskError::EmptyQuestion) => {}
        Err(e) => session.set_error(e.to_string()),
    }
    Redirect::to("/")
}

pub async fn settings_handler(
    State(state): State<AppState>,
    Form(update): Form<SettingsUpdate>,
) -> Redirect {
    state.session.lock().await.update_settings(&update);
    Redirect::to("/")
}

pub async fn clear_handler(State(state): State<AppState>) -> Redirect {
    let report = state.session.lock().await.clear_all().await;
    if !report.active_removed || !report.leftover_removed {
        info!("Some index files could not be removed: {:?}", report);
    }
    Redirect::to("/")
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let document_loaded = state.session.lock().await.is_ready();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION_NUMBER.to_string(),
        document_loaded,
        build: get_version_info(),
    })
}

pub async fn state_handler(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// POST /api/ask with a JSON body, returns the bot reply
pub async fn api_ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskForm>,
) -> Result<Json<ChatMessage>, ApiError> {
    let reply = state.session.lock().await.ask(&request.question).await?;
    Ok(Json(reply))
}
