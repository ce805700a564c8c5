// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{
    api_ask_handler, ask_handler, clear_handler, health_handler, index_handler, settings_handler,
    state_handler, upload_handler,
};
use crate::config::AppConfig;
use crate::embeddings::Embedder;
use crate::session::Session;

/// Shared state: the one chat session, locked for the duration of each request
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub max_upload_mb: usize,
}

impl AppState {
    pub fn new(session: Session, max_upload_mb: usize) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            max_upload_mb,
        }
    }

    /// Request body limit; saturates for absurd MB values
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes();

    Router::new()
        // Page and form actions
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/ask", post(ask_handler))
        .route("/settings", post(settings_handler))
        .route("/clear", post(clear_handler))
        // JSON endpoints
        .route("/health", get(health_handler))
        .route("/api/state", get(state_handler))
        .route("/api/ask", post(api_ask_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: &AppConfig, embedder: Arc<dyn Embedder>) -> Result<()> {
    info!("Embedding model: {}", embedder.model_name());

    let session = Session::new(embedder, config.session_config());
    let app = create_app(AppState::new(session, config.max_upload_mb));

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("PDF chat listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
