// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod pages;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{is_pdf_upload, AskForm, HealthResponse, UNSUPPORTED_FILE_MESSAGE};
pub use http_server::{create_app, start_server, AppState};
pub use pages::render_page;
