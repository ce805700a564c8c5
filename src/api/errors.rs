// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::multipart::MultipartError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::session::AskError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    UnsupportedFile { filename: String },
    PayloadTooLarge { limit_mb: usize },
    NoDocument,
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, details) = match self {
            ApiError::InvalidRequest(_) => ("invalid_request", None),
            ApiError::ValidationError { field, .. } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", Some(details))
            }
            ApiError::UnsupportedFile { filename } => {
                let mut details = HashMap::new();
                details.insert(
                    "filename".to_string(),
                    serde_json::Value::String(filename.clone()),
                );
                ("unsupported_file", Some(details))
            }
            ApiError::PayloadTooLarge { limit_mb } => {
                let mut details = HashMap::new();
                details.insert(
                    "limit_mb".to_string(),
                    serde_json::Value::Number((*limit_mb).into()),
                );
                ("payload_too_large", Some(details))
            }
            ApiError::NoDocument => ("no_document", None),
            ApiError::InternalError(_) => ("internal_error", None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message: self.to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::UnsupportedFile { .. } => 415,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::NoDocument => 409,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn from_multipart(error: MultipartError, limit_mb: usize) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge { limit_mb }
        } else {
            ApiError::InvalidRequest(error.body_text())
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::UnsupportedFile { filename } => {
                write!(f, "Only PDF files are accepted, got '{}'", filename)
            }
            ApiError::PayloadTooLarge { limit_mb } => {
                write!(f, "Upload exceeds the {} MB limit", limit_mb)
            }
            ApiError::NoDocument => write!(f, "No document loaded"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AskError> for ApiError {
    fn from(error: AskError) -> Self {
        match error {
            AskError::EmptyQuestion => ApiError::ValidationError {
                field: "question".to_string(),
                message: error.to_string(),
            },
            AskError::NoDocument => ApiError::NoDocument,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
