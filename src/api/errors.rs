// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON error body. `error` carries the short client-facing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidData { field: String, message: String },
    TestNotFound { position: String },
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            ApiError::InvalidData { field, message } => ErrorResponse {
                error: "Invalid data".to_string(),
                field: Some(field.clone()),
                message: Some(message.clone()),
            },
            ApiError::TestNotFound { position } => ErrorResponse {
                error: "Test not found".to_string(),
                field: None,
                message: Some(format!("No test at position {}", position)),
            },
            ApiError::ServiceUnavailable(msg) => ErrorResponse {
                error: "Service unavailable".to_string(),
                field: None,
                message: Some(msg.clone()),
            },
            ApiError::InternalError(msg) => ErrorResponse {
                error: "Internal error".to_string(),
                field: None,
                message: Some(msg.clone()),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidData { .. } => StatusCode::BAD_REQUEST,
            ApiError::TestNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput { field, message } => ApiError::InvalidData { field, message },
            StoreError::NotFound { position, .. } => ApiError::TestNotFound {
                position: position.to_string(),
            },
            StoreError::Closed => ApiError::ServiceUnavailable("Record store is closed".to_string()),
            other => {
                tracing::error!("❌ Store failure [{}]: {}", other.error_code(), other);
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidData { field, message } => {
                write!(f, "Invalid data for {}: {}", field, message)
            }
            ApiError::TestNotFound { position } => write!(f, "Test not found: {}", position),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
