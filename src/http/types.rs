use std::fmt::Display;

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::todo_service::TodoError;
use crate::domain::todo::ValidationError;

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const TODO_NOT_FOUND: &str = "Todo not found";
pub const INVALID_BODY: &str = "Invalid request body";
const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Success envelope: `{success: true, data, count?}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, data, count: None } }

    pub fn counted(data: T, count: usize) -> Self { Self { success: true, data, count: Some(count) } }
}

/// Failure envelope: `{success: false, error, message?, path?}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub region: String,
    pub table_name: String,
    pub secrets_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
    pub system_total_bytes: u64,
    pub system_used_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub uptime_seconds: u64,
    pub memory_usage: MemoryUsage,
    pub environment: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation { error: String, message: Option<String> },
    NotFound,
    RouteNotFound(String),
    /// `detail` is only populated when errors may be exposed to clients.
    Internal { error: &'static str, detail: Option<String> },
}

impl ApiError {
    pub fn invalid_body(message: impl Display) -> Self {
        ApiError::Validation { error: INVALID_BODY.to_string(), message: Some(message.to_string()) }
    }

    /// Logs `cause` and builds a 500 that carries the cause only when `expose` is set.
    pub fn internal(error: &'static str, cause: impl Display, expose: bool) -> Self {
        tracing::error!(error = %cause, "{error}");
        ApiError::Internal { error, detail: expose.then(|| cause.to_string()) }
    }

    pub fn from_todo(e: TodoError, context: &'static str, expose: bool) -> Self {
        match e {
            TodoError::NotFound(_) => ApiError::NotFound,
            other => ApiError::internal(context, other, expose),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self { ApiError::Validation { error: e.to_string(), message: None } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { error, message } => ErrorBody { success: false, error, message, path: None },
            ApiError::NotFound => ErrorBody { success: false, error: TODO_NOT_FOUND.into(), message: None, path: None },
            ApiError::RouteNotFound(path) => ErrorBody { success: false, error: ROUTE_NOT_FOUND.into(), message: None, path: Some(path) },
            ApiError::Internal { error, detail } => ErrorBody {
                success: false,
                error: error.into(),
                message: Some(detail.unwrap_or_else(|| GENERIC_MESSAGE.into())),
                path: None,
            },
        };
        (status, axum::Json(body)).into_response()
    }
}
