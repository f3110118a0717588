//! Error types for xtrend-api
//!
//! Every failure leaves the service as the uniform failure envelope
//! (`{"success": false, "error": {...}, "timestamp"}`).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use xtrend_common::api::{ErrorCode, ErrorEnvelope};

use crate::services::QuotaError;
use crate::sources::SourceError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown trend id (404)
    #[error("Trend not found: {0}")]
    TrendNotFound(String),

    /// Quota or entitlement check failed (429)
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// Upstream trend source failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Direct X API passthrough failed (500)
    #[error("X API error: {0}")]
    XApi(SourceError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// xtrend-common error
    #[error("Common error: {0}")]
    Common(#[from] xtrend_common::Error),
}

fn source_details(err: &SourceError) -> Value {
    let root = err.root();
    json!({
        "kind": root.kind(),
        "retryable": root.is_retryable(),
        "retryAfterMs": err.retry_delay().map(|d| d.as_millis() as u64),
    })
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::InvalidRequest,
            ApiError::TrendNotFound(_) => ErrorCode::TrendNotFound,
            ApiError::Quota(_) => ErrorCode::QuotaExceeded,
            ApiError::Source(SourceError::NotConfigured(_))
            | ApiError::XApi(SourceError::NotConfigured(_)) => ErrorCode::MissingConfig,
            ApiError::XApi(_) => ErrorCode::XApiError,
            ApiError::Source(_) | ApiError::Internal(_) => ErrorCode::InternalError,
            ApiError::Common(xtrend_common::Error::InvalidInput(_)) => ErrorCode::InvalidRequest,
            ApiError::Common(_) => ErrorCode::InternalError,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Quota(err) => Some(err.details()),
            ApiError::Source(err) | ApiError::XApi(err) => Some(source_details(err)),
            _ => None,
        }
    }

    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ApiError::Quota(err) => err.retry_after(Utc::now()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status =
            StatusCode::from_u16(code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = code.as_str(), error = %message, "Request failed");
        } else {
            tracing::debug!(code = code.as_str(), error = %message, "Request rejected");
        }

        let envelope = match self.details() {
            Some(details) => ErrorEnvelope::with_details(code, message, details),
            None => ErrorEnvelope::new(code, message),
        };

        let mut response = (status, Json(envelope)).into_response();
        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
