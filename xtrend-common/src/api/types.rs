//! Shared API response types
//!
//! Every route answers with the same envelope:
//!
//! - success: `{"success": true, "data": ..., "message"?: ..., "timestamp": ...}`
//! - failure: `{"success": false, "error": {"code", "message", "details"?}, "timestamp": ...}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Error Codes
// ========================================

/// Machine-readable error code carried in the failure envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    TrendNotFound,
    QuotaExceeded,
    InternalError,
    MissingConfig,
    XApiError,
}

impl ErrorCode {
    /// HTTP status code for this error
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::InvalidRequest => 400,
            ErrorCode::TrendNotFound => 404,
            ErrorCode::QuotaExceeded => 429,
            ErrorCode::InternalError | ErrorCode::MissingConfig | ErrorCode::XApiError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::TrendNotFound => "TREND_NOT_FOUND",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::MissingConfig => "MISSING_CONFIG",
            ErrorCode::XApiError => "X_API_ERROR",
        }
    }
}

// ========================================
// Envelopes
// ========================================

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Always `true`
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(data)
        }
    }
}

/// Error details inside the failure envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Failure envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false`
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        let mut envelope = Self::new(code, message);
        envelope.error.details = Some(details);
        envelope
    }
}

// ========================================
// Tests
// ========================================
