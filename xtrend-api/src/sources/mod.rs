//! Trend data sources
//!
//! Every backend (embedded mock fixture, X API, MCP service) implements
//! [`TrendSource`] and yields [`RawTrend`] records tagged with the backend
//! that produced them. Normalization into the canonical
//! [`Trend`](xtrend_common::models::Trend) happens in [`normalize`].
//!
//! **Error handling:** all backends report [`SourceError`]. Whether an error
//! is worth retrying, and how long the upstream asked us to wait, is decided
//! by the error itself so the retry helper stays backend-agnostic.

pub mod mcp;
pub mod mock;
pub mod normalize;
pub mod retry;
pub mod x_api;

pub use mcp::{McpSource, McpTrend};
pub use mock::{MockSource, MockTrend};
pub use retry::{with_retry, with_timeout, RetryPolicy};
pub use x_api::{RateLimitStatus, XApiSource, XApiTrend};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use xtrend_common::config::ServiceConfig;

/// Backend identifier
pub use xtrend_common::config::DataSourceKind as SourceKind;

/// Default wait when a 429 carries no `retry-after` header
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(900);

// ============================================================================
// Errors
// ============================================================================

/// Failure talking to a trend backend
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("authentication failed (HTTP {status})")]
    AuthFailed { status: u16 },

    #[error("rate limited, retry after {} s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Refused locally without contacting the backend
    #[error("rate limit window exhausted, retry after {} s", .retry_after.as_secs())]
    WindowExhausted { retry_after: Duration },

    #[error("upstream server error (HTTP {status})")]
    ServerError { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("unexpected HTTP status {status}")]
    Unexpected { status: u16 },

    #[error("{context} failed after {attempts} attempts: {last}")]
    Exhausted {
        context: String,
        attempts: u32,
        last: Box<SourceError>,
    },
}

impl SourceError {
    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::RateLimited { .. }
                | SourceError::ServerError { .. }
                | SourceError::Network(_)
                | SourceError::Timeout(_)
        )
    }

    /// How long the caller should wait before trying again, if known
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            SourceError::RateLimited { retry_after }
            | SourceError::WindowExhausted { retry_after } => Some(*retry_after),
            SourceError::ServerError { .. } => Some(Duration::from_secs(60)),
            SourceError::Network(_) | SourceError::Timeout(_) => Some(Duration::from_secs(5)),
            SourceError::Exhausted { last, .. } => last.retry_delay(),
            _ => None,
        }
    }

    /// Stable short name used in logs and error details
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::NotConfigured(_) => "not_configured",
            SourceError::AuthFailed { .. } => "auth_failed",
            SourceError::RateLimited { .. } => "rate_limited",
            SourceError::WindowExhausted { .. } => "window_exhausted",
            SourceError::ServerError { .. } => "server_error",
            SourceError::Network(_) => "network",
            SourceError::Timeout(_) => "timeout",
            SourceError::NotFound(_) => "not_found",
            SourceError::BadRequest(_) => "bad_request",
            SourceError::Parse(_) => "parse",
            SourceError::Unexpected { .. } => "unexpected",
            SourceError::Exhausted { .. } => "exhausted",
        }
    }

    /// Innermost error after unwrapping retry exhaustion
    pub fn root(&self) -> &SourceError {
        match self {
            SourceError::Exhausted { last, .. } => last.root(),
            other => other,
        }
    }

    /// Map an HTTP status to an error; `None` for 200 and 204
    ///
    /// `retry_after` is the raw `retry-after` header (seconds).
    pub fn classify_status(status: u16, retry_after: Option<&str>) -> Option<SourceError> {
        match status {
            200 | 204 => None,
            400 => Some(SourceError::BadRequest(format!("HTTP {}", status))),
            401 | 403 => Some(SourceError::AuthFailed { status }),
            404 => Some(SourceError::NotFound(format!("HTTP {}", status))),
            429 => {
                let retry_after = retry_after
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
                Some(SourceError::RateLimited { retry_after })
            }
            500 | 502 | 503 | 504 => Some(SourceError::ServerError { status }),
            _ => Some(SourceError::Unexpected { status }),
        }
    }

    /// Classify a transport failure from reqwest
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout)
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

// ============================================================================
// Raw records
// ============================================================================

/// Record as produced by one backend, before normalization
///
/// The variant is chosen by the source that built the record.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTrend {
    Mock(MockTrend),
    XApi { trend: XApiTrend, region: String },
    Mcp(McpTrend),
}

// ============================================================================
// Source contract
// ============================================================================

/// Common contract over all trend backends
#[async_trait]
pub trait TrendSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Full trend list
    async fn get_trends(&self) -> Result<Vec<RawTrend>, SourceError>;

    /// Trends relevant to one region code
    async fn get_trends_by_region(&self, region: &str) -> Result<Vec<RawTrend>, SourceError>;

    /// Trends the backend marks public
    async fn get_public_trends(&self) -> Result<Vec<RawTrend>, SourceError> {
        Ok(self
            .get_trends()
            .await?
            .into_iter()
            .filter(RawTrend::is_public)
            .collect())
    }

    /// Single trend by its normalized id
    async fn get_trend_by_id(&self, id: &str) -> Result<Option<RawTrend>, SourceError> {
        Ok(self.get_trends().await?.into_iter().find(|t| t.id() == id))
    }
}

/// Build the source selected by configuration
pub fn create_source(config: &ServiceConfig) -> Result<Arc<dyn TrendSource>, SourceError> {
    let kind = config.data_source_kind();
    let policy = RetryPolicy::from_config(&config.retry);

    let source: Arc<dyn TrendSource> = match kind {
        SourceKind::Mock => Arc::new(MockSource::new(Duration::from_millis(
            config.mock.latency_ms,
        ))?),
        SourceKind::XApi => Arc::new(XApiSource::from_config(&config.x_api, policy)?),
        SourceKind::Mcp => Arc::new(McpSource::new(config.mcp.server_url.as_deref(), policy)?),
    };

    info!(data_source = %kind, "Trend source initialized");
    Ok(source)
}
