//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("xtrend-api")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Active trend backend (`mock`, `xapi`, `mcp`)
    pub data_source: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Last X API failure, when the X API is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
///
/// Bare status object; exempt from the `{code, data}` envelope.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = match &state.x_api {
        Some(x_api) => x_api.last_error().await,
        None => None,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "xtrend-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_source: state.data_source().as_str().to_string(),
        uptime_seconds,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
