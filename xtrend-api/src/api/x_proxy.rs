//! Direct X API passthrough
//!
//! Bypasses the trend cache and ranking: one region, fetched live,
//! normalized and returned as-is. Shares rate-limit bookkeeping with the
//! X API trend source when both are active.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use xtrend_common::api::ApiEnvelope;
use xtrend_common::models::trend::GLOBAL_REGION;
use xtrend_common::models::Trend;

use crate::sources::{normalize::normalize_all, RawTrend, SourceError};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct XProxyQuery {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XProxyResponse {
    pub trends: Vec<Trend>,
    pub total: usize,
    /// Always `"x-api"`
    pub source: &'static str,
    pub region: String,
    pub last_updated: DateTime<Utc>,
}

/// GET /api/x-proxy?region=
///
/// **Errors:**
/// - 500 MISSING_CONFIG: no bearer token configured
/// - 500 X_API_ERROR: upstream request failed after retries
pub async fn proxy_trends(
    State(state): State<AppState>,
    Query(query): Query<XProxyQuery>,
) -> ApiResult<Json<ApiEnvelope<XProxyResponse>>> {
    let x_api = state
        .x_api
        .as_ref()
        .ok_or_else(|| SourceError::NotConfigured("X API bearer token".to_string()))?;

    let requested = query
        .region
        .as_deref()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| GLOBAL_REGION.to_string());
    let region = if x_api.supported_regions().iter().any(|r| *r == requested) {
        requested
    } else {
        GLOBAL_REGION.to_string()
    };

    let raw = x_api.get_region_trends(&region).await.map_err(ApiError::XApi)?;
    let fetched_at = Utc::now();
    let trends = normalize_all(
        raw.into_iter()
            .map(|trend| RawTrend::XApi {
                trend,
                region: region.clone(),
            })
            .collect(),
        fetched_at,
    );
    info!(region = %region, count = trends.len(), "Proxied X API trends");

    Ok(Json(ApiEnvelope::new(XProxyResponse {
        total: trends.len(),
        trends,
        source: "x-api",
        region,
        last_updated: fetched_at,
    })))
}

/// Build X API proxy routes
pub fn x_proxy_routes() -> Router<AppState> {
    Router::new().route("/api/x-proxy", get(proxy_trends))
}
