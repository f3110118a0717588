//! Trend listing endpoints
//!
//! Guests see the public trends by volume and are not metered. Everyone
//! else spends one fetch per listing and gets a ranking personalized by
//! their saved profile.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use xtrend_common::api::ApiEnvelope;
use xtrend_common::models::Trend;

use super::{parse_flag, parse_limit, respond};
use crate::services::{quota, ranking, FilterOptions};
use crate::session::ClientUpdate;
use crate::{ApiError, ApiResult, AppState};

/// Query parameters for GET /api/trends
///
/// Kept as strings so malformed values produce the envelope error.
#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub refresh: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub trends: Vec<Trend>,
    pub total: usize,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refresh_at: Option<DateTime<Utc>>,
    pub source: String,
}

/// GET /api/trends
///
/// **Errors:**
/// - 400: malformed `limit`
/// - 429: daily fetch limit reached, or forced refresh inside the role's
///   refresh interval
/// - 500: trend source failure
pub async fn list_trends(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TrendsQuery>,
) -> ApiResult<Response> {
    let limit = parse_limit(query.limit.as_deref())?;
    let refresh = parse_flag(query.refresh.as_deref());
    let client = state.store.read(&headers);
    let mut update = ClientUpdate::for_state(&client);
    let source = state.data_source().as_str().to_string();

    if client.identity.is_guest() {
        if refresh {
            debug!(user_id = %client.identity.id, "Ignoring refresh request from guest");
        }
        let all = state.trends.get_all_trends().await?;
        let total = all.iter().filter(|t| t.is_public).count();
        let trends = ranking::get_public_trends(&all, limit);

        let data = TrendsResponse {
            trends,
            total,
            last_updated: state.trends.last_updated().await,
            next_refresh_at: None,
            source,
        };
        return Ok(respond(ApiEnvelope::new(data), state.store.write(&update)));
    }

    let now = Utc::now();
    let info = quota::quota_info(&client.identity, client.usage.clone(), now);
    quota::check_fetch(&info)?;

    let mut usage = info.usage.clone();
    if refresh {
        quota::check_refresh(&info, now)?;
        let trends = state.trends.refresh().await?;
        usage = quota::record_refresh(usage, now);
        info!(
            user_id = %client.identity.id,
            role = %client.identity.role,
            count = trends.len(),
            "Forced trend refresh"
        );
    }

    let trends = state
        .trends
        .get_filtered_trends(
            client.profile.as_ref(),
            FilterOptions {
                limit,
                include_public: true,
            },
        )
        .await?;
    usage = quota::record_fetch(usage, now);

    // Counted from the last forced refresh, or from now when there was none
    let next_refresh_at = quota::next_refresh_at(&info.limits, usage.last_refresh_at.unwrap_or(now))
        .map(|at| at.max(now));

    debug!(
        user_id = %client.identity.id,
        fetch_count = usage.fetch_count,
        returned = trends.len(),
        "Served personalized trends"
    );

    let data = TrendsResponse {
        total: trends.len(),
        trends,
        last_updated: state.trends.last_updated().await,
        next_refresh_at,
        source,
    };
    update.usage = Some(usage);
    Ok(respond(ApiEnvelope::new(data), state.store.write(&update)))
}

/// GET /api/trends/:id
pub async fn get_trend(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiEnvelope<Trend>>> {
    let trend = state
        .trends
        .get_trend_by_id(&id)
        .await?
        .ok_or(ApiError::TrendNotFound(id))?;
    Ok(Json(ApiEnvelope::new(trend)))
}

/// Build trend routes
pub fn trend_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trends", get(list_trends))
        .route("/api/trends/:id", get(get_trend))
}
