//! Task generation endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use xtrend_common::api::ApiEnvelope;
use xtrend_common::models::{Locale, Scenario, ScenarioTasks};

use super::{json_body, respond};
use crate::services::{quota, tasks};
use crate::session::ClientUpdate;
use crate::{ApiError, ApiResult, AppState};

/// Request payload for POST /api/tasks
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTasksRequest {
    #[serde(default)]
    pub trend_id: Option<String>,
    /// Defaults to the saved profile's selection, else `[POD]`
    #[serde(default)]
    pub scenarios: Option<Vec<Scenario>>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Trend summary echoed back with the tasks
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateTasksResponse {
    pub trend: TrendSummary,
    pub scenarios: Vec<ScenarioTasks>,
}

/// POST /api/tasks
///
/// **Request:** `{"trendId": "trend-001", "scenarios"?: ["POD"], "locale"?: "en-US"}`
///
/// **Errors:**
/// - 400: missing or blank `trendId`, unknown scenario or locale
/// - 404: unknown trend
/// - 429: scenario selection exceeds what the role allows
pub async fn generate_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateTasksRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = json_body(payload)?;
    let client = state.store.read(&headers);

    let trend_id = request
        .trend_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("trendId is required".to_string()))?
        .to_string();

    let locale = match request.locale.as_deref() {
        Some(code) => code.parse::<Locale>()?,
        None => client.locale.unwrap_or(state.default_locale),
    };

    let scenarios = request
        .scenarios
        .filter(|s| !s.is_empty())
        .or_else(|| client.profile.as_ref().map(|p| p.scenarios.clone()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| vec![Scenario::Pod]);
    quota::check_scenarios(client.identity.role, &scenarios)?;

    let trend = state
        .trends
        .get_trend_by_id(&trend_id)
        .await?
        .ok_or(ApiError::TrendNotFound(trend_id))?;

    let groups = tasks::generate_tasks(&state.catalog, &trend, &scenarios, locale);
    info!(
        trend_id = %trend.id,
        locale = %locale,
        scenarios = groups.len(),
        tasks = groups.iter().map(|g| g.tasks.len()).sum::<usize>(),
        "Generated tasks"
    );

    let data = GenerateTasksResponse {
        trend: TrendSummary {
            id: trend.id,
            name: trend.name,
            display_name: trend.display_name,
        },
        scenarios: groups,
    };
    let update = ClientUpdate::for_state(&client);
    Ok(respond(ApiEnvelope::new(data), state.store.write(&update)))
}

/// Build task routes
pub fn task_routes() -> Router<AppState> {
    Router::new().route("/api/tasks", post(generate_tasks))
}
