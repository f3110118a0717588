//! User profile, quota and session endpoints
//!
//! None of these touch server-side storage: the profile and usage record
//! are read from the request and written back as cookies.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use xtrend_common::api::ApiEnvelope;
use xtrend_common::models::{AgeGroup, Ethnicity, QuotaInfo, Region, Scenario, UserProfile};

use super::{json_body, respond};
use crate::services::quota::{self, QuotaError};
use crate::session::ClientUpdate;
use crate::{ApiError, ApiResult, AppState};

/// Partial profile update; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub region: Option<Region>,
    pub age_group: Option<AgeGroup>,
    pub ethnicity: Option<Ethnicity>,
    pub scenarios: Option<Vec<Scenario>>,
}

/// GET /api/user/profile
///
/// Returns `null` data when no profile has been saved.
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiEnvelope<Option<UserProfile>>> {
    let client = state.store.read(&headers);
    Json(ApiEnvelope::new(client.profile))
}

/// PUT /api/user/profile
///
/// **Errors:**
/// - 400: malformed body, empty scenario list, or more scenarios than
///   the role allows
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = json_body(payload)?;
    let client = state.store.read(&headers);
    let identity = &client.identity;
    let now = Utc::now();

    let mut profile = client
        .profile
        .clone()
        .unwrap_or_else(|| UserProfile::new(identity, now));
    profile.user_id = identity.id.clone();
    profile.role = identity.role;

    if let Some(region) = request.region {
        profile.region = region;
    }
    if let Some(age_group) = request.age_group {
        profile.age_group = age_group;
    }
    if request.ethnicity.is_some() {
        profile.ethnicity = request.ethnicity;
    }
    if let Some(requested) = request.scenarios {
        let mut scenarios: Vec<Scenario> = Vec::with_capacity(requested.len());
        for scenario in requested {
            if !scenarios.contains(&scenario) {
                scenarios.push(scenario);
            }
        }
        if scenarios.is_empty() {
            return Err(ApiError::BadRequest(
                "At least one scenario must be selected".to_string(),
            ));
        }

        let locale = client.locale.unwrap_or(state.default_locale);
        match quota::check_scenarios(identity.role, &scenarios) {
            Ok(()) => {}
            Err(QuotaError::TooManyScenarios { limit, .. }) => {
                let limit = limit.to_string();
                return Err(ApiError::BadRequest(state.catalog.translate(
                    locale,
                    "profile.scenarioLimit",
                    &[("limit", limit.as_str())],
                )));
            }
            Err(QuotaError::ScenarioNotAllowed { scenario, .. }) => {
                let scenario = scenario.to_string();
                return Err(ApiError::BadRequest(state.catalog.translate(
                    locale,
                    "profile.scenarioUnavailable",
                    &[("scenario", scenario.as_str())],
                )));
            }
            Err(other) => return Err(other.into()),
        }
        profile.scenarios = scenarios;
    }
    profile.updated_at = now;

    info!(
        user_id = %profile.user_id,
        region = %profile.region,
        age_group = %profile.age_group,
        scenarios = profile.scenarios.len(),
        "Profile updated"
    );

    let mut update = ClientUpdate::for_state(&client);
    update.profile = Some(profile.clone());
    Ok(respond(ApiEnvelope::new(profile), state.store.write(&update)))
}

/// GET /api/user/quota
pub async fn get_quota(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let client = state.store.read(&headers);
    let info = quota::quota_info(&client.identity, client.usage.clone(), Utc::now());
    let update = ClientUpdate::for_state(&client);
    respond(ApiEnvelope::new(info), state.store.write(&update))
}

/// POST /api/user/copy
///
/// Spends one copy from the daily allowance.
///
/// **Errors:**
/// - 429: daily copy limit reached
pub async fn record_copy(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let client = state.store.read(&headers);
    let now = Utc::now();

    let info = quota::quota_info(&client.identity, client.usage.clone(), now);
    quota::check_copy(&info)?;

    let usage = quota::record_copy(info.usage, now);
    let info: QuotaInfo = quota::quota_info(&client.identity, Some(usage.clone()), now);

    let mut update = ClientUpdate::for_state(&client);
    update.usage = Some(usage);
    Ok(respond(ApiEnvelope::new(info), state.store.write(&update)))
}

/// DELETE /api/user/session
///
/// Expires every client-state cookie.
pub async fn clear_session(State(state): State<AppState>) -> Response {
    respond(
        ApiEnvelope::with_message((), "Session cleared"),
        state.store.clear(),
    )
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/profile", get(get_profile).put(update_profile))
        .route("/api/user/quota", get(get_quota))
        .route("/api/user/copy", post(record_copy))
        .route("/api/user/session", delete(clear_session))
}
