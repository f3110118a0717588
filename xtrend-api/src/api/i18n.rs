//! Locale catalog endpoint

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use xtrend_common::api::ApiEnvelope;
use xtrend_common::models::Locale;

use super::respond;
use crate::session::ClientUpdate;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct I18nQuery {
    pub locale: Option<String>,
}

/// GET /api/i18n?locale=
///
/// Locale comes from the query, then the locale cookie, then the
/// configured default. A locale named in the query is remembered in the
/// locale cookie.
pub async fn get_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<I18nQuery>,
) -> ApiResult<Response> {
    let client = state.store.read(&headers);
    let requested = match query.locale.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(code) => Some(code.parse::<Locale>()?),
        None => None,
    };
    let locale = requested
        .or(client.locale)
        .unwrap_or(state.default_locale);

    let bundle = state
        .catalog
        .bundle(locale)
        .cloned()
        .ok_or_else(|| ApiError::Internal(format!("No catalog loaded for {}", locale)))?;

    let update = ClientUpdate {
        locale: requested.filter(|l| client.locale != Some(*l)),
        ..ClientUpdate::default()
    };
    Ok(respond(ApiEnvelope::new(bundle), state.store.write(&update)))
}

/// Build i18n routes
pub fn i18n_routes() -> Router<AppState> {
    Router::new().route("/api/i18n", get(get_catalog))
}
