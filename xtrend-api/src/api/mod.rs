//! HTTP API handlers for xtrend-api
//!
//! Every handler answers with the uniform envelope from
//! [`xtrend_common::api`]. Client state changes ride back on the same
//! response as `Set-Cookie` headers.

pub mod health;
pub mod i18n;
pub mod tasks;
pub mod trends;
pub mod user;
pub mod x_proxy;

pub use health::health_routes;
pub use i18n::i18n_routes;
pub use tasks::task_routes;
pub use trends::trend_routes;
pub use user::user_routes;
pub use x_proxy::x_proxy_routes;

use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use xtrend_common::api::ApiEnvelope;

use crate::{ApiError, ApiResult};

/// Default number of trends per listing
pub const DEFAULT_LIMIT: usize = 10;

/// Largest accepted `limit` query value
pub const MAX_LIMIT: usize = 100;

/// Envelope response carrying `Set-Cookie` headers
pub(crate) fn respond<T: Serialize>(envelope: ApiEnvelope<T>, cookies: Vec<HeaderValue>) -> Response {
    let mut response = Json(envelope).into_response();
    let headers = response.headers_mut();
    for cookie in cookies {
        headers.append(SET_COOKIE, cookie);
    }
    response
}

/// Unwrap a JSON body, turning extractor rejections into envelope errors
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// `limit` query value: absent means [`DEFAULT_LIMIT`], capped at [`MAX_LIMIT`]
pub(crate) fn parse_limit(raw: Option<&str>) -> ApiResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(ApiError::BadRequest(format!(
            "limit must be a positive integer, got '{}'",
            raw
        ))),
        Ok(limit) => Ok(limit.min(MAX_LIMIT)),
    }
}

/// Boolean query flag; `true` and `1` are set, anything else is not
pub(crate) fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("true") | Some("1"))
}
