//! Integration tests for xtrend-api HTTP endpoints
//!
//! Drives the full router over the embedded mock trend fixture.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use xtrend_common::config::ServiceConfig;

use xtrend_api::sources::MockSource;
use xtrend_api::{build_router, AppState};

/// Test helper: router over the mock source with no latency
fn create_test_app() -> axum::Router {
    let config = ServiceConfig::default();
    let source = Arc::new(MockSource::new(Duration::ZERO).expect("fixture parses"));
    let state = AppState::new(source, None, &config).expect("state builds");
    build_router(state)
}

async fn send(request: Request<Body>) -> Response {
    create_test_app().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Cookie header for a user with `role` and an optional usage record
fn user_cookie(role: &str, usage: Option<Value>) -> String {
    let mut cookie = format!("xtrendai_user_id=user-test; xtrendai_user_role={}", role);
    if let Some(usage) = usage {
        cookie.push_str(&format!(
            "; xtrendai_user_usage={}",
            urlencoding::encode(&usage.to_string())
        ));
    }
    cookie
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "xtrend-api");
    assert_eq!(json["dataSource"], "mock");
    assert!(json["uptimeSeconds"].is_u64());
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_guest_sees_public_trends_and_gets_identity() {
    let response = send(get("/api/trends", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("xtrendai_user_id=user-")));
    assert!(cookies.iter().any(|c| c.starts_with("xtrendai_user_role=guest")));
    assert!(!cookies.iter().any(|c| c.starts_with("xtrendai_user_usage=")));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let trends = json["data"]["trends"].as_array().unwrap();
    assert_eq!(trends.len(), 5);
    assert_eq!(json["data"]["total"], 5);
    assert_eq!(json["data"]["source"], "mock");
    assert!(json["data"].get("nextRefreshAt").is_none());
    assert!(trends.iter().all(|t| t["isPublic"] == true));

    let volumes: Vec<u64> = trends.iter().map(|t| t["volume"].as_u64().unwrap()).collect();
    assert!(volumes.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_guest_limit_applies() {
    let response = send(get("/api/trends?limit=2", None)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["trends"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["total"], 5);
}

#[tokio::test]
async fn test_invalid_limit_is_bad_request() {
    let response = send(get("/api/trends?limit=abc", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_free_user_fetch_is_counted() {
    let response = send(get("/api/trends", Some(&user_cookie("free", None)))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let usage = cookies
        .iter()
        .find(|c| c.starts_with("xtrendai_user_usage="))
        .expect("usage cookie written");
    let encoded = usage
        .trim_start_matches("xtrendai_user_usage=")
        .split(';')
        .next()
        .unwrap();
    let usage: Value = serde_json::from_str(&urlencoding::decode(encoded).unwrap()).unwrap();
    assert_eq!(usage["fetchCount"], 1);

    // Known identity is not re-issued
    assert!(!cookies.iter().any(|c| c.starts_with("xtrendai_user_id=")));

    let json = body_json(response).await;
    let trends = json["data"]["trends"].as_array().unwrap();
    assert_eq!(trends.len(), 10);
    assert!(json["data"]["nextRefreshAt"].is_string());

    // Public block comes first
    let first_private = trends.iter().position(|t| t["isPublic"] == false).unwrap();
    assert!(trends[first_private..].iter().all(|t| t["isPublic"] == false));
}

#[tokio::test]
async fn test_profile_region_filters_personalized_trends() {
    let profile = json!({
        "userId": "user-test",
        "role": "free",
        "region": "cn",
        "ageGroup": "25-34",
        "scenarios": ["POD"],
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    });
    let cookie = format!(
        "{}; xtrendai_user_profile={}",
        user_cookie("free", None),
        urlencoding::encode(&profile.to_string())
    );

    let json = body_json(send(get("/api/trends", Some(&cookie))).await).await;
    let trends = json["data"]["trends"].as_array().unwrap();
    assert!(!trends.is_empty());
    assert!(trends.iter().all(|t| {
        let regions = t["regions"].as_array().unwrap();
        regions.iter().any(|r| r == "cn" || r == "global")
    }));
    assert!(trends.iter().any(|t| t["id"] == "trend-003"));
}

#[tokio::test]
async fn test_fetch_quota_exhausted() {
    let usage = json!({ "date": today(), "fetchCount": 10, "copyCount": 0 });
    let response = send(get("/api/trends", Some(&user_cookie("free", Some(usage))))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "QUOTA_EXCEEDED");
    assert_eq!(json["error"]["details"]["limit"], 10);
    assert_eq!(json["error"]["details"]["used"], 10);
    assert!(json["error"]["details"]["resetsAt"].is_string());
}

#[tokio::test]
async fn test_yesterdays_usage_does_not_count() {
    let yesterday = (Utc::now() - ChronoDuration::days(1)).date_naive().to_string();
    let usage = json!({ "date": yesterday, "fetchCount": 10, "copyCount": 20 });
    let response = send(get("/api/trends", Some(&user_cookie("free", Some(usage))))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pro_user_is_not_metered() {
    let usage = json!({ "date": today(), "fetchCount": 500 });
    let response = send(get("/api/trends", Some(&user_cookie("pro", Some(usage))))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_inside_interval_is_rejected() {
    let last = (Utc::now() - ChronoDuration::minutes(10)).to_rfc3339();
    let usage = json!({ "date": today(), "fetchCount": 1, "lastRefreshAt": last });
    let response = send(get(
        "/api/trends?refresh=true",
        Some(&user_cookie("free", Some(usage))),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "QUOTA_EXCEEDED");
    assert_eq!(json["error"]["details"]["refreshInterval"], 60);
    assert!(json["error"]["details"]["nextRefreshAt"].is_string());
}

#[tokio::test]
async fn test_refresh_allowed_for_admin() {
    let last = Utc::now().to_rfc3339();
    let usage = json!({ "date": today(), "lastRefreshAt": last });
    let response = send(get(
        "/api/trends?refresh=1",
        Some(&user_cookie("admin", Some(usage))),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"].get("nextRefreshAt").is_none());
    assert!(json["data"]["lastUpdated"].is_string());
}

#[tokio::test]
async fn test_get_trend_by_id() {
    let response = send(get("/api/trends/trend-001", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], "trend-001");

    let response = send(get("/api/trends/trend-999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "TREND_NOT_FOUND");
}

#[tokio::test]
async fn test_tasks_require_trend_id() {
    let response = send(with_json("POST", "/api/tasks", None, json!({ "trendId": "  " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_REQUEST");

    let response = send(with_json("POST", "/api/tasks", None, json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tasks_malformed_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_tasks_unknown_trend() {
    let response = send(with_json(
        "POST",
        "/api/tasks",
        None,
        json!({ "trendId": "trend-999" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tasks_default_to_pod() {
    let response = send(with_json(
        "POST",
        "/api/tasks",
        None,
        json!({ "trendId": "trend-001", "locale": "en-US" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["trend"]["id"], "trend-001");
    let scenarios = json["data"]["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 1);
    assert_eq!(scenarios[0]["scenario"], "POD");

    let tasks = scenarios[0]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|t| t["trendId"] == "trend-001"));
    assert!(tasks
        .iter()
        .all(|t| t["id"].as_str().unwrap().starts_with("task-trend-001-")));
}

#[tokio::test]
async fn test_tasks_for_pro_user_in_request_order() {
    let response = send(with_json(
        "POST",
        "/api/tasks",
        Some(&user_cookie("pro", None)),
        json!({ "trendId": "trend-002", "scenarios": ["MARKETING", "CONTENT"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let scenarios = json["data"]["scenarios"].as_array().unwrap();
    assert_eq!(scenarios[0]["scenario"], "MARKETING");
    assert_eq!(scenarios[0]["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(scenarios[1]["scenario"], "CONTENT");
    assert_eq!(scenarios[1]["tasks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_guest_cannot_pick_content_scenario() {
    let response = send(with_json(
        "POST",
        "/api/tasks",
        None,
        json!({ "trendId": "trend-001", "scenarios": ["CONTENT"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "QUOTA_EXCEEDED");
    assert_eq!(json["error"]["details"]["scenario"], "CONTENT");
}

#[tokio::test]
async fn test_profile_round_trip() {
    let cookie = user_cookie("free", None);

    let response = send(get("/api/user/profile", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());

    let response = send(with_json(
        "PUT",
        "/api/user/profile",
        Some(&cookie),
        json!({ "region": "jp", "ageGroup": "18-24", "scenarios": ["POD", "CONTENT"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile_cookie = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("xtrendai_user_profile="))
        .expect("profile cookie written");
    let pair = profile_cookie.split(';').next().unwrap().to_string();

    let json = body_json(response).await;
    assert_eq!(json["data"]["userId"], "user-test");
    assert_eq!(json["data"]["region"], "jp");
    assert_eq!(json["data"]["scenarios"], json!(["POD", "CONTENT"]));

    // Reading back through the written cookie
    let cookie = format!("{}; {}", cookie, pair);
    let json = body_json(send(get("/api/user/profile", Some(&cookie))).await).await;
    assert_eq!(json["data"]["region"], "jp");
    assert_eq!(json["data"]["ageGroup"], "18-24");

    // Partial update keeps the other fields and createdAt
    let created_at = json["data"]["createdAt"].clone();
    let response = send(with_json(
        "PUT",
        "/api/user/profile",
        Some(&cookie),
        json!({ "ageGroup": "45+" }),
    ))
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["region"], "jp");
    assert_eq!(json["data"]["ageGroup"], "45+");
    assert_eq!(json["data"]["createdAt"], created_at);
}

#[tokio::test]
async fn test_profile_scenario_count_is_validated() {
    let response = send(with_json(
        "PUT",
        "/api/user/profile",
        Some(&format!("{}; xtrendai_locale=en-US", user_cookie("free", None))),
        json!({ "scenarios": ["POD", "CONTENT", "MARKETING"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("up to 2 scenarios"));
}

#[tokio::test]
async fn test_profile_rejects_scenario_outside_role() {
    let response = send(with_json(
        "PUT",
        "/api/user/profile",
        Some(&format!("{}; xtrendai_locale=en-US", user_cookie("free", None))),
        json!({ "scenarios": ["DEVELOPMENT"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("xtrendai_user_profile=")));

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("DEVELOPMENT"));

    let response = send(with_json(
        "PUT",
        "/api/user/profile",
        Some(&user_cookie("pro", None)),
        json!({ "scenarios": ["DEVELOPMENT"] }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["scenarios"], json!(["DEVELOPMENT"]));
}

#[tokio::test]
async fn test_quota_info() {
    let usage = json!({ "date": today(), "fetchCount": 3, "copyCount": 4 });
    let response = send(get("/api/user/quota", Some(&user_cookie("free", Some(usage))))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["role"], "free");
    assert_eq!(json["data"]["limits"]["dailyFetch"], 10);
    assert_eq!(json["data"]["limits"]["dailyCopy"], 20);
    assert_eq!(json["data"]["usage"]["fetchCount"], 3);
    assert!(json["data"]["resetsAt"].is_string());

    let json = body_json(send(get("/api/user/quota", Some(&user_cookie("pro", None)))).await).await;
    assert!(json["data"]["limits"]["dailyFetch"].is_null());
}

#[tokio::test]
async fn test_copy_is_counted_until_limit() {
    let usage = json!({ "date": today(), "copyCount": 2 });
    let response = send(with_json(
        "POST",
        "/api/user/copy",
        Some(&user_cookie("guest", Some(usage))),
        json!({}),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("xtrendai_user_usage=")));
    let json = body_json(response).await;
    assert_eq!(json["data"]["usage"]["copyCount"], 3);

    let usage = json!({ "date": today(), "copyCount": 3 });
    let response = send(with_json(
        "POST",
        "/api/user/copy",
        Some(&user_cookie("guest", Some(usage))),
        json!({}),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"]["details"]["limit"], 3);
}

#[tokio::test]
async fn test_session_delete_expires_cookies() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/user/session")
        .header(header::COOKIE, user_cookie("free", None))
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 5);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_i18n_catalogs() {
    let response = send(get("/api/i18n?locale=en-US", None)).await;
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("xtrendai_locale=en-US")));
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["profile"]["scenarioLimit"],
        "Your plan allows up to {limit} scenarios"
    );

    // Default locale is zh-CN
    let json = body_json(send(get("/api/i18n", None)).await).await;
    assert_eq!(
        json["data"]["profile"]["scenarioLimit"],
        "当前套餐最多可选择 {limit} 个场景"
    );

    // Locale cookie is honored when the query names none
    let json = body_json(send(get("/api/i18n", Some("xtrendai_locale=en-US"))).await).await;
    assert!(json["data"]["templates"]["POD"]["tshirt"].is_string());

    let response = send(get("/api/i18n?locale=fr-FR", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_x_proxy_without_token() {
    let response = send(get("/api/x-proxy?region=us", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "MISSING_CONFIG");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = send(get("/api/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
