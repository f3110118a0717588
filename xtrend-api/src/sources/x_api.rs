//! X (Twitter) trends source
//!
//! Uses the v1.1 `trends/place.json?id=<WOEID>` endpoint with bearer
//! authentication (the v2 API has no trends endpoint).
//!
//! **Rate limiting:** two independent guards fail fast with
//! [`SourceError::WindowExhausted`] instead of sending a request:
//! - the server-reported window (`x-rate-limit-remaining` /
//!   `x-rate-limit-reset`), while it is exhausted and not yet reset
//! - a client-side pacer allowing 75 requests per 15 minutes

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use governor::clock::{Clock, DefaultClock};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use xtrend_common::config::XApiConfig;
use xtrend_common::models::trend::GLOBAL_REGION;

use super::{with_retry, RawTrend, RetryPolicy, SourceError, SourceKind, TrendSource};

/// Default v1.1 API root
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Requests allowed per server window
pub const WINDOW_REQUESTS: u32 = 75;

/// WOEID used for worldwide trends and unknown regions
pub const GLOBAL_WOEID: u32 = 1;

/// Region code → WOEID
const WOEIDS: &[(&str, u32)] = &[
    ("us", 23424977),
    ("cn", 23424781),
    ("uk", 23424975),
    ("jp", 23424856),
    ("ca", 23424775),
    ("au", 23424748),
    ("in", 23424848),
    ("br", 23424768),
    ("de", 23424829),
    ("fr", 23424819),
    ("global", GLOBAL_WOEID),
];

fn known_woeid(region: &str) -> Option<u32> {
    WOEIDS
        .iter()
        .find(|(code, _)| *code == region)
        .map(|(_, woeid)| *woeid)
}

/// WOEID for a region code; unknown regions map to worldwide
pub fn woeid(region: &str) -> u32 {
    known_woeid(region).unwrap_or(GLOBAL_WOEID)
}

/// Region codes with a WOEID mapping
pub fn supported_regions() -> Vec<&'static str> {
    WOEIDS.iter().map(|(code, _)| *code).collect()
}

/// One entry of a `trends/place` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XApiTrend {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub promoted_content: Option<serde_json::Value>,
    #[serde(default)]
    pub query: Option<String>,
    /// Null when X has no volume figure
    #[serde(default)]
    pub tweet_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PlaceTrends {
    #[serde(default)]
    trends: Vec<XApiTrend>,
}

/// Snapshot of the server-reported rate limit window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub limit: u32,
    /// Requests left in the window, if the server has told us
    pub remaining: Option<u32>,
    /// Requests made in the window as implied by `remaining`
    pub used: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct WindowState {
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

type Pacer = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    DefaultClock,
>;

/// X API backend
pub struct XApiSource {
    client: Client,
    base_url: String,
    bearer_token: String,
    policy: RetryPolicy,
    window: Mutex<WindowState>,
    pacer: Pacer,
}

impl XApiSource {
    /// Build from configuration
    ///
    /// Fails with [`SourceError::NotConfigured`] when no bearer token is set.
    pub fn from_config(config: &XApiConfig, policy: RetryPolicy) -> Result<Self, SourceError> {
        let token = config
            .bearer_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SourceError::NotConfigured("X API bearer token".to_string()))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        // 75 per 15 minutes: bursts up to the full window, refilling one every 12 s
        let burst = NonZeroU32::new(WINDOW_REQUESTS).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(Duration::from_secs(15 * 60 / WINDOW_REQUESTS as u64))
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::MIN))
            .allow_burst(burst);

        info!(
            base_url = %base_url,
            api_key_present = config.api_key.is_some(),
            "X API source configured"
        );

        Ok(Self {
            client,
            base_url,
            bearer_token: token.to_string(),
            policy,
            window: Mutex::new(WindowState::default()),
            pacer: RateLimiter::direct(quota),
        })
    }

    /// Trends for several regions, fetched one after another
    ///
    /// A region that fails maps to an empty list.
    pub async fn get_trends_for_regions(
        &self,
        regions: &[&str],
    ) -> BTreeMap<String, Vec<XApiTrend>> {
        let mut results = BTreeMap::new();
        for region in regions {
            let trends = match self.fetch_with_retry(woeid(region)).await {
                Ok(trends) => trends,
                Err(e) => {
                    warn!(region = %region, error = %e, "Failed to fetch region trends");
                    Vec::new()
                }
            };
            results.insert(region.to_string(), trends);
        }
        results
    }

    /// Trends for one region, unnormalized
    pub async fn get_region_trends(&self, region: &str) -> Result<Vec<XApiTrend>, SourceError> {
        let code = if known_woeid(region).is_some() {
            region
        } else {
            debug!(region = %region, "No WOEID for region, using worldwide trends");
            GLOBAL_REGION
        };
        self.fetch_with_retry(woeid(code)).await
    }

    pub async fn rate_limit_status(&self) -> RateLimitStatus {
        let window = self.window.lock().await;
        RateLimitStatus {
            limit: WINDOW_REQUESTS,
            remaining: window.remaining,
            used: window.remaining.map(|r| WINDOW_REQUESTS.saturating_sub(r)),
            reset_at: window.reset_at,
        }
    }

    /// Message of the most recent failed request
    pub async fn last_error(&self) -> Option<String> {
        self.window.lock().await.last_error.clone()
    }

    /// Forget the server-reported window and the last error
    pub async fn reset_rate_limit(&self) {
        *self.window.lock().await = WindowState::default();
    }

    pub fn supported_regions(&self) -> Vec<&'static str> {
        supported_regions()
    }

    pub fn woeid(&self, region: &str) -> u32 {
        woeid(region)
    }

    async fn fetch_with_retry(&self, woeid: u32) -> Result<Vec<XApiTrend>, SourceError> {
        let result = with_retry(&self.policy, "XApiSource.fetch_place", || {
            self.fetch_place(woeid)
        })
        .await;

        if let Err(e) = &result {
            self.window.lock().await.last_error = Some(e.to_string());
        }
        result
    }

    /// Refuse locally while the server window is exhausted
    async fn check_window(&self) -> Result<(), SourceError> {
        let mut window = self.window.lock().await;
        let now = Utc::now();

        match (window.remaining, window.reset_at) {
            (Some(0), Some(reset_at)) if reset_at > now => {
                let retry_after = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
                debug!(
                    retry_after_secs = retry_after.as_secs(),
                    "X API window exhausted, refusing request"
                );
                Err(SourceError::WindowExhausted { retry_after })
            }
            (_, Some(reset_at)) if reset_at <= now => {
                window.remaining = None;
                window.reset_at = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_pacer(&self) -> Result<(), SourceError> {
        self.pacer.check().map_err(|not_until| {
            let retry_after = not_until.wait_time_from(DefaultClock::default().now());
            debug!(
                retry_after_ms = retry_after.as_millis() as u64,
                "X API client-side pacing limit reached"
            );
            SourceError::WindowExhausted { retry_after }
        })
    }

    async fn record_window(&self, headers: &reqwest::header::HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        };

        let remaining = header("x-rate-limit-remaining").and_then(|v| v.parse::<u32>().ok());
        let reset_at = header("x-rate-limit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        if remaining.is_none() && reset_at.is_none() {
            return;
        }

        let mut window = self.window.lock().await;
        if remaining.is_some() {
            window.remaining = remaining;
        }
        if reset_at.is_some() {
            window.reset_at = reset_at;
        }
    }

    async fn fetch_place(&self, woeid: u32) -> Result<Vec<XApiTrend>, SourceError> {
        self.check_window().await?;
        self.check_pacer()?;

        let url = format!("{}/trends/place.json", self.base_url);
        debug!(woeid, "Requesting X API trends");

        let response = self
            .client
            .get(&url)
            .query(&[("id", woeid)])
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(e, self.policy.attempt_timeout))?;

        self.record_window(response.headers()).await;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(err) = SourceError::classify_status(status, retry_after.as_deref()) {
            warn!(status, woeid, error = %err, "X API request failed");
            return Err(err);
        }

        if status == 204 {
            return Ok(Vec::new());
        }

        let places: Vec<PlaceTrends> = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let trends = places.into_iter().next().map(|p| p.trends).unwrap_or_default();

        info!(woeid, count = trends.len(), "Fetched X API trends");
        Ok(trends)
    }

    fn tag(trends: Vec<XApiTrend>, region: &str) -> Vec<RawTrend> {
        trends
            .into_iter()
            .map(|trend| RawTrend::XApi {
                trend,
                region: region.to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl TrendSource for XApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::XApi
    }

    /// Worldwide trends
    async fn get_trends(&self) -> Result<Vec<RawTrend>, SourceError> {
        let trends = self.fetch_with_retry(GLOBAL_WOEID).await?;
        Ok(Self::tag(trends, GLOBAL_REGION))
    }

    async fn get_trends_by_region(&self, region: &str) -> Result<Vec<RawTrend>, SourceError> {
        let tag = if known_woeid(region).is_some() {
            region
        } else {
            GLOBAL_REGION
        };
        let trends = self.get_region_trends(region).await?;
        Ok(Self::tag(trends, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woeid_map() {
        assert_eq!(woeid("us"), 23424977);
        assert_eq!(woeid("jp"), 23424856);
        assert_eq!(woeid("global"), 1);
        assert_eq!(woeid("atlantis"), 1);
        assert!(supported_regions().contains(&"fr"));
        assert_eq!(supported_regions().len(), 11);
    }

    #[test]
    fn test_missing_token_is_not_configured() {
        let config = XApiConfig::default();
        let result = XApiSource::from_config(&config, RetryPolicy::default());
        assert!(matches!(result, Err(SourceError::NotConfigured(_))));

        let blank = XApiConfig {
            bearer_token: Some("  ".to_string()),
            ..XApiConfig::default()
        };
        assert!(XApiSource::from_config(&blank, RetryPolicy::default()).is_err());
    }

    #[test]
    fn test_trend_with_null_volume_parses() {
        let json = r##"[{"trends": [
            {"name": "#Rust", "url": "http://x/rust", "promoted_content": null, "query": "%23Rust", "tweet_volume": null}
        ], "as_of": "2025-01-01T00:00:00Z"}]"##;
        let places: Vec<PlaceTrends> = serde_json::from_str(json).unwrap();
        assert_eq!(places[0].trends[0].name, "#Rust");
        assert_eq!(places[0].trends[0].tweet_volume, None);
    }

    #[tokio::test]
    async fn test_exhausted_window_fails_fast() {
        let config = XApiConfig {
            bearer_token: Some("token".to_string()),
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..XApiConfig::default()
        };
        let source = XApiSource::from_config(&config, RetryPolicy::default()).unwrap();

        {
            let mut window = source.window.lock().await;
            window.remaining = Some(0);
            window.reset_at = Some(Utc::now() + chrono::Duration::seconds(120));
        }

        match source.check_window().await {
            Err(SourceError::WindowExhausted { retry_after }) => {
                assert!(retry_after <= Duration::from_secs(120));
                assert!(retry_after > Duration::from_secs(100));
            }
            other => panic!("expected WindowExhausted, got {:?}", other),
        }

        // Refused on the first attempt, no backoff and no Exhausted wrapper
        let started = std::time::Instant::now();
        let err = source.get_region_trends("us").await.unwrap_err();
        assert!(matches!(err, SourceError::WindowExhausted { .. }));
        assert!(started.elapsed() < Duration::from_millis(500));

        let status = source.rate_limit_status().await;
        assert_eq!(status.remaining, Some(0));
        assert_eq!(status.used, Some(WINDOW_REQUESTS));

        source.reset_rate_limit().await;
        assert!(source.check_window().await.is_ok());
        assert_eq!(source.rate_limit_status().await.remaining, None);
    }

    #[tokio::test]
    async fn test_elapsed_window_is_cleared() {
        let config = XApiConfig {
            bearer_token: Some("token".to_string()),
            ..XApiConfig::default()
        };
        let source = XApiSource::from_config(&config, RetryPolicy::default()).unwrap();

        {
            let mut window = source.window.lock().await;
            window.remaining = Some(0);
            window.reset_at = Some(Utc::now() - chrono::Duration::seconds(1));
        }

        assert!(source.check_window().await.is_ok());
        assert_eq!(source.rate_limit_status().await.reset_at, None);
    }
}
