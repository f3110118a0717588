//! MCP trend service source
//!
//! Secondary JSON backend: `POST {url}/trends` and `POST {url}/trends/region`
//! with a result limit, plus a `GET {url}/health` availability probe.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{with_retry, RawTrend, RetryPolicy, SourceError, SourceKind, TrendSource};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Results requested per call
const REQUEST_LIMIT: u32 = 20;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Record as returned by the MCP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTrend {
    pub id: String,
    pub name: String,
    /// May be negative in malformed upstream data
    pub volume: i64,
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

/// MCP backend
pub struct McpSource {
    client: Client,
    server_url: String,
    policy: RetryPolicy,
}

impl McpSource {
    pub fn new(server_url: Option<&str>, policy: RetryPolicy) -> Result<Self, SourceError> {
        let server_url = server_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        info!(server_url = %server_url, "MCP source configured");
        Ok(Self {
            client,
            server_url,
            policy,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Whether `/health` answers with a success status within 2 s
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.server_url);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "MCP health probe failed");
                false
            }
        }
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<Vec<McpTrend>, SourceError> {
        let url = format!("{}{}", self.server_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(e, self.policy.attempt_timeout))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(SourceError::classify_status(status, retry_after.as_deref())
                .unwrap_or(SourceError::Unexpected { status }));
        }

        let trends: Vec<McpTrend> = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        debug!(path, count = trends.len(), "Fetched MCP trends");
        Ok(trends)
    }

    fn tag(trends: Vec<McpTrend>) -> Vec<RawTrend> {
        trends.into_iter().map(RawTrend::Mcp).collect()
    }
}

#[async_trait]
impl TrendSource for McpSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mcp
    }

    async fn get_trends(&self) -> Result<Vec<RawTrend>, SourceError> {
        let body = json!({ "limit": REQUEST_LIMIT });
        let trends = with_retry(&self.policy, "McpSource.get_trends", || {
            self.post("/trends", &body)
        })
        .await?;
        Ok(Self::tag(trends))
    }

    async fn get_trends_by_region(&self, region: &str) -> Result<Vec<RawTrend>, SourceError> {
        let body = json!({ "region": region, "limit": REQUEST_LIMIT });
        let trends = with_retry(&self.policy, "McpSource.get_trends_by_region", || {
            self.post("/trends/region", &body)
        })
        .await?;
        Ok(Self::tag(trends))
    }
}
