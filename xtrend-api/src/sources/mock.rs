//! Embedded mock fixture source
//!
//! Serves `data/mock-trends.json` with a simulated network latency. Used
//! when no live backend is configured and throughout the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use xtrend_common::models::trend::{Demographics, GLOBAL_REGION};

use super::{with_retry, RawTrend, RetryPolicy, SourceError, SourceKind, TrendSource};

const FIXTURE: &str = include_str!("../../data/mock-trends.json");

/// Fixture record, already in canonical shape
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTrend {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub volume: u64,
    pub growth_rate: f64,
    pub category: String,
    #[serde(default)]
    pub regions: Vec<String>,
    pub is_public: bool,
    #[serde(default)]
    pub related_tweets: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub demographics: Option<Demographics>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    trends: Vec<MockTrend>,
}

/// Mock backend
pub struct MockSource {
    trends: Vec<MockTrend>,
    /// Latency for list lookups
    latency: Duration,
    /// Latency for by-id and public lookups
    short_latency: Duration,
    policy: RetryPolicy,
}

impl MockSource {
    /// Mock source over the embedded fixture
    pub fn new(latency: Duration) -> Result<Self, SourceError> {
        Self::from_json(FIXTURE, latency)
    }

    /// Mock source over caller-provided fixture JSON (`{"trends": [...]}`)
    pub fn from_json(json: &str, latency: Duration) -> Result<Self, SourceError> {
        let fixture: Fixture =
            serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(Self {
            trends: fixture.trends,
            latency,
            short_latency: latency * 2 / 3,
            // Local data: one attempt, fail fast
            policy: RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::ZERO,
                attempt_timeout: Duration::from_secs(1).max(latency * 2),
            },
        })
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }

    async fn simulate<F>(&self, latency: Duration, select: F) -> Result<Vec<MockTrend>, SourceError>
    where
        F: Fn(&MockTrend) -> bool,
    {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(self.trends.iter().filter(|t| select(t)).cloned().collect())
    }

    async fn lookup<F>(
        &self,
        context: &str,
        latency: Duration,
        select: F,
    ) -> Result<Vec<RawTrend>, SourceError>
    where
        F: Fn(&MockTrend) -> bool + Copy,
    {
        let trends = with_retry(&self.policy, context, || self.simulate(latency, select)).await?;
        debug!(operation = context, count = trends.len(), "Mock trends served");
        Ok(trends.into_iter().map(RawTrend::Mock).collect())
    }
}

#[async_trait]
impl TrendSource for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    async fn get_trends(&self) -> Result<Vec<RawTrend>, SourceError> {
        self.lookup("MockSource.get_trends", self.latency, |_| true)
            .await
    }

    /// `global` yields public trends; any other region yields trends that
    /// are public or list that region
    async fn get_trends_by_region(&self, region: &str) -> Result<Vec<RawTrend>, SourceError> {
        let global = region == GLOBAL_REGION;
        self.lookup("MockSource.get_trends_by_region", self.latency, |t| {
            t.is_public || (!global && t.regions.iter().any(|r| r == region))
        })
        .await
    }

    async fn get_public_trends(&self) -> Result<Vec<RawTrend>, SourceError> {
        self.lookup("MockSource.get_public_trends", self.short_latency, |t| {
            t.is_public
        })
        .await
    }

    async fn get_trend_by_id(&self, id: &str) -> Result<Option<RawTrend>, SourceError> {
        Ok(self
            .lookup("MockSource.get_trend_by_id", self.short_latency, |t| t.id == id)
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MockSource {
        MockSource::new(Duration::ZERO).unwrap()
    }

    fn ids(trends: &[RawTrend]) -> Vec<String> {
        trends.iter().map(RawTrend::id).collect()
    }

    #[test]
    fn test_embedded_fixture_parses() {
        let source = source();
        assert!(!source.is_empty());
        assert!(source.trends.iter().any(|t| t.is_public));
        assert!(source.trends.iter().any(|t| !t.is_public));
    }

    #[tokio::test]
    async fn test_get_trends_returns_everything() {
        let source = source();
        let trends = source.get_trends().await.unwrap();
        assert_eq!(trends.len(), source.len());
        assert!(trends.iter().all(|t| matches!(t, RawTrend::Mock(_))));
    }

    #[tokio::test]
    async fn test_global_region_is_public_only() {
        let trends = source().get_trends_by_region("global").await.unwrap();
        assert!(!trends.is_empty());
        assert!(trends.iter().all(RawTrend::is_public));
    }

    #[tokio::test]
    async fn test_region_includes_public_and_local() {
        let trends = source().get_trends_by_region("cn").await.unwrap();
        for trend in &trends {
            let RawTrend::Mock(mock) = trend else {
                panic!("mock source produced {:?}", trend);
            };
            assert!(mock.is_public || mock.regions.iter().any(|r| r == "cn"));
        }
        // The Spring Festival fixture is cn-only and private
        assert!(ids(&trends).contains(&"trend-003".to_string()));
    }

    #[tokio::test]
    async fn test_get_trend_by_id() {
        let source = source();
        let found = source.get_trend_by_id("trend-002").await.unwrap();
        assert_eq!(found.map(|t| t.id()), Some("trend-002".to_string()));

        assert!(source.get_trend_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let source = MockSource::new(Duration::from_millis(300)).unwrap();
        let start = tokio::time::Instant::now();
        source.get_trends().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_malformed_fixture_is_parse_error() {
        let result = MockSource::from_json("{\"trends\": 5}", Duration::ZERO);
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }
}
