//! Trend service: cache → source → normalize → rank

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use xtrend_common::models::{Trend, UserProfile};

use super::ranking::{self, FilterOptions};
use crate::cache::TrendCache;
use crate::sources::normalize::normalize_all;
use crate::sources::{SourceError, SourceKind, TrendSource};

/// Owns the source and the trend cache
pub struct TrendService {
    source: Arc<dyn TrendSource>,
    cache: TrendCache,
}

impl TrendService {
    pub fn new(source: Arc<dyn TrendSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TrendCache::new(ttl),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Full normalized list, from cache when fresh
    pub async fn get_all_trends(&self) -> Result<Arc<Vec<Trend>>, SourceError> {
        if let Some(cached) = self.cache.get().await {
            debug!(count = cached.len(), "Trend cache hit");
            return Ok(cached);
        }

        let fetched_at = Utc::now();
        let raw = self.source.get_trends().await?;
        let trends = normalize_all(raw, fetched_at);
        info!(
            data_source = %self.source.kind(),
            count = trends.len(),
            "Fetched trends from source"
        );
        Ok(self.cache.store(trends).await)
    }

    /// Drop the cache and fetch again
    pub async fn refresh(&self) -> Result<Arc<Vec<Trend>>, SourceError> {
        self.cache.invalidate().await;
        self.get_all_trends().await
    }

    pub async fn get_public_trends(&self) -> Result<Vec<Trend>, SourceError> {
        let trends = self.get_all_trends().await?;
        Ok(trends.iter().filter(|t| t.is_public).cloned().collect())
    }

    pub async fn get_trend_by_id(&self, id: &str) -> Result<Option<Trend>, SourceError> {
        let trends = self.get_all_trends().await?;
        Ok(trends.iter().find(|t| t.id == id).cloned())
    }

    /// Trends listing `region` or `global`, plus public ones
    pub async fn get_trends_by_region(&self, region: &str) -> Result<Vec<Trend>, SourceError> {
        let trends = self.get_all_trends().await?;
        Ok(ranking::filter_by_region(&trends, region))
    }

    /// Personalized ranking over the cached list
    pub async fn get_filtered_trends(
        &self,
        profile: Option<&UserProfile>,
        options: FilterOptions,
    ) -> Result<Vec<Trend>, SourceError> {
        let trends = self.get_all_trends().await?;
        Ok(ranking::filter_trends(&trends, profile, options))
    }

    /// When the cached list was fetched
    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.stored_at().await
    }
}
