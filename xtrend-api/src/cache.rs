//! Single-slot TTL cache for the normalized trend list
//!
//! Holds the last fetched list and when it was stored. Concurrent writers
//! are not coordinated: the last `store` wins.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use xtrend_common::models::Trend;

struct Slot {
    trends: Arc<Vec<Trend>>,
    stored_at: Instant,
    stored_wall: DateTime<Utc>,
}

pub struct TrendCache {
    ttl: Duration,
    slot: RwLock<Option<Slot>>,
}

impl TrendCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached list if stored less than `ttl` ago
    pub async fn get(&self) -> Option<Arc<Vec<Trend>>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|s| s.stored_at.elapsed() < self.ttl)
            .map(|s| Arc::clone(&s.trends))
    }

    /// Replace the slot and return the shared list
    pub async fn store(&self, trends: Vec<Trend>) -> Arc<Vec<Trend>> {
        let trends = Arc::new(trends);
        *self.slot.write().await = Some(Slot {
            trends: Arc::clone(&trends),
            stored_at: Instant::now(),
            stored_wall: Utc::now(),
        });
        trends
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Wall-clock time of the last store, expired or not
    pub async fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().await.as_ref().map(|s| s.stored_wall)
    }
}
