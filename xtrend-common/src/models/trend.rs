//! Canonical trend record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Region code that matches every profile region
pub const GLOBAL_REGION: &str = "global";

/// Demographic weighting hints attached to a trend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    /// Age groups the trend resonates with (e.g. "18-24")
    #[serde(default)]
    pub age_groups: Vec<String>,
    /// Regions the audience is concentrated in
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Normalized trending topic
///
/// Produced by source normalization and never mutated in place afterwards;
/// ranking works on derived copies.
///
/// **Invariants:** `volume` is unsigned, `regions` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub volume: u64,
    /// Growth in percent (10.0 = +10%)
    pub growth_rate: f64,
    pub category: String,
    pub regions: Vec<String>,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_tweets: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    pub updated_at: DateTime<Utc>,
}

impl Trend {
    /// Ranking score: `volume × (1 + growthRate / 100)`
    pub fn score(&self) -> f64 {
        self.volume as f64 * (1.0 + self.growth_rate / 100.0)
    }

    /// Whether the trend lists `region` among its regions
    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// Whether the trend is visible to a profile in `region`
    ///
    /// True when the trend lists the region itself or `global`.
    pub fn matches_region(&self, region: &str) -> bool {
        self.has_region(region) || self.has_region(GLOBAL_REGION)
    }

    /// Whether the demographic hints include `age_group`
    pub fn targets_age_group(&self, age_group: &str) -> bool {
        self.demographics
            .as_ref()
            .map(|d| d.age_groups.iter().any(|g| g == age_group))
            .unwrap_or(false)
    }

    /// Label used in generated text: display name, or name without a leading `#`
    pub fn label(&self) -> &str {
        match &self.display_name {
            Some(display) if !display.is_empty() => display,
            _ => self.name.strip_prefix('#').unwrap_or(&self.name),
        }
    }
}
