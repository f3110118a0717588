//! Raw source records → canonical [`Trend`]

use chrono::{DateTime, Utc};
use xtrend_common::models::trend::GLOBAL_REGION;
use xtrend_common::models::Trend;

use super::RawTrend;

impl RawTrend {
    /// Id the record will carry once normalized
    pub fn id(&self) -> String {
        match self {
            RawTrend::Mock(t) => t.id.clone(),
            RawTrend::XApi { trend, region } => x_api_id(region, &trend.name),
            RawTrend::Mcp(t) => t.id.clone(),
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            RawTrend::Mock(t) => t.is_public,
            RawTrend::XApi { .. } => true,
            RawTrend::Mcp(t) => t
                .regions
                .as_ref()
                .map(|r| r.iter().any(|r| r == GLOBAL_REGION))
                .unwrap_or(true),
        }
    }

    /// Canonical form; `fetched_at` stands in for missing timestamps
    pub fn normalize(self, fetched_at: DateTime<Utc>) -> Trend {
        match self {
            RawTrend::Mock(t) => Trend {
                id: t.id,
                name: t.name,
                display_name: t.display_name,
                volume: t.volume,
                growth_rate: t.growth_rate,
                category: t.category,
                regions: normalize_regions(t.regions),
                is_public: t.is_public,
                related_tweets: t.related_tweets,
                url: t.url,
                keywords: t.keywords,
                demographics: t.demographics,
                updated_at: t.updated_at.unwrap_or(fetched_at),
            },
            RawTrend::XApi { trend, region } => {
                let volume = trend.tweet_volume.unwrap_or(0);
                Trend {
                    id: x_api_id(&region, &trend.name),
                    keywords: hashtag_words(&trend.name),
                    display_name: Some(trend.name.clone()),
                    name: trend.name,
                    volume,
                    growth_rate: 0.0,
                    category: "unknown".to_string(),
                    regions: normalize_regions(vec![region]),
                    is_public: true,
                    related_tweets: Some(volume),
                    url: trend.url,
                    demographics: None,
                    updated_at: fetched_at,
                }
            }
            RawTrend::Mcp(t) => {
                let regions = normalize_regions(t.regions.unwrap_or_default());
                let is_public = regions.iter().any(|r| r == GLOBAL_REGION);
                let updated_at = t
                    .timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.with_timezone(&Utc))
                    .unwrap_or(fetched_at);
                Trend {
                    id: t.id,
                    name: t.name,
                    display_name: None,
                    volume: t.volume.max(0) as u64,
                    growth_rate: t.growth_rate,
                    category: t.category,
                    regions,
                    is_public,
                    related_tweets: None,
                    url: None,
                    keywords: t.keywords.unwrap_or_default(),
                    demographics: None,
                    updated_at,
                }
            }
        }
    }
}

/// Normalize a whole batch with one fetch time
pub fn normalize_all(raw: Vec<RawTrend>, fetched_at: DateTime<Utc>) -> Vec<Trend> {
    raw.into_iter().map(|t| t.normalize(fetched_at)).collect()
}

/// Deduplicate preserving first occurrence; empty becomes `["global"]`
pub fn normalize_regions(regions: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(regions.len());
    for region in regions {
        let region = region.trim().to_ascii_lowercase();
        if !region.is_empty() && !out.contains(&region) {
            out.push(region);
        }
    }
    if out.is_empty() {
        out.push(GLOBAL_REGION.to_string());
    }
    out
}

/// Stable id for an X API trend, so by-id lookups survive refreshes
pub fn x_api_id(region: &str, name: &str) -> String {
    format!("x-{}-{}", region.trim().to_ascii_lowercase(), slugify(name))
}

/// Lowercase alphanumeric words joined by `-`
///
/// Non-ASCII letters (e.g. CJK trend names) are kept as-is.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "trend".to_string()
    } else {
        slug
    }
}

/// Whitespace-separated words starting with `#`, without the `#`
fn hashtag_words(name: &str) -> Vec<String> {
    name.split_whitespace()
        .filter_map(|w| w.strip_prefix('#'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
