//! Personalized filtering and ranking
//!
//! Pure functions over trend slices. Inputs are never modified; every
//! function returns derived copies.
//!
//! **Ranking pipeline** ([`filter_trends`]):
//! 1. Region filter: keep trends listing the profile region or `global`
//!    (skipped for a `global` profile)
//! 2. Age boost: trends targeting the profile age group get `growthRate × 1.2`
//! 3. Stable sort by `volume × (1 + growthRate / 100)`, descending
//! 4. Public-first partition when `include_public` is set
//! 5. Truncate to `limit`

use std::cmp::Ordering;
use xtrend_common::models::{Trend, UserProfile};

/// Growth multiplier for trends matching the profile age group
pub const AGE_GROUP_BOOST: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub limit: usize,
    /// Move public trends ahead of everything else
    pub include_public: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            include_public: true,
        }
    }
}

fn by_score_desc(a: &Trend, b: &Trend) -> Ordering {
    b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal)
}

/// Rank `trends` for `profile`
pub fn filter_trends(
    trends: &[Trend],
    profile: Option<&UserProfile>,
    options: FilterOptions,
) -> Vec<Trend> {
    let mut ranked: Vec<Trend> = match profile {
        Some(p) if !p.region.is_global() => trends
            .iter()
            .filter(|t| t.matches_region(p.region.as_str()))
            .cloned()
            .collect(),
        _ => trends.to_vec(),
    };

    if let Some(profile) = profile {
        let age_group = profile.age_group.as_str();
        for trend in ranked.iter_mut().filter(|t| t.targets_age_group(age_group)) {
            trend.growth_rate *= AGE_GROUP_BOOST;
        }
    }

    // sort_by is stable: equal scores keep input order
    ranked.sort_by(by_score_desc);

    if options.include_public {
        let (public, private): (Vec<Trend>, Vec<Trend>) =
            ranked.into_iter().partition(|t| t.is_public);
        ranked = public;
        ranked.extend(private);
    }

    ranked.truncate(options.limit);
    ranked
}

/// Public trends by volume, descending
pub fn get_public_trends(trends: &[Trend], limit: usize) -> Vec<Trend> {
    let mut public: Vec<Trend> = trends.iter().filter(|t| t.is_public).cloned().collect();
    public.sort_by(|a, b| b.volume.cmp(&a.volume));
    public.truncate(limit);
    public
}

/// Exact category match
pub fn filter_by_category(trends: &[Trend], category: &str) -> Vec<Trend> {
    trends
        .iter()
        .filter(|t| t.category == category)
        .cloned()
        .collect()
}

/// Trends listing `region` or `global`, plus every public trend
pub fn filter_by_region(trends: &[Trend], region: &str) -> Vec<Trend> {
    trends
        .iter()
        .filter(|t| t.matches_region(region) || t.is_public)
        .cloned()
        .collect()
}

/// Case-insensitive substring search over name, display name and keywords
pub fn search_trends(trends: &[Trend], query: &str) -> Vec<Trend> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return trends.to_vec();
    }

    trends
        .iter()
        .filter(|t| {
            t.name.to_lowercase().contains(&query)
                || t.display_name
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&query))
                    .unwrap_or(false)
                || t.keywords.iter().any(|k| k.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}
