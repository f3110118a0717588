//! Quota limits and daily usage counters

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRole;

/// Static per-role limits
///
/// `None` means unlimited and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    pub daily_fetch: Option<u32>,
    pub daily_copy: Option<u32>,
    pub scenario_count: usize,
    /// Minimum minutes between forced refreshes (0 = no gating)
    pub refresh_interval: u32,
}

impl QuotaLimits {
    pub fn for_role(role: UserRole) -> Self {
        match role {
            // Guests only ever see public trends, so fetches are not counted
            UserRole::Guest => Self {
                daily_fetch: None,
                daily_copy: Some(3),
                scenario_count: 1,
                refresh_interval: 0,
            },
            UserRole::Free => Self {
                daily_fetch: Some(10),
                daily_copy: Some(20),
                scenario_count: 2,
                refresh_interval: 60,
            },
            UserRole::Pro => Self {
                daily_fetch: None,
                daily_copy: None,
                scenario_count: 4,
                refresh_interval: 5,
            },
            UserRole::Admin => Self {
                daily_fetch: None,
                daily_copy: None,
                scenario_count: 4,
                refresh_interval: 0,
            },
        }
    }
}

/// Per-user counters for the current UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub fetch_count: u32,
    #[serde(default)]
    pub copy_count: u32,
    #[serde(default)]
    pub last_fetch_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_copy_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl UsageRecord {
    /// Zeroed record for `date`
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            fetch_count: 0,
            copy_count: 0,
            last_fetch_at: None,
            last_copy_at: None,
            last_refresh_at: None,
        }
    }

    /// Stored record if it belongs to `today`, otherwise a fresh one
    pub fn current(stored: Option<UsageRecord>, today: NaiveDate) -> Self {
        match stored {
            Some(record) if record.date == today => record,
            _ => Self::empty(today),
        }
    }
}

/// Limits joined with usage, as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub user_id: String,
    pub role: UserRole,
    pub limits: QuotaLimits,
    pub usage: UsageRecord,
    pub resets_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_table() {
        let free = QuotaLimits::for_role(UserRole::Free);
        assert_eq!(free.daily_fetch, Some(10));
        assert_eq!(free.daily_copy, Some(20));
        assert_eq!(free.scenario_count, 2);
        assert_eq!(free.refresh_interval, 60);

        let guest = QuotaLimits::for_role(UserRole::Guest);
        assert_eq!(guest.daily_fetch, None);
        assert_eq!(guest.daily_copy, Some(3));

        let pro = QuotaLimits::for_role(UserRole::Pro);
        assert_eq!(pro.daily_copy, None);
        assert_eq!(pro.scenario_count, 4);
    }

    #[test]
    fn test_unlimited_serializes_as_null() {
        let json = serde_json::to_value(QuotaLimits::for_role(UserRole::Pro)).unwrap();
        assert!(json["dailyFetch"].is_null());
        assert_eq!(json["refreshInterval"], 5);
    }

    #[test]
    fn test_usage_resets_on_new_day() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let mut stored = UsageRecord::empty(yesterday);
        stored.fetch_count = 7;

        let current = UsageRecord::current(Some(stored.clone()), today);
        assert_eq!(current.fetch_count, 0);
        assert_eq!(current.date, today);

        stored.date = today;
        let kept = UsageRecord::current(Some(stored), today);
        assert_eq!(kept.fetch_count, 7);
    }
}
