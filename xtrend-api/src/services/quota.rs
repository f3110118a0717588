//! Role limits, daily usage and quota checks
//!
//! Usage counters live client-side (see [`crate::session`]); these checks
//! steer honest clients and are not a security boundary.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use xtrend_common::models::{
    QuotaInfo, QuotaLimits, Scenario, UsageRecord, UserIdentity, UserProfile, UserRole,
};
use xtrend_common::time;

/// A check refused the request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaError {
    #[error("Daily fetch limit of {limit} reached")]
    FetchLimit {
        limit: u32,
        used: u32,
        resets_at: DateTime<Utc>,
    },

    #[error("Daily copy limit of {limit} reached")]
    CopyLimit {
        limit: u32,
        used: u32,
        resets_at: DateTime<Utc>,
    },

    #[error("Refresh available again at {next_refresh_at}")]
    RefreshTooSoon {
        interval_minutes: u32,
        next_refresh_at: DateTime<Utc>,
    },

    #[error("Role {role} may select at most {limit} scenarios")]
    TooManyScenarios { role: UserRole, limit: usize },

    #[error("Scenario {scenario} is not available for role {role}")]
    ScenarioNotAllowed { scenario: Scenario, role: UserRole },
}

impl QuotaError {
    /// Seconds until the refused action becomes possible, if that is known
    pub fn retry_after(&self, now: DateTime<Utc>) -> Option<u64> {
        let at = match self {
            QuotaError::FetchLimit { resets_at, .. } | QuotaError::CopyLimit { resets_at, .. } => {
                *resets_at
            }
            QuotaError::RefreshTooSoon {
                next_refresh_at, ..
            } => *next_refresh_at,
            _ => return None,
        };
        Some((at - now).num_seconds().max(0) as u64)
    }

    /// Structured details for the error envelope
    pub fn details(&self) -> Value {
        match self {
            QuotaError::FetchLimit {
                limit,
                used,
                resets_at,
            }
            | QuotaError::CopyLimit {
                limit,
                used,
                resets_at,
            } => json!({ "limit": limit, "used": used, "resetsAt": resets_at }),
            QuotaError::RefreshTooSoon {
                interval_minutes,
                next_refresh_at,
            } => json!({ "refreshInterval": interval_minutes, "nextRefreshAt": next_refresh_at }),
            QuotaError::TooManyScenarios { role, limit } => {
                json!({ "role": role, "scenarioCount": limit })
            }
            QuotaError::ScenarioNotAllowed { scenario, role } => {
                json!({ "role": role, "scenario": scenario })
            }
        }
    }
}

pub fn limits_for(role: UserRole) -> QuotaLimits {
    QuotaLimits::for_role(role)
}

/// Limits and today's usage for `user`
pub fn quota_info(user: &UserIdentity, usage: Option<UsageRecord>, now: DateTime<Utc>) -> QuotaInfo {
    QuotaInfo {
        user_id: user.id.clone(),
        role: user.role,
        limits: limits_for(user.role),
        usage: UsageRecord::current(usage, time::day_of(now)),
        resets_at: time::next_utc_midnight(now),
    }
}

pub fn check_fetch(info: &QuotaInfo) -> Result<(), QuotaError> {
    match info.limits.daily_fetch {
        Some(limit) if info.usage.fetch_count >= limit => Err(QuotaError::FetchLimit {
            limit,
            used: info.usage.fetch_count,
            resets_at: info.resets_at,
        }),
        _ => Ok(()),
    }
}

pub fn check_copy(info: &QuotaInfo) -> Result<(), QuotaError> {
    match info.limits.daily_copy {
        Some(limit) if info.usage.copy_count >= limit => Err(QuotaError::CopyLimit {
            limit,
            used: info.usage.copy_count,
            resets_at: info.resets_at,
        }),
        _ => Ok(()),
    }
}

/// Forced refreshes are spaced at least `refreshInterval` minutes apart
pub fn check_refresh(info: &QuotaInfo, now: DateTime<Utc>) -> Result<(), QuotaError> {
    let interval = info.limits.refresh_interval;
    if interval == 0 {
        return Ok(());
    }

    match info.usage.last_refresh_at {
        Some(last) => {
            let next = last + Duration::minutes(interval as i64);
            if next > now {
                Err(QuotaError::RefreshTooSoon {
                    interval_minutes: interval,
                    next_refresh_at: next,
                })
            } else {
                Ok(())
            }
        }
        None => Ok(()),
    }
}

/// Scenario selection must fit the role's count and availability
pub fn check_scenarios(role: UserRole, scenarios: &[Scenario]) -> Result<(), QuotaError> {
    let limit = limits_for(role).scenario_count;
    if scenarios.len() > limit {
        return Err(QuotaError::TooManyScenarios { role, limit });
    }

    match scenarios.iter().find(|s| !s.is_available_for(role)) {
        Some(&scenario) => Err(QuotaError::ScenarioNotAllowed { scenario, role }),
        None => Ok(()),
    }
}

/// Pro and admin reach everything, guests only POD, free users what
/// their saved profile selects
pub fn can_access_scenario(
    scenario: Scenario,
    role: UserRole,
    profile: Option<&UserProfile>,
) -> bool {
    match role {
        UserRole::Pro | UserRole::Admin => true,
        UserRole::Guest => scenario == Scenario::Pod,
        UserRole::Free => profile
            .map(|p| p.scenarios.contains(&scenario))
            .unwrap_or(scenario == Scenario::Pod),
    }
}

/// When the next forced refresh becomes possible; `None` without gating
pub fn next_refresh_at(limits: &QuotaLimits, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match limits.refresh_interval {
        0 => None,
        minutes => Some(now + Duration::minutes(minutes as i64)),
    }
}

pub fn record_fetch(mut usage: UsageRecord, now: DateTime<Utc>) -> UsageRecord {
    usage = UsageRecord::current(Some(usage), time::day_of(now));
    usage.fetch_count = usage.fetch_count.saturating_add(1);
    usage.last_fetch_at = Some(now);
    usage
}

pub fn record_copy(mut usage: UsageRecord, now: DateTime<Utc>) -> UsageRecord {
    usage = UsageRecord::current(Some(usage), time::day_of(now));
    usage.copy_count = usage.copy_count.saturating_add(1);
    usage.last_copy_at = Some(now);
    usage
}

pub fn record_refresh(mut usage: UsageRecord, now: DateTime<Utc>) -> UsageRecord {
    usage = UsageRecord::current(Some(usage), time::day_of(now));
    usage.last_refresh_at = Some(now);
    usage
}
