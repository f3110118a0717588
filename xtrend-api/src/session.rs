//! Client-side state: identity, profile, usage and locale
//!
//! The service keeps no per-user storage. Everything about a user travels
//! with the request and is written back through [`ClientStore`]. The
//! cookie implementation is the only medium.
//!
//! **Cookies:**
//! - `xtrendai_user_id`, `xtrendai_user_role`: identity (365 days)
//! - `xtrendai_user_profile`: JSON profile (30 days)
//! - `xtrendai_user_usage`: JSON usage record (2 days)
//! - `xtrendai_locale`: locale code (365 days)
//!
//! Values are percent-encoded, `Path=/`, `SameSite=Lax` and readable by
//! browser scripts (not `HttpOnly`).

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;
use xtrend_common::models::{Locale, UsageRecord, UserIdentity, UserProfile, UserRole};

pub const USER_ID_COOKIE: &str = "xtrendai_user_id";
pub const USER_ROLE_COOKIE: &str = "xtrendai_user_role";
pub const PROFILE_COOKIE: &str = "xtrendai_user_profile";
pub const USAGE_COOKIE: &str = "xtrendai_user_usage";
pub const LOCALE_COOKIE: &str = "xtrendai_locale";

const DAY_SECS: u64 = 24 * 60 * 60;
const IDENTITY_MAX_AGE: u64 = 365 * DAY_SECS;
const PROFILE_MAX_AGE: u64 = 30 * DAY_SECS;
const USAGE_MAX_AGE: u64 = 2 * DAY_SECS;

/// Everything the client presented
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    pub identity: UserIdentity,
    /// No id was presented; `identity` was minted for this request
    pub is_new: bool,
    pub profile: Option<UserProfile>,
    pub usage: Option<UsageRecord>,
    pub locale: Option<Locale>,
}

/// Entries to write back; `None` leaves an entry untouched
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub identity: Option<UserIdentity>,
    pub profile: Option<UserProfile>,
    pub usage: Option<UsageRecord>,
    pub locale: Option<Locale>,
}

impl ClientUpdate {
    /// Update carrying the identity when it was minted for this request
    pub fn for_state(state: &ClientState) -> Self {
        Self {
            identity: state.is_new.then(|| state.identity.clone()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_none()
            && self.profile.is_none()
            && self.usage.is_none()
            && self.locale.is_none()
    }
}

/// Persistence port for client state
pub trait ClientStore: Send + Sync {
    /// Decode request state; malformed entries read as absent
    fn read(&self, headers: &HeaderMap) -> ClientState;

    /// `Set-Cookie` values for the entries present in `update`
    fn write(&self, update: &ClientUpdate) -> Vec<HeaderValue>;

    /// `Set-Cookie` values expiring every entry
    fn clear(&self) -> Vec<HeaderValue>;
}

/// Mint a new guest identity
pub fn new_guest() -> UserIdentity {
    UserIdentity::new(format!("user-{}", Uuid::new_v4()), UserRole::Guest)
}

/// Cookie-backed [`ClientStore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieStore;

impl CookieStore {
    pub fn new() -> Self {
        Self
    }

    fn jar(headers: &HeaderMap) -> HashMap<String, String> {
        let mut jar = HashMap::new();
        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    let value = urlencoding::decode(value.trim())
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.trim().to_string());
                    jar.insert(name.trim().to_string(), value);
                }
            }
        }
        jar
    }

    fn parse_json<T: DeserializeOwned>(jar: &HashMap<String, String>, name: &str) -> Option<T> {
        let raw = jar.get(name)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(cookie = name, error = %e, "Ignoring malformed cookie");
                None
            }
        }
    }

    fn set_cookie(name: &str, value: &str, max_age: u64) -> Option<HeaderValue> {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            name,
            urlencoding::encode(value),
            max_age
        );
        HeaderValue::from_str(&cookie).ok()
    }

    fn set_json<T: serde::Serialize>(name: &str, value: &T, max_age: u64) -> Option<HeaderValue> {
        match serde_json::to_string(value) {
            Ok(json) => Self::set_cookie(name, &json, max_age),
            Err(e) => {
                warn!(cookie = name, error = %e, "Failed to encode cookie");
                None
            }
        }
    }
}

impl ClientStore for CookieStore {
    fn read(&self, headers: &HeaderMap) -> ClientState {
        let jar = Self::jar(headers);

        let id = jar
            .get(USER_ID_COOKIE)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty());

        let (identity, is_new) = match id {
            Some(id) => {
                let role = match jar.get(USER_ROLE_COOKIE).map(|r| r.parse::<UserRole>()) {
                    Some(Ok(role)) => role,
                    Some(Err(e)) => {
                        warn!(error = %e, "Ignoring malformed role cookie");
                        UserRole::Guest
                    }
                    None => UserRole::Guest,
                };
                (UserIdentity::new(id, role), false)
            }
            None => (new_guest(), true),
        };

        let locale = jar
            .get(LOCALE_COOKIE)
            .and_then(|l| l.parse::<Locale>().ok());

        ClientState {
            identity,
            is_new,
            profile: Self::parse_json(&jar, PROFILE_COOKIE),
            usage: Self::parse_json(&jar, USAGE_COOKIE),
            locale,
        }
    }

    fn write(&self, update: &ClientUpdate) -> Vec<HeaderValue> {
        let mut cookies = Vec::new();

        if let Some(identity) = &update.identity {
            cookies.extend(Self::set_cookie(USER_ID_COOKIE, &identity.id, IDENTITY_MAX_AGE));
            cookies.extend(Self::set_cookie(
                USER_ROLE_COOKIE,
                identity.role.as_str(),
                IDENTITY_MAX_AGE,
            ));
        }
        if let Some(profile) = &update.profile {
            cookies.extend(Self::set_json(PROFILE_COOKIE, profile, PROFILE_MAX_AGE));
        }
        if let Some(usage) = &update.usage {
            cookies.extend(Self::set_json(USAGE_COOKIE, usage, USAGE_MAX_AGE));
        }
        if let Some(locale) = update.locale {
            cookies.extend(Self::set_cookie(LOCALE_COOKIE, locale.as_str(), IDENTITY_MAX_AGE));
        }

        cookies
    }

    fn clear(&self) -> Vec<HeaderValue> {
        [
            USER_ID_COOKIE,
            USER_ROLE_COOKIE,
            PROFILE_COOKIE,
            USAGE_COOKIE,
            LOCALE_COOKIE,
        ]
        .iter()
        .filter_map(|name| {
            HeaderValue::from_str(&format!("{}=; Path=/; Max-Age=0; SameSite=Lax", name)).ok()
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use xtrend_common::time;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    /// Turn `Set-Cookie` values into a `Cookie` request header
    fn echo(set_cookies: &[HeaderValue]) -> HeaderMap {
        let pairs: Vec<&str> = set_cookies
            .iter()
            .map(|v| v.to_str().unwrap().split(';').next().unwrap())
            .collect();
        headers(&pairs.join("; "))
    }

    #[test]
    fn test_missing_id_mints_guest() {
        let state = CookieStore.read(&HeaderMap::new());
        assert!(state.is_new);
        assert!(state.identity.id.starts_with("user-"));
        assert_eq!(state.identity.role, UserRole::Guest);
        assert!(state.profile.is_none());
    }

    #[test]
    fn test_reads_identity_and_locale() {
        let state = CookieStore.read(&headers(
            "xtrendai_user_id=user-42; xtrendai_user_role=pro; xtrendai_locale=en-US",
        ));
        assert!(!state.is_new);
        assert_eq!(state.identity, UserIdentity::new("user-42", UserRole::Pro));
        assert_eq!(state.locale, Some(Locale::EnUs));
    }

    #[test]
    fn test_malformed_entries_read_as_absent() {
        let state = CookieStore.read(&headers(
            "xtrendai_user_id=user-1; xtrendai_user_role=emperor; xtrendai_user_profile=%7Bnope; xtrendai_locale=xx",
        ));
        assert_eq!(state.identity.role, UserRole::Guest);
        assert!(state.profile.is_none());
        assert!(state.locale.is_none());
    }

    #[test]
    fn test_write_then_read_back() {
        let identity = UserIdentity::new("user-7", UserRole::Free);
        let profile = UserProfile::new(&identity, Utc::now());
        let mut usage = UsageRecord::empty(time::day_of(Utc::now()));
        usage.copy_count = 2;

        let cookies = CookieStore.write(&ClientUpdate {
            identity: Some(identity.clone()),
            profile: Some(profile.clone()),
            usage: Some(usage.clone()),
            locale: Some(Locale::EnUs),
        });
        assert_eq!(cookies.len(), 5);

        let state = CookieStore.read(&echo(&cookies));
        assert_eq!(state.identity, identity);
        assert_eq!(state.profile, Some(profile));
        assert_eq!(state.usage, Some(usage));
        assert_eq!(state.locale, Some(Locale::EnUs));
    }

    #[test]
    fn test_cookie_attributes() {
        let identity = UserIdentity::new("user-7", UserRole::Free);
        let cookies = CookieStore.write(&ClientUpdate {
            profile: Some(UserProfile::new(&identity, Utc::now())),
            ..ClientUpdate::default()
        });
        let cookie = cookies[0].to_str().unwrap();

        assert!(cookie.starts_with("xtrendai_user_profile=%7B"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains(&format!("Max-Age={}", 30 * DAY_SECS)));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_clear_expires_everything() {
        let cookies = CookieStore.clear();
        assert_eq!(cookies.len(), 5);
        assert!(cookies
            .iter()
            .all(|c| c.to_str().unwrap().contains("Max-Age=0")));
    }

    #[test]
    fn test_update_for_new_state_carries_identity() {
        let fresh = CookieStore.read(&HeaderMap::new());
        assert!(ClientUpdate::for_state(&fresh).identity.is_some());

        let known = CookieStore.read(&headers("xtrendai_user_id=user-1"));
        assert!(ClientUpdate::for_state(&known).is_empty());
    }
}
