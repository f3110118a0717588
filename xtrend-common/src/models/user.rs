//! User identity and profile types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::task::Scenario;
use crate::Error;

/// Account tier controlling quota limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Guest,
    Free,
    Pro,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Free => "free",
            UserRole::Pro => "pro",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(UserRole::Guest),
            "free" => Ok(UserRole::Free),
            "pro" => Ok(UserRole::Pro),
            "admin" => Ok(UserRole::Admin),
            other => Err(Error::InvalidInput(format!("unknown role: {}", other))),
        }
    }
}

/// Profile region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Cn,
    Uk,
    Jp,
    #[default]
    Global,
}

impl Region {
    pub const ALL: [Region; 5] = [Region::Us, Region::Cn, Region::Uk, Region::Jp, Region::Global];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Cn => "cn",
            Region::Uk => "uk",
            Region::Jp => "jp",
            Region::Global => "global",
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Region::Global)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown region: {}", s)))
    }
}

/// Age bracket used for demographic weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-24")]
    From18To24,
    #[default]
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45+")]
    Over45,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::From18To24 => "18-24",
            AgeGroup::From25To34 => "25-34",
            AgeGroup::From35To44 => "35-44",
            AgeGroup::Over45 => "45+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ethnicity {
    Asian,
    Black,
    Hispanic,
    White,
    Other,
}

/// Who is making the request
///
/// Carried entirely client-side; the role is whatever the client presents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub role: UserRole,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.role == UserRole::Guest
    }
}

/// Personalization profile saved by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub role: UserRole,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub age_group: AgeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<Ethnicity>,
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<Scenario>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_scenarios() -> Vec<Scenario> {
    vec![Scenario::Pod]
}

impl UserProfile {
    /// Fresh profile with default preferences
    pub fn new(identity: &UserIdentity, now: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.id.clone(),
            role: identity.role,
            region: Region::default(),
            age_group: AgeGroup::default(),
            ethnicity: None,
            scenarios: default_scenarios(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_str() {
        for role in [UserRole::Guest, UserRole::Free, UserRole::Pro, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("jp".parse::<Region>().unwrap(), Region::Jp);
        assert!("mars".parse::<Region>().is_err());
    }

    #[test]
    fn test_age_group_wire_names() {
        let json = serde_json::to_string(&AgeGroup::Over45).unwrap();
        assert_eq!(json, "\"45+\"");
        let parsed: AgeGroup = serde_json::from_str("\"18-24\"").unwrap();
        assert_eq!(parsed, AgeGroup::From18To24);
    }

    #[test]
    fn test_profile_defaults_on_partial_json() {
        let json = r#"{
            "userId": "user-1",
            "role": "free",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.region, Region::Global);
        assert_eq!(profile.age_group, AgeGroup::From25To34);
        assert_eq!(profile.scenarios, vec![Scenario::Pod]);
        assert!(profile.ethnicity.is_none());
    }
}
