//! Scenarios, locales and generated tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserRole;
use crate::Error;

/// Category of task template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scenario {
    Pod,
    Content,
    Marketing,
    Development,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Pod,
        Scenario::Content,
        Scenario::Marketing,
        Scenario::Development,
    ];

    /// Wire identifier (also the template key segment)
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Pod => "POD",
            Scenario::Content => "CONTENT",
            Scenario::Marketing => "MARKETING",
            Scenario::Development => "DEVELOPMENT",
        }
    }

    /// Localized display name
    pub fn display_name(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Scenario::Pod, Locale::ZhCn) => "POD按需打印",
            (Scenario::Pod, Locale::EnUs) => "POD Design",
            (Scenario::Content, Locale::ZhCn) => "内容创作",
            (Scenario::Content, Locale::EnUs) => "Content Creation",
            (Scenario::Marketing, Locale::ZhCn) => "营销文案",
            (Scenario::Marketing, Locale::EnUs) => "Marketing Copy",
            (Scenario::Development, Locale::ZhCn) => "快速开发",
            (Scenario::Development, Locale::EnUs) => "Quick Development",
        }
    }

    /// Roles allowed to pick this scenario (admin always may)
    pub fn available_for(&self) -> &'static [UserRole] {
        match self {
            Scenario::Pod => &[UserRole::Guest, UserRole::Free, UserRole::Pro],
            Scenario::Content | Scenario::Marketing => &[UserRole::Free, UserRole::Pro],
            Scenario::Development => &[UserRole::Pro],
        }
    }

    pub fn is_available_for(&self, role: UserRole) -> bool {
        role == UserRole::Admin || self.available_for().contains(&role)
    }

    /// Number of snippets generated per trend
    pub fn task_count(&self) -> usize {
        match self {
            Scenario::Pod => 4,
            Scenario::Content => 2,
            Scenario::Marketing => 3,
            Scenario::Development => 2,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown scenario: {}", s)))
    }
}

/// UI / template language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::ZhCn, Locale::EnUs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::ZhCn => "zh-CN",
            Locale::EnUs => "en-US",
        }
    }

    pub fn is_chinese(&self) -> bool {
        matches!(self, Locale::ZhCn)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unsupported locale: {}", s)))
    }
}

/// Generated text snippet for one trend and scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub trend_id: String,
    pub scenario: Scenario,
    #[serde(rename = "type")]
    pub task_type: String,
    pub title: String,
    pub content: String,
    /// Character count of `content`
    pub word_count: usize,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
}

/// Tasks grouped under their scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTasks {
    pub scenario: Scenario,
    pub scenario_name: String,
    pub tasks: Vec<Task>,
}
