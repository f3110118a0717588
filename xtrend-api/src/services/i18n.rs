//! Locale catalogs
//!
//! Catalogs are embedded at build time (`locales/*.json`). Keys are dotted
//! paths into the JSON tree (`templates.POD.tshirt`); values may contain
//! `{name}` placeholders.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use xtrend_common::models::Locale;
use xtrend_common::{Error, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

const ZH_CN: &str = include_str!("../../locales/zh-CN.json");
const EN_US: &str = include_str!("../../locales/en-US.json");

/// All locale catalogs
#[derive(Debug, Clone)]
pub struct Catalog {
    catalogs: HashMap<Locale, Value>,
}

impl Catalog {
    /// Catalog over the embedded locale files
    pub fn embedded() -> Result<Self> {
        Self::from_sources(&[(Locale::ZhCn, ZH_CN), (Locale::EnUs, EN_US)])
    }

    pub fn from_sources(sources: &[(Locale, &str)]) -> Result<Self> {
        let mut catalogs = HashMap::new();
        for (locale, json) in sources {
            let value: Value = serde_json::from_str(json).map_err(|e| {
                Error::Config(format!("Invalid {} locale catalog: {}", locale, e))
            })?;
            catalogs.insert(*locale, value);
        }
        Ok(Self { catalogs })
    }

    /// String at a dotted key; `None` if missing or not a string
    pub fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(self.catalogs.get(&locale)?, |node, part| node.get(part))?
            .as_str()
    }

    /// Rendered string at `key`, or the key itself when missing
    pub fn translate(&self, locale: Locale, key: &str, params: &[(&str, &str)]) -> String {
        match self.lookup(locale, key) {
            Some(template) => render(template, params),
            None => key.to_string(),
        }
    }

    /// Whole catalog tree for a locale
    pub fn bundle(&self, locale: Locale) -> Option<&Value> {
        self.catalogs.get(&locale)
    }
}

/// Replace `{name}` placeholders; unknown names are left verbatim
pub fn render<V: AsRef<str>>(template: &str, params: &[(&str, V)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_ref().to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
