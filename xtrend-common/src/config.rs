//! Configuration loading and data source selection
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority, applied by the binary)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts with defaults. A TOML file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "XTREND_CONFIG";

// ============================================================================
// Data Source Selection
// ============================================================================

/// Which trend backend the service talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Mock,
    XApi,
    Mcp,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Mock => "mock",
            DataSourceKind::XApi => "xapi",
            DataSourceKind::Mcp => "mcp",
        }
    }

    /// Pick a data source
    ///
    /// **Priority:**
    /// 1. Explicit override (`mock`, `xapi`, `mcp`); `xapi` without a bearer
    ///    token falls back to `mock`
    /// 2. Bearer token present → `xapi`
    /// 3. MCP server URL present → `mcp`
    /// 4. `mock`
    pub fn select(
        explicit: Option<&str>,
        bearer_token: Option<&str>,
        mcp_server_url: Option<&str>,
    ) -> Self {
        let has_token = bearer_token.map(is_present).unwrap_or(false);
        let has_mcp = mcp_server_url.map(is_present).unwrap_or(false);

        match explicit.map(|s| s.parse::<DataSourceKind>()) {
            Some(Ok(DataSourceKind::XApi)) if !has_token => {
                warn!("Data source 'xapi' requested but no bearer token configured, falling back to mock");
                DataSourceKind::Mock
            }
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                warn!("Ignoring data source override: {}", e);
                Self::auto_detect(has_token, has_mcp)
            }
            None => Self::auto_detect(has_token, has_mcp),
        }
    }

    fn auto_detect(has_token: bool, has_mcp: bool) -> Self {
        if has_token {
            DataSourceKind::XApi
        } else if has_mcp {
            DataSourceKind::Mcp
        } else {
            DataSourceKind::Mock
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(DataSourceKind::Mock),
            "xapi" => Ok(DataSourceKind::XApi),
            "mcp" => Ok(DataSourceKind::Mcp),
            other => Err(Error::Config(format!("unknown data source: {}", other))),
        }
    }
}

/// Non-empty, non-whitespace
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

// ============================================================================
// TOML Schema
// ============================================================================

/// Service configuration
///
/// Every section is optional in the TOML file; absent keys take the
/// compiled defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Explicit data source override (`mock`, `xapi`, `mcp`)
    #[serde(default)]
    pub data_source: Option<String>,

    /// Locale used when a request names none
    #[serde(default = "default_locale")]
    pub default_locale: String,

    #[serde(default)]
    pub x_api: XApiConfig,

    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub mock: MockConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// X (Twitter) API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XApiConfig {
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Override for the v1.1 API root (tests point this at a local server)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl XApiConfig {
    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.as_deref().map(is_present).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub server_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Trend list time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n × base_delay_ms`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated network latency for mock lookups
    #[serde(default = "default_mock_latency_ms")]
    pub latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_mock_latency_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_locale() -> String {
    "zh-CN".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_attempt_timeout_ms() -> u64 {
    10_000
}

fn default_mock_latency_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            data_source: None,
            default_locale: default_locale(),
            x_api: XApiConfig::default(),
            mcp: McpConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            mock: MockConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl ServiceConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load a TOML file, or defaults if it does not exist
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {}, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Full resolution: TOML file (explicit path, `XTREND_CONFIG`, or the
    /// platform config directory) overlaid with environment variables
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(explicit_path) {
            Some(path) => Self::load_file(&path)?,
            None => {
                warn!("No config directory available, using compiled defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`
    ///
    /// Recognized: `USE_DATA_SOURCE`, `X_BEARER_TOKEN`, `X_API_KEY`,
    /// `X_API_SECRET`, `X_API_BASE_URL`, `MCP_SERVER_URL`, `XTREND_PORT`,
    /// `XTREND_LOG_LEVEL`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| is_present(v));

        if let Some(source) = present("USE_DATA_SOURCE") {
            self.data_source = Some(source);
        }
        if let Some(token) = present("X_BEARER_TOKEN") {
            self.x_api.bearer_token = Some(token);
        }
        if let Some(key) = present("X_API_KEY") {
            self.x_api.api_key = Some(key);
        }
        if let Some(secret) = present("X_API_SECRET") {
            self.x_api.api_secret = Some(secret);
        }
        if let Some(url) = present("X_API_BASE_URL") {
            self.x_api.base_url = Some(url);
        }
        if let Some(url) = present("MCP_SERVER_URL") {
            self.mcp.server_url = Some(url);
        }
        if let Some(port) = present("XTREND_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid XTREND_PORT value: {}", port),
            }
        }
        if let Some(level) = present("XTREND_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Data source after override and auto-detection
    pub fn data_source_kind(&self) -> DataSourceKind {
        DataSourceKind::select(
            self.data_source.as_deref(),
            self.x_api.bearer_token.as_deref(),
            self.mcp.server_url.as_deref(),
        )
    }

    /// Check values that would make the service misbehave
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if self.retry.attempt_timeout_ms == 0 {
            return Err(Error::Config(
                "retry.attempt_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            warn!("cache.ttl_secs is 0: every request will hit the data source");
        }
        Ok(())
    }
}

/// Config file location
///
/// **Priority:** explicit path → `XTREND_CONFIG` → `<config_dir>/xtrend/config.toml`
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if is_present(&path) {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("xtrend").join("config.toml"))
}
