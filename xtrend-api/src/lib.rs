//! xtrend-api library interface
//!
//! Trending-topic service: fetches trends from a mock, X API or MCP
//! backend, ranks them per user profile and generates templated task
//! suggestions. Exposed as a library so integration tests can build the
//! router directly.

pub mod api;
pub mod cache;
pub mod error;
pub mod services;
pub mod session;
pub mod sources;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use xtrend_common::config::ServiceConfig;
use xtrend_common::models::Locale;

use services::{Catalog, TrendService};
use session::{ClientStore, CookieStore};
use sources::{create_source, RetryPolicy, SourceKind, TrendSource, XApiSource};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Cached trend acquisition over the configured source
    pub trends: Arc<TrendService>,
    pub catalog: Arc<Catalog>,
    /// Where per-user state is read from and written to
    pub store: Arc<dyn ClientStore>,
    /// Direct X API access for `/api/x-proxy`, when a bearer token is set
    pub x_api: Option<Arc<XApiSource>>,
    pub default_locale: Locale,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State over an explicit trend source
    pub fn new(
        source: Arc<dyn TrendSource>,
        x_api: Option<Arc<XApiSource>>,
        config: &ServiceConfig,
    ) -> ApiResult<Self> {
        let default_locale = config.default_locale.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid default_locale, using zh-CN");
            Locale::default()
        });

        Ok(Self {
            trends: Arc::new(TrendService::new(source, config.cache.ttl())),
            catalog: Arc::new(Catalog::embedded()?),
            store: Arc::new(CookieStore::new()),
            x_api,
            default_locale,
            startup_time: Utc::now(),
        })
    }

    /// State with the source selected by configuration
    ///
    /// When the X API is the trend source, the proxy route shares its
    /// rate-limit bookkeeping.
    pub fn from_config(config: &ServiceConfig) -> ApiResult<Self> {
        let x_api = if config.x_api.has_bearer_token() {
            let policy = RetryPolicy::from_config(&config.retry);
            Some(Arc::new(XApiSource::from_config(&config.x_api, policy)?))
        } else {
            None
        };

        let source: Arc<dyn TrendSource> = match (config.data_source_kind(), &x_api) {
            (SourceKind::XApi, Some(x_api)) => x_api.clone(),
            _ => create_source(config)?,
        };

        Self::new(source, x_api, config)
    }

    pub fn data_source(&self) -> SourceKind {
        self.trends.source_kind()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::trend_routes())
        .merge(api::task_routes())
        .merge(api::user_routes())
        .merge(api::i18n_routes())
        .merge(api::x_proxy_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for browser clients
        .layer(CorsLayer::permissive())
}
