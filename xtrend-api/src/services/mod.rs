//! Business logic behind the HTTP routes
//!
//! - [`trends`]: cached trend acquisition
//! - [`ranking`]: personalization and filtering (pure)
//! - [`tasks`]: templated task generation (pure)
//! - [`i18n`]: locale catalogs
//! - [`quota`]: role limits and usage checks (pure)

pub mod i18n;
pub mod quota;
pub mod ranking;
pub mod tasks;
pub mod trends;

pub use i18n::Catalog;
pub use quota::QuotaError;
pub use ranking::FilterOptions;
pub use trends::TrendService;
