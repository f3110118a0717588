//! # XTrend Common Library
//!
//! Shared code for the XTrend service crates including:
//! - Domain models (trends, user profiles, quotas, tasks)
//! - API envelope types
//! - Configuration loading and data source selection
//! - Time helpers for daily quota windows

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
