//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY framework-independent types: the response
//! envelope and the error code table. The service crate wraps these with
//! axum responses.

pub mod types;

pub use types::{ApiEnvelope, ErrorBody, ErrorCode, ErrorEnvelope};
