//! # API Shared
//!
//! Shared definitions for the filedrop APIs.
//!
//! Contains:
//! - Request/response bodies (`types` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` for common functionality.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
