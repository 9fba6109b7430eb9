//! Bookshop Common Library
//!
//! Shared code for the Bookshop services including:
//! - Database models, schema bootstrap and repository
//! - Library and shop query helpers
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability
//! - Fixture data

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod queries;
pub mod seed;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
