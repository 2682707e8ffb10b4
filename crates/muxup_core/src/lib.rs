//! Core domain library for muxup (config, storage, models, query translation).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across crates.
pub mod constants;
/// Database access layer backed by redb.
pub mod db;
/// Generic entity-service contract the HTTP layer proxies to.
pub mod entity;
/// Process-global environment helpers (used by tests).
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Data models for API requests and persistence.
pub mod models;
/// Query-string to filter/order translation.
pub mod query;

pub use config::Config;
pub use constants::{DEFAULT_CLI_SERVER_URL, DEFAULT_PORT};
pub use db::Database;
pub use entity::EntityService;
pub use error::AppError;
