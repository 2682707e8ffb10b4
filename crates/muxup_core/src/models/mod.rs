//! Data models for API requests and persistence.

/// Asset records and request payloads.
pub mod asset;
/// Stored Mux credentials.
pub mod settings;
/// Upload and remote-delete responses.
pub mod upload;
/// Mux webhook notification payloads.
pub mod webhook;
