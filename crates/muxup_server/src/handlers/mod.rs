//! HTTP request handlers.

use axum::Json;
use serde_json::{json, Value};

/// Asset record endpoints.
pub mod asset;
/// JSON-or-multipart request bodies.
pub mod form;
/// Mux credential endpoints.
pub mod settings;
/// Upload submission and remote deletion.
pub mod upload;
/// Mux webhook receiver.
pub mod webhook;

/// Liveness check for the plugin root.
pub async fn index() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}
