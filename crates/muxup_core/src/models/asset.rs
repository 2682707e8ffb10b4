//! Asset records tracked locally for videos hosted on Mux.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local identifier of an asset record. Assigned on create, never changes.
pub type AssetId = u64;

/// Asset row stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MuxAsset {
    pub id: AssetId,
    pub title: String,
    #[serde(rename = "isReady")]
    pub is_ready: bool,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub error_message: Option<String>,
    pub duration: Option<f64>,
    pub aspect_ratio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewMuxAsset {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "isReady", default)]
    pub is_ready: bool,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub error_message: Option<String>,
    pub duration: Option<f64>,
    pub aspect_ratio: Option<String>,
}

/// Partial change set applied by the entity service.
///
/// Has no `id`: identifiers are immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetChanges {
    pub title: Option<String>,
    pub is_ready: Option<bool>,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub error_message: Option<String>,
    pub duration: Option<f64>,
    pub aspect_ratio: Option<String>,
}

/// Request payload for `PUT /mux-asset/{id}`.
///
/// Only `title` and `isReady` are read; serde drops every other key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetRequest {
    pub title: Option<String>,
    #[serde(rename = "isReady")]
    pub is_ready: Option<bool>,
}

/// Partial record sent by the editor; unset fields are omitted from the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetPatch {
    pub id: AssetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "isReady", skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
}

/// One page of listing results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPage {
    pub items: Vec<MuxAsset>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
}

impl MuxAsset {
    /// Build a fresh record for `id` from a create payload.
    pub fn from_new(id: AssetId, data: NewMuxAsset) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: data.title,
            is_ready: data.is_ready,
            upload_id: data.upload_id,
            asset_id: data.asset_id,
            playback_id: data.playback_id,
            error_message: data.error_message,
            duration: data.duration,
            aspect_ratio: data.aspect_ratio,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `changes` in place and bump `updated_at`.
    pub fn apply(&mut self, changes: AssetChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(is_ready) = changes.is_ready {
            self.is_ready = is_ready;
        }
        if changes.upload_id.is_some() {
            self.upload_id = changes.upload_id;
        }
        if changes.asset_id.is_some() {
            self.asset_id = changes.asset_id;
        }
        if changes.playback_id.is_some() {
            self.playback_id = changes.playback_id;
        }
        if changes.error_message.is_some() {
            self.error_message = changes.error_message;
        }
        if changes.duration.is_some() {
            self.duration = changes.duration;
        }
        if changes.aspect_ratio.is_some() {
            self.aspect_ratio = changes.aspect_ratio;
        }
        self.updated_at = Utc::now();
    }
}

impl From<UpdateAssetRequest> for AssetChanges {
    fn from(value: UpdateAssetRequest) -> Self {
        Self {
            title: value.title,
            is_ready: value.is_ready,
            ..Self::default()
        }
    }
}

impl AssetPatch {
    /// Empty patch for `id`.
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            title: None,
            is_ready: None,
        }
    }
}

/// Parse a form-encoded boolean (`true`/`false`, `1`/`0`, `on`/`off`).
pub fn parse_form_bool(value: &str) -> Option<bool> {
    crate::config::parse_env_flag(value)
}
