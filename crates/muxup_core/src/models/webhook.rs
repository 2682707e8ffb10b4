//! Mux webhook notifications and how they map onto asset records.

use super::asset::AssetChanges;
use crate::query::{AssetField, Filter};
use serde::Deserialize;

/// Envelope of a Mux webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

/// The `data` object; an asset or an upload depending on the event type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    pub id: String,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    pub duration: Option<f64>,
    pub aspect_ratio: Option<String>,
    /// Asset failures.
    pub errors: Option<AssetErrors>,
    /// Upload failures.
    pub error: Option<UploadError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetErrors {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadError {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
}

/// A record change derived from a webhook.
///
/// `lookups` are tried in order; the first filter that matches a record wins.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub lookups: Vec<Filter>,
    pub changes: AssetChanges,
}

impl WebhookEvent {
    /// Translate the event into a record update, or `None` for event types
    /// that do not touch local state.
    pub fn status_update(&self) -> Option<StatusUpdate> {
        let data = &self.data;
        match self.kind.as_str() {
            "video.upload.asset_created" => {
                let asset_id = data.asset_id.clone()?;
                Some(StatusUpdate {
                    lookups: vec![Filter::eq(AssetField::UploadId, &data.id)],
                    changes: AssetChanges {
                        asset_id: Some(asset_id),
                        ..AssetChanges::default()
                    },
                })
            }
            "video.asset.created" => {
                let upload_id = data.upload_id.as_deref()?;
                Some(StatusUpdate {
                    lookups: vec![Filter::eq(AssetField::UploadId, upload_id)],
                    changes: AssetChanges {
                        asset_id: Some(data.id.clone()),
                        ..AssetChanges::default()
                    },
                })
            }
            "video.asset.ready" => Some(StatusUpdate {
                lookups: asset_lookups(data),
                changes: AssetChanges {
                    is_ready: Some(true),
                    asset_id: Some(data.id.clone()),
                    playback_id: data.playback_ids.first().map(|p| p.id.clone()),
                    duration: data.duration,
                    aspect_ratio: data.aspect_ratio.clone(),
                    ..AssetChanges::default()
                },
            }),
            "video.asset.errored" => Some(StatusUpdate {
                lookups: asset_lookups(data),
                changes: AssetChanges {
                    is_ready: Some(false),
                    asset_id: Some(data.id.clone()),
                    error_message: Some(asset_error_message(data.errors.as_ref())),
                    ..AssetChanges::default()
                },
            }),
            "video.upload.errored" => Some(StatusUpdate {
                lookups: vec![Filter::eq(AssetField::UploadId, &data.id)],
                changes: AssetChanges {
                    error_message: Some(
                        data.error
                            .as_ref()
                            .and_then(|err| err.message.clone().or_else(|| err.kind.clone()))
                            .unwrap_or_else(|| "Upload failed".to_string()),
                    ),
                    ..AssetChanges::default()
                },
            }),
            "video.upload.cancelled" => Some(StatusUpdate {
                lookups: vec![Filter::eq(AssetField::UploadId, &data.id)],
                changes: AssetChanges {
                    error_message: Some("Upload cancelled".to_string()),
                    ..AssetChanges::default()
                },
            }),
            _ => None,
        }
    }
}

fn asset_lookups(data: &WebhookData) -> Vec<Filter> {
    let mut lookups = vec![Filter::eq(AssetField::AssetId, &data.id)];
    if let Some(upload_id) = data.upload_id.as_deref() {
        lookups.push(Filter::eq(AssetField::UploadId, upload_id));
    }
    lookups
}

fn asset_error_message(errors: Option<&AssetErrors>) -> String {
    let Some(errors) = errors else {
        return "Asset processing failed".to_string();
    };
    if !errors.messages.is_empty() {
        return errors.messages.join("; ");
    }
    errors
        .kind
        .clone()
        .unwrap_or_else(|| "Asset processing failed".to_string())
}
