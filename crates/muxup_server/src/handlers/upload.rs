//! Upload submission and remote deletion.

use super::form::{FormFields, FromFormFields, JsonOrForm};
use crate::{
    error::HttpError,
    models::{
        asset::{parse_form_bool, AssetId, MuxAsset, NewMuxAsset},
        upload::{DeleteOutcome, DirectUploadTicket},
    },
    AppError, AppState,
};
use axum::{extract::State, Json};
use serde::Deserialize;

/// Body of `submitRemoteUpload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUploadRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Body of `submitDirectUpload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectUploadRequest {
    #[serde(default)]
    pub title: String,
}

/// Body of `deleteMuxAsset`. Blank identifiers count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAssetRequest {
    pub id: AssetId,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub delete_on_mux: bool,
}

impl FromFormFields for RemoteUploadRequest {
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        Ok(Self {
            title: form.text("title").unwrap_or_default().to_string(),
            url: form.text("url").unwrap_or_default().to_string(),
        })
    }
}

impl FromFormFields for DirectUploadRequest {
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        Ok(Self {
            title: form.text("title").unwrap_or_default().to_string(),
        })
    }
}

impl FromFormFields for DeleteAssetRequest {
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        let raw_id = form.required("id")?;
        let id = raw_id
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid 'id' value: '{}'", raw_id)))?;
        let delete_on_mux = match form.text("delete_on_mux") {
            Some(raw) => parse_form_bool(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid 'delete_on_mux' value: '{}'", raw))
            })?,
            None => false,
        };
        Ok(Self {
            id,
            asset_id: form.non_empty("asset_id"),
            upload_id: form.non_empty("upload_id"),
            delete_on_mux,
        })
    }
}

fn required_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    Ok(title.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A submitted Mux identifier must name the record's own identifier.
fn ensure_same_identifier(
    field: &str,
    submitted: Option<String>,
    stored: Option<&str>,
) -> Result<(), AppError> {
    match non_blank(submitted) {
        Some(value) if Some(value.as_str()) != stored => Err(AppError::BadRequest(format!(
            "'{}' does not match the record",
            field
        ))),
        _ => Ok(()),
    }
}

/// Ask Mux to ingest a video from a public URL and track it locally.
///
/// # Returns
/// The newly created record, not yet ready.
///
/// # Errors
/// Returns 400 on a blank title or URL, 412 without credentials, and 502 when
/// Mux rejects the request.
pub async fn submit_remote_upload(
    State(state): State<AppState>,
    payload: JsonOrForm<RemoteUploadRequest>,
) -> Result<Json<MuxAsset>, HttpError> {
    let request = payload.value;
    let title = required_title(&request.title)?;
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("A video url is required".to_string()).into());
    }

    let credentials = state.mux_credentials()?;
    let remote = state.mux.create_asset(&credentials, url).await?;
    tracing::info!(asset_id = %remote.id, "Mux asset created from url");

    let asset = state.assets.create(NewMuxAsset {
        title,
        asset_id: Some(remote.id),
        ..NewMuxAsset::default()
    })?;
    Ok(Json(asset))
}

/// Open a Mux direct upload and track it locally.
///
/// # Returns
/// The signed upload URL together with the record created for it.
///
/// # Errors
/// Returns 400 on a blank title, 412 without credentials, and 502 when Mux
/// rejects the request.
pub async fn submit_direct_upload(
    State(state): State<AppState>,
    payload: JsonOrForm<DirectUploadRequest>,
) -> Result<Json<DirectUploadTicket>, HttpError> {
    let title = required_title(&payload.value.title)?;

    let credentials = state.mux_credentials()?;
    let upload = state
        .mux
        .create_direct_upload(&credentials, &state.config.mux_cors_origin)
        .await?;
    tracing::info!(upload_id = %upload.id, "Mux direct upload created");

    let asset = state.assets.create(NewMuxAsset {
        title,
        upload_id: Some(upload.id.clone()),
        asset_id: upload.asset_id,
        ..NewMuxAsset::default()
    })?;
    Ok(Json(DirectUploadTicket {
        upload_id: upload.id,
        url: upload.url,
        asset,
    }))
}

/// Delete a record, optionally removing its Mux asset first.
///
/// With `delete_on_mux`, the record's Mux asset is deleted when it has an
/// asset id; otherwise its pending upload is cancelled. The local record is
/// only removed after the remote call succeeds.
///
/// # Errors
/// Returns 404 for an unknown record, 400 when a submitted `asset_id` or
/// `upload_id` differs from the record's, 412 without credentials when a
/// remote delete is requested, and 502 when Mux rejects the request.
pub async fn delete_mux_asset(
    State(state): State<AppState>,
    payload: JsonOrForm<DeleteAssetRequest>,
) -> Result<Json<DeleteOutcome>, HttpError> {
    let request = payload.value;
    let record = state
        .assets
        .find_one(request.id)?
        .ok_or(AppError::NotFound)?;
    ensure_same_identifier("asset_id", request.asset_id, record.asset_id.as_deref())?;
    ensure_same_identifier("upload_id", request.upload_id, record.upload_id.as_deref())?;

    let mut deleted_on_mux = false;
    if request.delete_on_mux {
        match (record.asset_id.clone(), record.upload_id.clone()) {
            (Some(asset_id), _) => {
                let credentials = state.mux_credentials()?;
                state.mux.delete_asset(&credentials, &asset_id).await?;
                tracing::info!(id = record.id, %asset_id, "Mux asset deleted");
                deleted_on_mux = true;
            }
            (None, Some(upload_id)) => {
                let credentials = state.mux_credentials()?;
                state.mux.cancel_upload(&credentials, &upload_id).await?;
                tracing::info!(id = record.id, %upload_id, "Mux upload cancelled");
                deleted_on_mux = true;
            }
            (None, None) => {
                tracing::warn!(id = record.id, "no Mux identifiers on record; deleting locally only");
            }
        }
    }

    state.assets.delete(record.id)?;
    Ok(Json(DeleteOutcome {
        success: true,
        deleted_on_mux,
    }))
}
