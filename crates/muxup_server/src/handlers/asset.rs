//! Asset record endpoints: the entity proxy.

use super::form::{FormFields, FromFormFields, JsonOrForm};
use crate::{
    error::{ApiPath, ApiQuery, HttpError},
    models::asset::{
        parse_form_bool, AssetChanges, AssetId, AssetPage, MuxAsset, NewMuxAsset,
        UpdateAssetRequest,
    },
    query::AssetListQuery,
    AppError, AppState,
};
use axum::{extract::State, Json};

impl FromFormFields for NewMuxAsset {
    /// Multipart creates carry the record as JSON in a `data` part.
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        let data = form.required("data")?;
        serde_json::from_str(data)
            .map_err(|err| AppError::BadRequest(format!("Invalid 'data' field: {}", err)))
    }
}

impl FromFormFields for UpdateAssetRequest {
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        let is_ready = match form.text("isReady") {
            Some(raw) => Some(parse_form_bool(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid 'isReady' value: '{}'", raw))
            })?),
            None => None,
        };
        Ok(Self {
            title: form.text("title").map(str::to_string),
            is_ready,
        })
    }
}

/// List records with filter, ordering and pagination, plus the total count
/// of the filtered set.
///
/// # Errors
/// Returns an error if either storage read fails.
pub async fn find(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AssetListQuery>,
) -> Result<Json<AssetPage>, HttpError> {
    let params = query.find_params();
    let items = state.assets.find_many(&params)?;
    // Separate read; see `EntityService` on the consistency window.
    let total_count = state.assets.count(params.filter.as_ref())?;
    Ok(Json(AssetPage { items, total_count }))
}

/// Count records matching the optional `filter` parameter.
pub async fn count(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AssetListQuery>,
) -> Result<Json<usize>, HttpError> {
    Ok(Json(state.assets.count(query.filter().as_ref())?))
}

/// Fetch a record by id.
///
/// # Errors
/// Returns 404 when the record does not exist.
pub async fn find_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AssetId>,
) -> Result<Json<MuxAsset>, HttpError> {
    state
        .assets
        .find_one(id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

/// Create a record from a JSON body or a multipart body with a `data` part.
///
/// # Errors
/// Returns 400 when the title is empty or the body cannot be parsed.
pub async fn create(
    State(state): State<AppState>,
    payload: JsonOrForm<NewMuxAsset>,
) -> Result<Json<MuxAsset>, HttpError> {
    for attachment in &payload.attachments {
        tracing::warn!(
            field = %attachment.field,
            file_name = %attachment.file_name,
            bytes = attachment.len,
            "ignoring attachment: asset records have no media attribute"
        );
    }

    let data = payload.value;
    if data.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()).into());
    }
    Ok(Json(state.assets.create(data)?))
}

/// Update the title and/or readiness of a record.
///
/// Every other submitted field is dropped before reaching storage.
///
/// # Errors
/// Returns 404 when the record does not exist.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AssetId>,
    payload: JsonOrForm<UpdateAssetRequest>,
) -> Result<Json<MuxAsset>, HttpError> {
    let changes = AssetChanges::from(payload.value);
    tracing::debug!(id, ?changes, "updating asset");
    state
        .assets
        .update(id, changes)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

/// Delete a local record by id. Does not touch Mux.
///
/// # Errors
/// Returns 404 when the record does not exist.
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AssetId>,
) -> Result<Json<MuxAsset>, HttpError> {
    state
        .assets
        .delete(id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound.into())
}

#[cfg(test)]
mod tests {
    use super::FromFormFields;
    use crate::handlers::form::FormFields;
    use crate::models::asset::{NewMuxAsset, UpdateAssetRequest};

    #[test]
    fn update_form_reads_only_title_and_readiness() {
        let form = FormFields::from_pairs(&[
            ("title", "Renamed"),
            ("isReady", "true"),
            ("asset_id", "ignored"),
        ]);
        let req = UpdateAssetRequest::from_form(&form).expect("parse");
        assert_eq!(req.title.as_deref(), Some("Renamed"));
        assert_eq!(req.is_ready, Some(true));
    }

    #[test]
    fn update_form_rejects_unparseable_readiness() {
        let form = FormFields::from_pairs(&[("isReady", "sometimes")]);
        assert!(UpdateAssetRequest::from_form(&form).is_err());
    }

    #[test]
    fn create_form_requires_json_data_part() {
        let missing = FormFields::from_pairs(&[("title", "x")]);
        assert!(NewMuxAsset::from_form(&missing).is_err());

        let form = FormFields::from_pairs(&[("data", r#"{"title":"From form","isReady":true}"#)]);
        let data = NewMuxAsset::from_form(&form).expect("parse");
        assert_eq!(data.title, "From form");
        assert!(data.is_ready);
    }
}
