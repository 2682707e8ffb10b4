//! Mux credential endpoints.

use super::form::{FormFields, FromFormFields, JsonOrForm};
use crate::{
    error::HttpError,
    models::settings::{MuxSettings, SettingsStatus},
    AppError, AppState,
};
use axum::{extract::State, Json};

impl FromFormFields for MuxSettings {
    fn from_form(form: &FormFields) -> Result<Self, AppError> {
        Ok(Self {
            access_token: form.text("access_token").unwrap_or_default().to_string(),
            secret_key: form.text("secret_key").unwrap_or_default().to_string(),
            webhook_signing_secret: form.non_empty("webhook_signing_secret"),
        })
    }
}

fn is_configured<T>(credentials: Result<T, AppError>) -> Result<bool, AppError> {
    match credentials {
        Ok(_) => Ok(true),
        Err(AppError::NotConfigured) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Report whether Mux credentials are available.
///
/// # Errors
/// Returns an error if the stored settings cannot be read.
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsStatus>, HttpError> {
    let configured = is_configured(state.mux_credentials())?;
    Ok(Json(SettingsStatus { configured }))
}

/// Store Mux credentials.
///
/// # Errors
/// Returns 400 when either credential is blank.
pub async fn set_settings(
    State(state): State<AppState>,
    payload: JsonOrForm<MuxSettings>,
) -> Result<Json<SettingsStatus>, HttpError> {
    let mut settings = payload.value;
    if !settings.is_complete() {
        return Err(
            AppError::BadRequest("access_token and secret_key are required".to_string()).into(),
        );
    }
    settings.access_token = settings.access_token.trim().to_string();
    settings.secret_key = settings.secret_key.trim().to_string();
    settings.webhook_signing_secret = settings
        .webhook_signing_secret
        .map(|secret| secret.trim().to_string())
        .filter(|secret| !secret.is_empty());

    state.settings.put(&settings)?;
    tracing::info!("Mux settings updated");
    Ok(Json(SettingsStatus { configured: true }))
}
