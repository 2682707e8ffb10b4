//! Client for the Mux Video REST API.
//!
//! Each call is a single request: no retry, no backoff. Handlers depend on the
//! [`MuxApi`] trait so tests can swap in a fake.

use crate::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Basic-auth credentials for the Mux API.
#[derive(Clone, PartialEq, Eq)]
pub struct MuxCredentials {
    pub access_token: String,
    pub secret_key: String,
}

impl fmt::Debug for MuxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuxCredentials")
            .field("access_token", &self.access_token)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Asset object as returned by `POST /video/v1/assets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAsset {
    pub id: String,
    pub status: Option<String>,
}

/// Direct upload object as returned by `POST /video/v1/uploads`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectUpload {
    pub id: String,
    pub url: String,
    pub status: Option<String>,
    pub asset_id: Option<String>,
}

/// Mux wraps every payload in `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Operations the admin server needs from Mux.
#[async_trait]
pub trait MuxApi: Send + Sync {
    /// Create an asset that Mux fetches from `input_url`.
    async fn create_asset(
        &self,
        credentials: &MuxCredentials,
        input_url: &str,
    ) -> Result<RemoteAsset, AppError>;

    /// Create a signed URL the browser or CLI can PUT a file to.
    async fn create_direct_upload(
        &self,
        credentials: &MuxCredentials,
        cors_origin: &str,
    ) -> Result<DirectUpload, AppError>;

    /// Delete an asset. A missing asset counts as deleted.
    async fn delete_asset(&self, credentials: &MuxCredentials, asset_id: &str)
        -> Result<(), AppError>;

    /// Cancel a pending direct upload.
    async fn cancel_upload(
        &self,
        credentials: &MuxCredentials,
        upload_id: &str,
    ) -> Result<(), AppError>;
}

/// reqwest-backed [`MuxApi`] implementation.
#[derive(Clone, Debug)]
pub struct MuxClient {
    client: Client,
    base_url: String,
}

fn transport_error(err: reqwest::Error) -> AppError {
    AppError::Upstream(format!("request failed: {}", err))
}

impl MuxClient {
    /// Build a client for the API rooted at `base_url` (e.g. `https://api.mux.com`).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| AppError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        credentials: &MuxCredentials,
    ) -> Result<reqwest::Response, AppError> {
        request
            .basic_auth(&credentials.access_token, Some(&credentials.secret_key))
            .send()
            .await
            .map_err(transport_error)
    }

    async fn expect_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await.map_err(transport_error)?;
        Ok(envelope.data)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::Upstream(error_message_for_response(status, &body)))
    }
}

/// Prefer Mux's `{"error": {"messages": [...]}}` text over the raw body.
fn error_message_for_response(status: StatusCode, body: &str) -> String {
    let messages = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let messages = value.get("error")?.get("messages")?.as_array()?.clone();
            let joined: Vec<String> = messages
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect();
            (!joined.is_empty()).then(|| joined.join("; "))
        });
    match messages {
        Some(messages) => format!("{} ({})", messages, status),
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{} ({})", body.trim(), status),
    }
}

#[async_trait]
impl MuxApi for MuxClient {
    async fn create_asset(
        &self,
        credentials: &MuxCredentials,
        input_url: &str,
    ) -> Result<RemoteAsset, AppError> {
        let body = json!({
            "input": [{ "url": input_url }],
            "playback_policy": ["public"],
        });
        let request = self.client.post(self.url("/video/v1/assets")).json(&body);
        let response = self.send(request, credentials).await?;
        Self::expect_data(response).await
    }

    async fn create_direct_upload(
        &self,
        credentials: &MuxCredentials,
        cors_origin: &str,
    ) -> Result<DirectUpload, AppError> {
        let body = json!({
            "cors_origin": cors_origin,
            "new_asset_settings": { "playback_policy": ["public"] },
        });
        let request = self.client.post(self.url("/video/v1/uploads")).json(&body);
        let response = self.send(request, credentials).await?;
        Self::expect_data(response).await
    }

    async fn delete_asset(
        &self,
        credentials: &MuxCredentials,
        asset_id: &str,
    ) -> Result<(), AppError> {
        let request = self
            .client
            .delete(self.url(&format!("/video/v1/assets/{}", asset_id)));
        let response = self.send(request, credentials).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(asset_id, "Mux asset already gone");
            return Ok(());
        }
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn cancel_upload(
        &self,
        credentials: &MuxCredentials,
        upload_id: &str,
    ) -> Result<(), AppError> {
        let request = self
            .client
            .put(self.url(&format!("/video/v1/uploads/{}/cancel", upload_id)));
        let response = self.send(request, credentials).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
