//! HTTP client for the muxup admin API.

use crate::upload::{UploadInfo, UploadOrigin, UploadResult};
use crate::ClientError;
use muxup_core::constants::API_PREFIX;
use muxup_core::models::{
    asset::{AssetId, AssetPage, AssetPatch, MuxAsset},
    settings::{MuxSettings, SettingsStatus},
    upload::{DeleteOutcome, DirectUploadTicket},
};
use muxup_core::query::{list_query_pairs, SearchVector, SortVector};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Client bound to one server and bearer token.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

/// Pull the `error` string out of a JSON error body, falling back to the raw
/// body or the status reason.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

/// Rewrite `http://localhost` to `127.0.0.1` and drop trailing slashes.
pub fn normalize_server(server: &str) -> String {
    let server = server.trim();
    if let Ok(mut url) = Url::parse(server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server.to_string();
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server.to_string()
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    Err(ClientError::Http {
        status,
        message: error_message_for_response(status, &body),
    })
}

impl ApiClient {
    /// Build a client for `server` (e.g. `http://127.0.0.1:1337`).
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidUrl`] when `server` cannot serve as a
    /// base URL, or a transport error if the HTTP client cannot be built.
    pub fn new(
        server: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let normalized = normalize_server(server);
        let base = Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl {
            url: server.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: server.to_string(),
                reason: "cannot be used as an API base".to_string(),
            });
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Absolute URL for `segments` below the API prefix.
    pub fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl {
                    url: self.base.to_string(),
                    reason: "cannot be used as an API base".to_string(),
                })?;
            path.pop_if_empty();
            path.push(API_PREFIX.trim_start_matches('/'));
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.apply_auth(request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Whether Mux credentials are available on the server.
    pub async fn get_is_configured(&self) -> Result<bool, ClientError> {
        let url = self.api_url(&["mux-settings"])?;
        let status: SettingsStatus = self.send_json(self.http.get(url)).await?;
        Ok(status.configured)
    }

    /// Store Mux credentials on the server.
    pub async fn set_mux_settings(
        &self,
        settings: &MuxSettings,
    ) -> Result<SettingsStatus, ClientError> {
        let url = self.api_url(&["mux-settings"])?;
        let form = Form::new()
            .text("access_token", settings.access_token.clone())
            .text("secret_key", settings.secret_key.clone())
            .text(
                "webhook_signing_secret",
                settings.webhook_signing_secret.clone().unwrap_or_default(),
            );
        self.send_json(self.http.post(url).multipart(form)).await
    }

    /// Dispatch an upload to the endpoint matching its origin.
    ///
    /// The origin is checked before any request is made. A `from_url` upload
    /// without media still sends an empty `url` field.
    ///
    /// # Errors
    /// Returns [`ClientError::UnrecognizedOrigin`] for unknown origins, and
    /// HTTP/transport errors from the single request otherwise.
    pub async fn submit_upload(&self, info: &UploadInfo) -> Result<UploadResult, ClientError> {
        match UploadOrigin::parse(&info.origin)? {
            UploadOrigin::FromUrl => {
                let url = self.api_url(&["submitRemoteUpload"])?;
                let form = Form::new()
                    .text("title", info.title.clone())
                    .text("url", info.media.clone().unwrap_or_default());
                let asset: MuxAsset = self.send_json(self.http.post(url).multipart(form)).await?;
                Ok(UploadResult::Remote(asset))
            }
            UploadOrigin::FromComputer => {
                let url = self.api_url(&["submitDirectUpload"])?;
                let form = Form::new().text("title", info.title.clone());
                let ticket: DirectUploadTicket =
                    self.send_json(self.http.post(url).multipart(form)).await?;
                Ok(UploadResult::Direct(ticket))
            }
        }
    }

    /// PUT file bytes to a signed direct-upload URL.
    ///
    /// The URL belongs to Mux storage, so no bearer token is attached.
    pub async fn put_file(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
        let url = Url::parse(upload_url).map_err(|err| ClientError::InvalidUrl {
            url: upload_url.to_string(),
            reason: err.to_string(),
        })?;
        let response = self.http.put(url).body(bytes).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// One page of records.
    pub async fn get_mux_assets(
        &self,
        search: Option<&SearchVector>,
        sort: Option<&SortVector>,
        start: usize,
        limit: usize,
    ) -> Result<AssetPage, ClientError> {
        let url = self.api_url(&["mux-asset"])?;
        let query = list_query_pairs(search, sort, start, limit);
        tracing::debug!(?query, "listing assets");
        self.send_json(self.http.get(url).query(&query)).await
    }

    pub async fn get_mux_asset(&self, id: AssetId) -> Result<MuxAsset, ClientError> {
        let id = id.to_string();
        let url = self.api_url(&["mux-asset", id.as_str()])?;
        self.send_json(self.http.get(url)).await
    }

    /// Send a partial record; absent fields are left untouched.
    pub async fn set_mux_asset(&self, patch: &AssetPatch) -> Result<MuxAsset, ClientError> {
        let id = patch.id.to_string();
        let url = self.api_url(&["mux-asset", id.as_str()])?;
        self.send_json(self.http.put(url).json(patch)).await
    }

    /// Delete a record together with its Mux asset (or pending upload).
    pub async fn delete_mux_asset(&self, asset: &MuxAsset) -> Result<DeleteOutcome, ClientError> {
        let url = self.api_url(&["deleteMuxAsset"])?;
        let form = Form::new()
            .text("id", asset.id.to_string())
            .text("asset_id", asset.asset_id.clone().unwrap_or_default())
            .text("upload_id", asset.upload_id.clone().unwrap_or_default())
            .text("delete_on_mux", "true");
        self.send_json(self.http.post(url).multipart(form)).await
    }
}
