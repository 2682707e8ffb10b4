//! Mux credentials persisted through the `mux-settings` endpoints.

use serde::{Deserialize, Serialize};

/// Credentials and webhook secret for the Mux account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MuxSettings {
    pub access_token: String,
    pub secret_key: String,
    pub webhook_signing_secret: Option<String>,
}

/// Response body for `GET`/`POST mux-settings`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsStatus {
    pub configured: bool,
}

impl MuxSettings {
    /// Both API credentials are present.
    pub fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}
