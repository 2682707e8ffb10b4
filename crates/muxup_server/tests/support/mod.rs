//! Shared integration-test server bootstrap helpers.

use async_trait::async_trait;
use axum_test::TestServer;
use muxup_server::mux::{DirectUpload, RemoteAsset};
use muxup_server::{create_app, AppError, AppState, Config, Database, MuxApi, MuxCredentials};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A Mux call observed by [`FakeMux`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MuxCall {
    CreateAsset { input_url: String },
    CreateDirectUpload { cors_origin: String },
    DeleteAsset { asset_id: String },
    CancelUpload { upload_id: String },
}

/// Records calls and answers with canned identifiers.
#[derive(Default)]
pub(crate) struct FakeMux {
    calls: Mutex<Vec<MuxCall>>,
    fail_with: Mutex<Option<String>>,
}

impl FakeMux {
    pub(crate) fn calls(&self) -> Vec<MuxCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn fail_next(&self, message: &str) {
        *self.fail_with.lock().expect("fail lock") = Some(message.to_string());
    }

    fn record(&self, call: MuxCall) -> Result<(), AppError> {
        self.calls.lock().expect("calls lock").push(call);
        match self.fail_with.lock().expect("fail lock").take() {
            Some(message) => Err(AppError::Upstream(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MuxApi for FakeMux {
    async fn create_asset(
        &self,
        _credentials: &MuxCredentials,
        input_url: &str,
    ) -> Result<RemoteAsset, AppError> {
        self.record(MuxCall::CreateAsset {
            input_url: input_url.to_string(),
        })?;
        Ok(RemoteAsset {
            id: "remote-asset-1".to_string(),
            status: Some("preparing".to_string()),
        })
    }

    async fn create_direct_upload(
        &self,
        _credentials: &MuxCredentials,
        cors_origin: &str,
    ) -> Result<DirectUpload, AppError> {
        self.record(MuxCall::CreateDirectUpload {
            cors_origin: cors_origin.to_string(),
        })?;
        Ok(DirectUpload {
            id: "upload-1".to_string(),
            url: "https://storage.example.test/upload-1".to_string(),
            status: Some("waiting".to_string()),
            asset_id: None,
        })
    }

    async fn delete_asset(
        &self,
        _credentials: &MuxCredentials,
        asset_id: &str,
    ) -> Result<(), AppError> {
        self.record(MuxCall::DeleteAsset {
            asset_id: asset_id.to_string(),
        })
    }

    async fn cancel_upload(
        &self,
        _credentials: &MuxCredentials,
        upload_id: &str,
    ) -> Result<(), AppError> {
        self.record(MuxCall::CancelUpload {
            upload_id: upload_id.to_string(),
        })
    }
}

pub(crate) fn test_config_for_db_path(db_path: &Path) -> Config {
    Config::for_db_path(db_path.to_str().expect("db path"))
}

/// Config with Mux credentials supplied through the environment fallback.
pub(crate) fn configured(mut config: Config) -> Config {
    config.mux_access_token = Some("token-id".to_string());
    config.mux_secret_key = Some("token-secret".to_string());
    config
}

pub(crate) fn test_server_for_config(config: Config) -> (TestServer, Arc<FakeMux>) {
    let db = Database::new(config.db_path.as_str()).expect("open db");
    let mux = Arc::new(FakeMux::default());
    let state = AppState::with_mux(config, db, mux.clone());
    let app = create_app(state, false);
    let server = TestServer::new(app).expect("server");
    (server, mux)
}

pub(crate) fn setup_test_server_with(
    adjust: impl FnOnce(Config) -> Config,
) -> (TestServer, TempDir, Arc<FakeMux>) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test-db");
    let config = adjust(test_config_for_db_path(&db_path));
    let (server, mux) = test_server_for_config(config);
    (server, temp_dir, mux)
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir, Arc<FakeMux>) {
    setup_test_server_with(configured)
}
