//! HTTP server wiring for muxup (API, handlers, Mux client, and shared state).

/// Bearer-token gate for admin endpoints.
pub mod auth;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for asset, upload, settings and webhook endpoints.
pub mod handlers;
/// Mux Video API client.
pub mod mux;

pub use muxup_core::{
    config, constants, db, entity, models, query, AppError, Config, Database, EntityService,
    DEFAULT_PORT,
};
pub use mux::{MuxApi, MuxClient, MuxCredentials};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use db::SettingsDb;
use muxup_core::constants::API_PREFIX;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer}, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<dyn EntityService>,
    pub settings: Arc<SettingsDb>,
    pub config: Arc<Config>,
    pub mux: Arc<dyn MuxApi>,
}

impl AppState {
    /// Construct shared application state with a live Mux client.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    ///
    /// # Returns
    /// A new [`AppState`].
    ///
    /// # Errors
    /// Returns an error if the Mux HTTP client cannot be built.
    pub fn new(config: Config, db: Database) -> Result<Self, AppError> {
        let mux = Arc::new(MuxClient::new(&config.mux_api_url)?);
        Ok(Self::with_mux(config, db, mux))
    }

    /// Construct shared application state around a provided Mux implementation.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    /// - `mux`: Mux API implementation.
    ///
    /// # Returns
    /// A new [`AppState`] wired to `mux`.
    pub fn with_mux(config: Config, db: Database, mux: Arc<dyn MuxApi>) -> Self {
        let Database {
            assets, settings, ..
        } = db;
        Self {
            assets: Arc::new(assets),
            settings: Arc::new(settings),
            config: Arc::new(config),
            mux,
        }
    }

    /// Credentials for Mux calls: stored settings first, then the environment.
    ///
    /// # Errors
    /// Returns [`AppError::NotConfigured`] when neither source is complete.
    pub fn mux_credentials(&self) -> Result<MuxCredentials, AppError> {
        if let Some(stored) = self.settings.get()? {
            if stored.is_complete() {
                return Ok(MuxCredentials {
                    access_token: stored.access_token,
                    secret_key: stored.secret_key,
                });
            }
        }
        match (
            self.config.mux_access_token.as_deref(),
            self.config.mux_secret_key.as_deref(),
        ) {
            (Some(access_token), Some(secret_key)) => Ok(MuxCredentials {
                access_token: access_token.to_string(),
                secret_key: secret_key.to_string(),
            }),
            _ => Err(AppError::NotConfigured),
        }
    }

    /// Secret used to verify webhook signatures, if one is configured.
    ///
    /// # Errors
    /// Returns an error if stored settings cannot be read.
    pub fn webhook_secret(&self) -> Result<Option<String>, AppError> {
        let stored = self
            .settings
            .get()?
            .and_then(|settings| settings.webhook_signing_secret);
        Ok(stored.or_else(|| self.config.mux_webhook_signing_secret.clone()))
    }
}

fn api_path(suffix: &str) -> String {
    format!("{}{}", API_PREFIX, suffix)
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::{asset, settings, upload};

    Router::new()
        .route(API_PREFIX, get(handlers::index))
        .route(&api_path("/"), get(handlers::index))
        .route(
            &api_path("/mux-settings"),
            get(settings::get_settings).post(settings::set_settings),
        )
        .route(
            &api_path("/submitRemoteUpload"),
            post(upload::submit_remote_upload),
        )
        .route(
            &api_path("/submitDirectUpload"),
            post(upload::submit_direct_upload),
        )
        .route(&api_path("/deleteMuxAsset"), post(upload::delete_mux_asset))
        .route(
            &api_path("/mux-asset"),
            get(asset::find).post(asset::create),
        )
        .route(&api_path("/mux-asset/count"), get(asset::count))
        .route(
            &api_path("/mux-asset/:id"),
            get(asset::find_one)
                .put(asset::update)
                .delete(asset::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    // Configure CORS - optionally allow public access
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = [
            format!("http://localhost:{}", cors_port),
            format!("http://127.0.0.1:{}", cors_port),
        ]
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
    };

    Router::new()
        .merge(admin_routes(&state))
        // Mux calls this without a bearer token; signatures authenticate it.
        .route(
            &api_path("/webhook-handler"),
            post(handlers::webhook::handle),
        )
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(state.config.max_upload_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
