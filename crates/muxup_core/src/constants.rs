//! Shared constants used across muxup crates.

/// Default API port for the admin server.
pub const DEFAULT_PORT: u16 = 1337;

/// Default maximum request body accepted by the API layer.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Route prefix shared by every admin endpoint.
pub const API_PREFIX: &str = "/mux-video-uploader";

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://127.0.0.1:1337";

/// Default Mux Video API origin.
pub const DEFAULT_MUX_API_URL: &str = "https://api.mux.com";

/// Default CORS origin sent with Mux direct-upload requests.
pub const DEFAULT_MUX_CORS_ORIGIN: &str = "*";

/// Default first row of a listing page.
pub const DEFAULT_PAGE_START: usize = 0;
/// Default listing page size.
pub const DEFAULT_PAGE_LIMIT: usize = 10;
