//! Client library for the muxup admin API: HTTP client, upload dispatcher and
//! record editor.

/// HTTP client for the admin endpoints.
pub mod client;
/// Single-record editor state machine.
pub mod editor;
/// Client-side error type.
pub mod error;
/// Upload descriptors and origin dispatch.
pub mod upload;

pub use client::ApiClient;
pub use editor::{
    AssetGateway, DeleteTicket, EditorField, EditorState, RecordEditor, SubmitTicket,
};
pub use error::ClientError;
pub use upload::{UploadInfo, UploadOrigin, UploadResult};
