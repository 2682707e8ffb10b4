//! Response bodies of the upload and remote-delete endpoints.

use super::asset::MuxAsset;
use serde::{Deserialize, Serialize};

/// Result of `submitDirectUpload`: where to PUT the file, and the record that
/// will track it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectUploadTicket {
    pub upload_id: String,
    /// Signed URL accepting a single `PUT` of the video file.
    pub url: String,
    pub asset: MuxAsset,
}

/// Result of `deleteMuxAsset`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub success: bool,
    #[serde(rename = "deletedOnMux")]
    pub deleted_on_mux: bool,
}
