//! Upload descriptors and origin dispatch.

use crate::ClientError;
use muxup_core::models::{asset::MuxAsset, upload::DirectUploadTicket};
use std::fmt;

/// Where the video comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOrigin {
    /// Mux fetches the file from a public URL.
    FromUrl,
    /// The caller PUTs the file to a signed upload URL.
    FromComputer,
}

impl UploadOrigin {
    pub const FROM_URL: &'static str = "from_url";
    pub const FROM_COMPUTER: &'static str = "from_computer";

    /// Parse an origin tag.
    ///
    /// # Errors
    /// Returns [`ClientError::UnrecognizedOrigin`] for any other tag.
    pub fn parse(tag: &str) -> Result<Self, ClientError> {
        match tag {
            Self::FROM_URL => Ok(Self::FromUrl),
            Self::FROM_COMPUTER => Ok(Self::FromComputer),
            other => Err(ClientError::UnrecognizedOrigin(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FromUrl => Self::FROM_URL,
            Self::FromComputer => Self::FROM_COMPUTER,
        }
    }
}

impl fmt::Display for UploadOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upload request as entered by the user.
///
/// `origin` stays a raw tag so unrecognized values reach the dispatcher and
/// fail there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub origin: String,
    /// Remote URL for `from_url`; ignored for `from_computer`.
    pub media: Option<String>,
    pub title: String,
}

impl UploadInfo {
    pub fn from_url(title: impl Into<String>, media: Option<String>) -> Self {
        Self {
            origin: UploadOrigin::FROM_URL.to_string(),
            media,
            title: title.into(),
        }
    }

    pub fn from_computer(title: impl Into<String>) -> Self {
        Self {
            origin: UploadOrigin::FROM_COMPUTER.to_string(),
            media: None,
            title: title.into(),
        }
    }
}

/// Server answer to a dispatched upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadResult {
    /// Mux is fetching the URL; the record tracks the new asset.
    Remote(MuxAsset),
    /// The file still has to be PUT to `ticket.url`.
    Direct(DirectUploadTicket),
}

impl UploadResult {
    /// The record created for this upload.
    pub fn asset(&self) -> &MuxAsset {
        match self {
            Self::Remote(asset) => asset,
            Self::Direct(ticket) => &ticket.asset,
        }
    }
}
