//! Attachment errors
//!
//! Messages carry storage-relative paths only; absolute locations stay in logs.

use thiserror::Error;

use crate::validator::UploadRejection;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Path escapes the storage root: {0}")]
    PathTraversal(String),
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error("Destination path is a directory (expected file path): {0}")]
    DestinationIsDirectory(String),
    #[error("Destination already exists: {0}")]
    AlreadyExists(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Staged file not found: {0}")]
    StagedFileMissing(String),
    #[error("Unsupported attachment category: {0}")]
    UnsupportedCategory(String),
    #[error("Upload rejected: {0}")]
    Rejected(#[from] UploadRejection),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

impl AttachmentError {
    /// Whether the failure was caused by the client's request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal(_)
                | Self::InvalidDestination(_)
                | Self::UnsupportedCategory(_)
                | Self::Rejected(_)
        )
    }
}
