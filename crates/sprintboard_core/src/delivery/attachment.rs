//! Attachment storage contract and placeholder implementation.

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Base URL used by the placeholder storage when none is configured.
pub const DEFAULT_ATTACHMENT_BASE_URL: &str = "https://example.com/files";

/// File handed to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub kind: String,
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    EmptyFileName,
    TooManyFiles { max_files: usize, requested: usize },
    Storage(String),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFileName => write!(f, "attachment file name cannot be empty"),
            Self::TooManyFiles {
                max_files,
                requested,
            } => write!(
                f,
                "upload batch accepts at most {max_files} files, got {requested}"
            ),
            Self::Storage(message) => write!(f, "attachment storage failed: {message}"),
        }
    }
}

impl Error for UploadError {}

/// External object storage boundary.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Stores `file` and returns a reference URL.
    async fn upload(&self, file: &AttachmentFile) -> Result<String, UploadError>;
}

/// Storage that keeps nothing and synthesizes `<base_url>/<name>`.
#[derive(Debug, Clone)]
pub struct PlaceholderAttachmentStorage {
    base_url: String,
}

impl PlaceholderAttachmentStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for PlaceholderAttachmentStorage {
    fn default() -> Self {
        Self::new(DEFAULT_ATTACHMENT_BASE_URL)
    }
}

#[async_trait]
impl AttachmentStorage for PlaceholderAttachmentStorage {
    async fn upload(&self, file: &AttachmentFile) -> Result<String, UploadError> {
        let name = file.name.trim();
        if name.is_empty() {
            return Err(UploadError::EmptyFileName);
        }
        info!(
            "event=attachment_upload module=delivery status=ok name={} size={}",
            name,
            file.size()
        );
        Ok(format!("{}/{}", self.base_url, name))
    }
}
