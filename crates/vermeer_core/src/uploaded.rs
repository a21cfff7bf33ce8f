//! Uploaded file and storage object records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a file uploaded to a backend's files API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Backend is still processing the upload; not yet usable.
    Processing,
    /// File is ready for use in generation calls.
    Active,
    /// Backend rejected or failed to process the upload.
    Failed,
}

impl FileState {
    /// Parse a backend state string (`"PROCESSING"`, `"ACTIVE"`, `"FAILED"`).
    ///
    /// Unknown states map to `Processing` so callers keep polling rather than
    /// treating them as terminal.
    pub fn parse(state: &str) -> Self {
        match state {
            "ACTIVE" => FileState::Active,
            "FAILED" => FileState::Failed,
            _ => FileState::Processing,
        }
    }
}

/// Record of a file created by a backend or storage upload call.
///
/// Owned by whichever provider created it; referenced (not owned) by the
/// file handling service and vision providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Backend-assigned identifier (file handle or storage key)
    pub id: String,
    /// Original filename
    pub filename: String,
    /// Mime type of the uploaded bytes
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Backend file URI, when assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Retrievable URL, when assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Processing state, for backends with asynchronous activation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,
    /// Creation timestamp, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Expiry timestamp, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Content hash, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Result of a storage provider upload.
///
/// Created on upload, read on list/get, deleted on delete; there is no
/// update operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageFile {
    /// Opaque object key within the bucket
    pub key: String,
    /// Original filename the key was synthesized from
    pub filename: String,
    /// Mime type of the stored bytes
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Retrievable URL for the object
    pub url: String,
    /// Last-modified timestamp
    pub last_modified: DateTime<Utc>,
    /// Entity tag, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}
