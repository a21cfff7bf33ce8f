//! Storage-backed upload strategy.
//!
//! Stages media through an external [`StorageProvider`] and hands the
//! generation call a canonical `gs://bucket/path` reference, rewriting
//! whatever URL shape the storage backend emits.

use crate::strategy::UploadStrategy;
use std::sync::Arc;
use tracing::{instrument, warn};
use vermeer_core::{FileReference, UploadedFile};
use vermeer_error::VermeerResult;
use vermeer_storage::{canonical_cloud_uri, StorageProvider};

/// [`UploadStrategy`] backed by external object storage.
pub struct StorageUploadStrategy {
    provider: &'static str,
    bucket: String,
    storage: Arc<dyn StorageProvider>,
}

impl StorageUploadStrategy {
    /// Wrap a storage provider for a vision backend.
    ///
    /// `provider` tags errors and log lines with the backend the staged
    /// media is destined for; `bucket` anchors URL-to-`gs://` rewriting.
    pub fn new(
        provider: &'static str,
        bucket: impl Into<String>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            storage,
        }
    }
}

#[async_trait::async_trait]
impl UploadStrategy for StorageUploadStrategy {
    fn provider(&self) -> &'static str {
        self.provider
    }

    #[instrument(skip(self, data), fields(provider = self.provider, size = data.len()))]
    async fn upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile> {
        let stored = self.storage.upload_file(data, filename, mime_type).await?;
        Ok(UploadedFile {
            id: stored.key.clone(),
            filename: stored.filename,
            mime_type: stored.mime_type,
            size_bytes: stored.size_bytes,
            uri: canonical_cloud_uri(&stored.url, &self.bucket),
            url: Some(stored.url),
            state: None,
            created_at: Some(stored.last_modified),
            expires_at: None,
            sha256: None,
        })
    }

    async fn reference_for_analysis(&self, file: &UploadedFile) -> VermeerResult<FileReference> {
        // Prefer the canonical gs:// form; fall back to the raw object URL
        // for layouts the rewrite does not recognize (CDN fronting).
        let uri = file
            .uri
            .clone()
            .or_else(|| {
                file.url
                    .as_deref()
                    .and_then(|url| canonical_cloud_uri(url, &self.bucket))
            })
            .or_else(|| file.url.clone())
            .unwrap_or_else(|| format!("gs://{}/{}", self.bucket, file.id));

        Ok(FileReference::FileUri {
            uri,
            mime_type: file.mime_type.clone(),
        })
    }

    async fn cleanup(&self, file_id: &str) {
        if let Err(e) = self.storage.delete_file(file_id).await {
            warn!(key = file_id, error = %e, "storage cleanup failed");
        }
    }
}
