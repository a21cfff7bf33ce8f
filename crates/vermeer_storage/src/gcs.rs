//! Google Cloud Storage over the JSON API.
//!
//! Authenticates with an OAuth bearer token, taken from the
//! `GOOGLE_OAUTH_ACCESS_TOKEN` environment variable when set (local
//! development, CI) and otherwise minted by the GCE metadata server (any
//! GCP runtime with an attached service account). Metadata tokens are
//! cached until shortly before expiry.
//!
//! Signed URLs use the XML interoperability API with HMAC credentials,
//! which signs the same way S3 does; V4 URL signing with an RSA service
//! account key is deliberately not implemented.

use crate::auth::OauthTokenSource;
use crate::keys::synthesize_key;
use crate::sign::{presign_url, uri_encode, SigningParams};
use crate::StorageProvider;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_core::StorageFile;
use vermeer_error::{StorageError, StorageErrorKind, VermeerResult};

const BACKEND: &str = "gcs";
const API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const INTEROP_HOST: &str = "storage.googleapis.com";

/// Connection settings for a GCS bucket.
#[derive(Debug, Clone)]
pub struct GcsConfig {
    /// Bucket name.
    pub bucket: String,
    /// HMAC interoperability access key, required only for signed URLs.
    pub hmac_access_key: Option<String>,
    /// HMAC interoperability secret, required only for signed URLs.
    pub hmac_secret_key: Option<String>,
}

/// [`StorageProvider`] backed by a GCS bucket.
pub struct GcsStorage {
    config: GcsConfig,
    client: reqwest::Client,
    token: OauthTokenSource,
}

impl GcsStorage {
    /// Build a provider, validating config and constructing the HTTP client.
    pub fn new(config: GcsConfig) -> VermeerResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::InvalidConfig("bucket must not be empty".to_string()),
            )
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                StorageError::new(BACKEND, StorageErrorKind::InvalidConfig(e.to_string()))
            })?;

        Ok(Self {
            config,
            client,
            token: OauthTokenSource::new(BACKEND),
        })
    }

    async fn bearer_token(&self) -> VermeerResult<String> {
        self.token.bearer_token(&self.client).await
    }

    /// JSON API path for an object; names are fully percent-encoded.
    fn object_path(&self, key: &str) -> String {
        format!(
            "{API_BASE}/b/{}/o/{}",
            self.config.bucket,
            uri_encode(key, true)
        )
    }

    fn storage_file(&self, object: GcsObject, filename: Option<&str>) -> StorageFile {
        let filename = filename
            .map(String::from)
            .or_else(|| object.name.rsplit('/').next().map(String::from))
            .unwrap_or_else(|| object.name.clone());
        StorageFile {
            url: self.public_url(&object.name),
            filename,
            mime_type: object
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: object
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            last_modified: object.updated.unwrap_or_else(Utc::now),
            etag: object.etag,
            key: object.name,
        }
    }
}

#[async_trait::async_trait]
impl StorageProvider for GcsStorage {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self, data), fields(backend = BACKEND, size = data.len()))]
    async fn upload_file(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<StorageFile> {
        let key = synthesize_key(filename, mime_type);
        let token = self.bearer_token().await?;

        let response = self
            .client
            .post(format!("{UPLOAD_BASE}/b/{}/o", self.config.bucket))
            .query(&[("uploadType", "media"), ("name", key.as_str())])
            .bearer_auth(token)
            .header("content-type", mime_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::Upload(e.to_string())))?;

        if !response.status().is_success() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Upload(format!("insert {key} returned {}", response.status())),
            )
            .into());
        }

        let object: GcsObject = response.json().await.map_err(|e| {
            StorageError::new(BACKEND, StorageErrorKind::Upload(e.to_string()))
        })?;
        debug!(key = %object.name, "object stored");
        Ok(self.storage_file(object, Some(filename)))
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn download_file(&self, key: &str) -> VermeerResult<Vec<u8>> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .get(self.object_path(key))
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::Download(e.to_string())))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(
                StorageError::new(BACKEND, StorageErrorKind::NotFound(key.to_string())).into(),
            );
        }
        if !response.status().is_success() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Download(format!("get {key} returned {}", response.status())),
            )
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| {
            StorageError::new(BACKEND, StorageErrorKind::Download(e.to_string()))
        })?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn delete_file(&self, key: &str) -> VermeerResult<()> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .delete(self.object_path(key))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::Delete(e.to_string())))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Delete(format!("delete {key} returned {status}")),
            )
            .into())
        }
    }

    /// Returns the `gs://` form, which is what enterprise vision backends
    /// consume directly.
    fn public_url(&self, key: &str) -> String {
        format!("gs://{}/{}", self.config.bucket, key)
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> VermeerResult<String> {
        let (access_key, secret_key) = match (
            self.config.hmac_access_key.as_deref(),
            self.config.hmac_secret_key.as_deref(),
        ) {
            (Some(a), Some(s)) if !a.is_empty() && !s.is_empty() => (a, s),
            _ => {
                return Err(StorageError::new(
                    BACKEND,
                    StorageErrorKind::SignedUrl(
                        "signed URLs need HMAC interoperability credentials".to_string(),
                    ),
                )
                .into())
            }
        };

        let params = SigningParams {
            access_key,
            secret_key,
            region: "auto",
            service: "s3",
        };
        Ok(presign_url(
            &params,
            INTEROP_HOST,
            &format!("/{}/{}", self.config.bucket, key),
            expires_in.as_secs().max(1),
            Utc::now(),
        ))
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn list_files(&self, prefix: Option<&str>) -> VermeerResult<Vec<StorageFile>> {
        let token = self.bearer_token().await?;
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(prefix) = prefix {
                query.push(("prefix", prefix.to_string()));
            }
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(format!("{API_BASE}/b/{}/o", self.config.bucket))
                .query(&query)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::List(e.to_string())))?;

            if !response.status().is_success() {
                return Err(StorageError::new(
                    BACKEND,
                    StorageErrorKind::List(format!("list returned {}", response.status())),
                )
                .into());
            }

            let page: GcsListing = response.json().await.map_err(|e| {
                StorageError::new(BACKEND, StorageErrorKind::List(e.to_string()))
            })?;
            files.extend(page.items.into_iter().map(|o| self.storage_file(o, None)));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }
}

#[derive(Debug, Deserialize)]
struct GcsObject {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
    #[serde(default, rename = "contentType")]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GcsListing {
    #[serde(default)]
    items: Vec<GcsObject>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(hmac: bool) -> GcsStorage {
        GcsStorage::new(GcsConfig {
            bucket: "media".into(),
            hmac_access_key: hmac.then(|| "GOOG1EXAMPLE".to_string()),
            hmac_secret_key: hmac.then(|| "secret".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn public_url_is_canonical_cloud_uri() {
        let s = storage(false);
        assert_eq!(
            s.public_url("videos/2026-08-30/abc.mp4"),
            "gs://media/videos/2026-08-30/abc.mp4"
        );
    }

    #[tokio::test]
    async fn signed_url_without_hmac_credentials_fails() {
        let s = storage(false);
        let err = s
            .signed_url("images/a.png", Duration::from_secs(600))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "storage_error");
        assert!(err.to_string().contains("HMAC"));
    }

    #[tokio::test]
    async fn signed_url_with_hmac_credentials_targets_interop_host() {
        let s = storage(true);
        let url = s
            .signed_url("images/a.png", Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.starts_with("https://storage.googleapis.com/media/images/a.png?"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn object_listing_parses_json_page() {
        let body = r#"{
            "items": [
                {"name": "images/a.png", "size": "1024", "etag": "abc",
                 "updated": "2026-08-30T10:00:00Z", "contentType": "image/png"}
            ],
            "nextPageToken": "tok"
        }"#;
        let page: GcsListing = serde_json::from_str(body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].size.as_deref(), Some("1024"));
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
    }
}
