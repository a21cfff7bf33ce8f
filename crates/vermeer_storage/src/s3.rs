//! S3-compatible object storage over signed HTTP.
//!
//! Works against AWS S3 and any S3-compatible endpoint (MinIO, R2,
//! DigitalOcean Spaces) using SigV4 request signing directly, without a
//! vendor SDK.

use crate::keys::synthesize_key;
use crate::sign::{
    canonical_query, presign_url, sha256_hex, sign_request, SignedHeaders, SigningParams,
    EMPTY_PAYLOAD_SHA256,
};
use crate::StorageProvider;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use vermeer_core::{mime_from_extension, StorageFile};
use vermeer_error::{StorageError, StorageErrorKind, VermeerResult};

const BACKEND: &str = "s3";

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Signing region. S3-compatible services usually accept any value but
    /// it must be consistent; AWS requires the bucket's real region.
    pub region: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Custom endpoint (`https://minio.internal:9000`). `None` targets AWS.
    pub endpoint: Option<String>,
    /// Address objects as `/{bucket}/{key}` on the endpoint host instead of
    /// `{bucket}.` host labels. Most non-AWS services need this.
    pub path_style: bool,
    /// Public base URL override, typically a CDN in front of the bucket.
    pub cdn_base_url: Option<String>,
}

/// [`StorageProvider`] backed by an S3-compatible bucket.
#[derive(Debug)]
pub struct S3CompatibleStorage {
    config: S3Config,
    client: reqwest::Client,
    scheme: String,
    endpoint_host: String,
}

impl S3CompatibleStorage {
    /// Build a provider, validating config and constructing the HTTP client.
    pub fn new(config: S3Config) -> VermeerResult<Self> {
        for (value, name) in [
            (&config.bucket, "bucket"),
            (&config.access_key, "access key"),
            (&config.secret_key, "secret key"),
        ] {
            if value.is_empty() {
                return Err(StorageError::new(
                    BACKEND,
                    StorageErrorKind::InvalidConfig(format!("{name} must not be empty")),
                )
                .into());
            }
        }

        let (scheme, endpoint_host) = match &config.endpoint {
            Some(endpoint) => {
                let (scheme, host) = endpoint
                    .split_once("://")
                    .unwrap_or(("https", endpoint.as_str()));
                (scheme.to_string(), host.trim_end_matches('/').to_string())
            }
            None => (
                "https".to_string(),
                format!("s3.{}.amazonaws.com", config.region),
            ),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                StorageError::new(BACKEND, StorageErrorKind::InvalidConfig(e.to_string()))
            })?;

        Ok(Self {
            config,
            client,
            scheme,
            endpoint_host,
        })
    }

    fn signing_params(&self) -> SigningParams<'_> {
        SigningParams {
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            region: &self.config.region,
            service: "s3",
        }
    }

    /// Host and absolute path for an object, honoring the addressing style.
    fn host_and_path(&self, key: &str) -> (String, String) {
        if self.config.path_style {
            (
                self.endpoint_host.clone(),
                format!("/{}/{}", self.config.bucket, key),
            )
        } else {
            (
                format!("{}.{}", self.config.bucket, self.endpoint_host),
                format!("/{key}"),
            )
        }
    }

    fn object_url(&self, key: &str) -> String {
        let (host, path) = self.host_and_path(key);
        format!(
            "{}://{}{}",
            self.scheme,
            host,
            crate::sign::uri_encode(&path, false)
        )
    }

    async fn signed_send(
        &self,
        method: reqwest::Method,
        key: &str,
        query: &[(String, String)],
        body: Option<(Vec<u8>, &str)>,
        wrap: impl Fn(String) -> StorageErrorKind,
    ) -> VermeerResult<reqwest::Response> {
        let (host, path) = self.host_and_path(key);
        let payload_hash = match &body {
            Some((bytes, _)) => sha256_hex(bytes),
            None => EMPTY_PAYLOAD_SHA256.to_string(),
        };

        let SignedHeaders {
            authorization,
            amz_date,
            content_sha256,
        } = sign_request(
            &self.signing_params(),
            method.as_str(),
            &host,
            &path,
            query,
            &payload_hash,
            Utc::now(),
        );

        let mut url = format!(
            "{}://{}{}",
            self.scheme,
            host,
            crate::sign::uri_encode(&path, false)
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query(query));
        }

        let mut request = self
            .client
            .request(method, &url)
            .header("authorization", authorization)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", content_sha256);
        if let Some((bytes, content_type)) = body {
            request = request.header("content-type", content_type).body(bytes);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::new(BACKEND, wrap(e.to_string())).into())
    }
}

#[async_trait::async_trait]
impl StorageProvider for S3CompatibleStorage {
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
        let size_bytes = data.len() as u64;

        let response = self
            .signed_send(
                reqwest::Method::PUT,
                &key,
                &[],
                Some((data.to_vec(), mime_type)),
                StorageErrorKind::Upload,
            )
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Upload(format!(
                    "PUT {key} returned {}",
                    response.status()
                )),
            )
            .into());
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        debug!(key = %key, "object stored");
        Ok(StorageFile {
            url: self.public_url(&key),
            key,
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            last_modified: Utc::now(),
            etag,
        })
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn download_file(&self, key: &str) -> VermeerResult<Vec<u8>> {
        let response = self
            .signed_send(
                reqwest::Method::GET,
                key,
                &[],
                None,
                StorageErrorKind::Download,
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(
                StorageError::new(BACKEND, StorageErrorKind::NotFound(key.to_string())).into(),
            );
        }
        if !response.status().is_success() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Download(format!("GET {key} returned {}", response.status())),
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
        let response = self
            .signed_send(
                reqwest::Method::DELETE,
                key,
                &[],
                None,
                StorageErrorKind::Delete,
            )
            .await?;

        // S3 returns 204 for deletes, including deletes of missing keys;
        // some compatible services return 404 instead. Both are success.
        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StorageError::new(
                BACKEND,
                StorageErrorKind::Delete(format!("DELETE {key} returned {status}")),
            )
            .into())
        }
    }

    fn public_url(&self, key: &str) -> String {
        match &self.config.cdn_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.object_url(key),
        }
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> VermeerResult<String> {
        let expires_secs = expires_in.as_secs().max(1);
        let (host, path) = self.host_and_path(key);
        Ok(presign_url(
            &self.signing_params(),
            &host,
            &path,
            expires_secs,
            Utc::now(),
        ))
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn list_files(&self, prefix: Option<&str>) -> VermeerResult<Vec<StorageFile>> {
        let mut query = vec![("list-type".to_string(), "2".to_string())];
        if let Some(prefix) = prefix {
            query.push(("prefix".to_string(), prefix.to_string()));
        }

        let response = self
            .signed_send(reqwest::Method::GET, "", &query, None, StorageErrorKind::List)
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::new(
                BACKEND,
                StorageErrorKind::List(format!("ListObjectsV2 returned {}", response.status())),
            )
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::List(e.to_string())))?;
        let listing: ListBucketResult = quick_xml::de::from_str(&body)
            .map_err(|e| StorageError::new(BACKEND, StorageErrorKind::List(e.to_string())))?;

        let mut files = Vec::with_capacity(listing.contents.len());
        for entry in listing.contents {
            let last_modified = match DateTime::parse_from_rfc3339(&entry.last_modified) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    warn!(key = %entry.key, error = %e, "unparseable LastModified, using epoch");
                    DateTime::<Utc>::UNIX_EPOCH
                }
            };
            let filename = entry
                .key
                .rsplit('/')
                .next()
                .unwrap_or(entry.key.as_str())
                .to_string();
            let mime_type = mime_from_extension(&entry.key)
                .unwrap_or("application/octet-stream")
                .to_string();
            files.push(StorageFile {
                url: self.public_url(&entry.key),
                key: entry.key,
                filename,
                mime_type,
                size_bytes: entry.size,
                last_modified,
                etag: entry.e_tag.map(|t| t.trim_matches('"').to_string()),
            });
        }
        Ok(files)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    key: String,
    last_modified: String,
    #[serde(default)]
    e_tag: Option<String>,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(path_style: bool, endpoint: Option<&str>, cdn: Option<&str>) -> S3CompatibleStorage {
        S3CompatibleStorage::new(S3Config {
            bucket: "media".into(),
            region: "us-east-1".into(),
            access_key: "AKIDEXAMPLE".into(),
            secret_key: "secret".into(),
            endpoint: endpoint.map(String::from),
            path_style,
            cdn_base_url: cdn.map(String::from),
        })
        .unwrap()
    }

    #[test]
    fn virtual_host_urls_put_bucket_in_host() {
        let s = storage(false, None, None);
        assert_eq!(
            s.public_url("images/a.png"),
            "https://media.s3.us-east-1.amazonaws.com/images/a.png"
        );
    }

    #[test]
    fn path_style_urls_put_bucket_in_path() {
        let s = storage(true, Some("http://minio.internal:9000"), None);
        assert_eq!(
            s.public_url("images/a.png"),
            "http://minio.internal:9000/media/images/a.png"
        );
    }

    #[test]
    fn cdn_base_overrides_object_url() {
        let s = storage(false, None, Some("https://cdn.example.com/"));
        assert_eq!(
            s.public_url("images/a.png"),
            "https://cdn.example.com/images/a.png"
        );
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let err = S3CompatibleStorage::new(S3Config {
            bucket: "media".into(),
            region: "us-east-1".into(),
            access_key: String::new(),
            secret_key: "secret".into(),
            endpoint: None,
            path_style: false,
            cdn_base_url: None,
        })
        .unwrap_err();
        assert_eq!(err.code(), "storage_error");
    }

    #[test]
    fn listing_xml_parses_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ListBucketResult>
              <Name>media</Name>
              <Contents>
                <Key>images/2026-08-30/abc.png</Key>
                <LastModified>2026-08-30T10:00:00.000Z</LastModified>
                <ETag>"9b2cf535f27731c974343645a3985328"</ETag>
                <Size>2048</Size>
              </Contents>
            </ListBucketResult>"#;
        let listing: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(listing.contents.len(), 1);
        assert_eq!(listing.contents[0].key, "images/2026-08-30/abc.png");
        assert_eq!(listing.contents[0].size, 2048);
    }
}
