//! File handling service: source string in, usable reference out.
//!
//! One service instance exists per media kind and provider. It owns the
//! inline-vs-upload decision and the policy gate; upload mechanics live
//! behind the injected [`UploadStrategy`]. No retries, no automatic
//! cleanup — an uploaded file stays until a caller deletes it.

use crate::strategy::UploadStrategy;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_core::{
    classify, extension_for_mime, mime_from_extension, sniff_mime, FileReference, MediaKind,
    MediaPolicy, SourceKind, VermeerConfig,
};
use vermeer_error::{
    ProviderError, ProviderErrorKind, UploadError, UploadErrorKind, VermeerResult,
};

/// Resolves media source strings into [`FileReference`]s for one media kind.
pub struct FileHandlingService {
    kind: MediaKind,
    provider: String,
    inline_limit: u64,
    policy: MediaPolicy,
    strategy: Arc<dyn UploadStrategy>,
    client: reqwest::Client,
}

impl FileHandlingService {
    /// Build a service from explicit parts.
    pub fn new(
        kind: MediaKind,
        provider: impl Into<String>,
        inline_limit: u64,
        policy: MediaPolicy,
        strategy: Arc<dyn UploadStrategy>,
    ) -> VermeerResult<Self> {
        let provider = provider.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ProviderError::new("fetch", ProviderErrorKind::ClientCreation(e.to_string()))
            })?;
        Ok(Self {
            kind,
            provider,
            inline_limit,
            policy,
            strategy,
            client,
        })
    }

    /// Build a service from the config snapshot for a named provider.
    pub fn from_config(
        kind: MediaKind,
        config: &VermeerConfig,
        provider: &str,
        strategy: Arc<dyn UploadStrategy>,
    ) -> VermeerResult<Self> {
        Self::new(
            kind,
            provider,
            config.inline_limit_bytes(provider),
            config.policy.clone(),
            strategy,
        )
    }

    /// Resolve a source string into the reference a generation call consumes.
    ///
    /// Resolved sources (backend handles, `gs://` URIs) pass through
    /// verbatim; video URLs pass through unfetched; everything else is
    /// fetched/read/decoded and then inlined or uploaded by size.
    #[instrument(
        skip(self, source),
        fields(kind = %self.kind, provider = %self.provider, source_preview = %preview(source))
    )]
    pub async fn handle_source(&self, source: &str) -> VermeerResult<FileReference> {
        match classify(source)? {
            SourceKind::FileHandle(handle) => {
                debug!("passing backend handle through");
                Ok(FileReference::FileUri {
                    mime_type: self.guess_mime(&handle),
                    uri: handle,
                })
            }
            SourceKind::CloudUri(uri) => {
                debug!("passing cloud URI through");
                Ok(FileReference::FileUri {
                    mime_type: self.guess_mime(&uri),
                    uri,
                })
            }
            SourceKind::Url(url) if self.kind == MediaKind::Video => {
                debug!("passing video URL through");
                Ok(FileReference::Url {
                    mime_type: self.guess_mime(&url),
                    url,
                })
            }
            SourceKind::Url(url) => {
                let (data, filename, mime_type) = self.fetch(&url).await?;
                self.stage(data, &filename, &mime_type).await
            }
            SourceKind::DataUri { mime_type, data } => {
                let filename = format!("inline{}", extension_for_mime(&mime_type));
                self.stage(data, &filename, &mime_type).await
            }
            SourceKind::LocalPath(path) => {
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    UploadError::new(UploadErrorKind::FileRead(format!("{path}: {e}")))
                })?;
                let filename = path
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or("upload")
                    .to_string();
                let mime_type = mime_from_extension(&filename)
                    .or_else(|| sniff_mime(&data))
                    .unwrap_or(self.kind.fallback_mime())
                    .to_string();
                self.stage(data, &filename, &mime_type).await
            }
        }
    }

    /// Inline small payloads; validate and upload the rest.
    async fn stage(
        &self,
        data: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<FileReference> {
        let size = data.len() as u64;

        // Videos never inline, whatever the threshold says.
        if self.kind == MediaKind::Image && size <= self.inline_limit {
            debug!(size, "inlining payload");
            return Ok(FileReference::Inline {
                data: base64::engine::general_purpose::STANDARD.encode(&data),
                mime_type: mime_type.to_string(),
            });
        }

        let max = self.policy.max_bytes(self.kind);
        if size > max {
            return Err(UploadError::new(UploadErrorKind::SizeExceeded { size, max })
                .with_provider(self.provider.clone())
                .into());
        }
        if !self
            .policy
            .allowed_formats(self.kind)
            .iter()
            .any(|f| f == mime_type)
        {
            return Err(
                UploadError::new(UploadErrorKind::UnsupportedFormat(mime_type.to_string()))
                    .with_provider(self.provider.clone())
                    .into(),
            );
        }

        debug!(size, mime_type, "uploading payload");
        let uploaded = self.strategy.upload(&data, filename, mime_type).await?;
        self.strategy.reference_for_analysis(&uploaded).await
    }

    /// Fetch a remote source, normalizing shell-escaped ampersands first.
    async fn fetch(&self, url: &str) -> VermeerResult<(Vec<u8>, String, String)> {
        let url = url.replace("\\&", "&");

        let response = self.client.get(&url).send().await.map_err(|e| {
            UploadError::new(UploadErrorKind::FetchTransport(e.to_string()))
                .with_provider(self.provider.clone())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::new(UploadErrorKind::Fetch {
                status: status.as_u16(),
                url: url.clone(),
            })
            .with_provider(self.provider.clone())
            .into());
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty() && v != "application/octet-stream");

        let bytes = response.bytes().await.map_err(|e| {
            UploadError::new(UploadErrorKind::FetchTransport(e.to_string()))
                .with_provider(self.provider.clone())
        })?;
        let data = bytes.to_vec();

        let filename = url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();

        let mime_type = declared
            .or_else(|| mime_from_extension(&filename).map(String::from))
            .or_else(|| sniff_mime(&data).map(String::from))
            .unwrap_or_else(|| self.kind.fallback_mime().to_string());

        Ok((data, filename, mime_type))
    }

    fn guess_mime(&self, reference: &str) -> String {
        mime_from_extension(reference)
            .unwrap_or(self.kind.fallback_mime())
            .to_string()
    }
}

fn preview(source: &str) -> String {
    if source.len() <= 48 {
        source.to_string()
    } else {
        let cut = source
            .char_indices()
            .take_while(|(i, _)| *i < 48)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &source[..cut])
    }
}
