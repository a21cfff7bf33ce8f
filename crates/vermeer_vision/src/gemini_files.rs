//! Gemini Files API upload strategy.
//!
//! Uses the resumable upload protocol: a start request announcing length and
//! content type, answered with a session URL, followed by a single
//! `upload, finalize` request carrying the bytes. Uploaded files activate
//! asynchronously; [`GeminiFileStrategy::reference_for_analysis`] polls the
//! file resource until it leaves `PROCESSING`.

use crate::strategy::UploadStrategy;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use vermeer_core::{FileReference, FileState, UploadedFile};
use vermeer_error::{
    ProviderError, ProviderErrorKind, UploadError, UploadErrorKind, VermeerResult,
};

const PROVIDER: &str = "gemini";

/// Backoff bounds for the activation poll.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    /// First sleep between polls; doubles each round.
    pub initial: Duration,
    /// Largest sleep between polls.
    pub cap: Duration,
    /// Total budget before the poll gives up with a timeout error.
    pub ceiling: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            cap: Duration::from_secs(8),
            ceiling: Duration::from_secs(120),
        }
    }
}

/// [`UploadStrategy`] that talks to the Gemini Files API directly.
pub struct GeminiFileStrategy {
    api_key: String,
    base_url: String,
    upload_url: String,
    client: reqwest::Client,
    poll: PollSchedule,
}

impl GeminiFileStrategy {
    /// Build a strategy for a base URL (`.../v1beta`) and API key.
    pub fn new(base_url: &str, api_key: String) -> VermeerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ClientCreation(e.to_string()))
            })?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let upload_url = match base_url.rsplit_once('/') {
            Some((root, version)) => format!("{root}/upload/{version}/files"),
            None => format!("{base_url}/upload/files"),
        };

        Ok(Self {
            api_key,
            base_url,
            upload_url,
            client,
            poll: PollSchedule::default(),
        })
    }

    /// Override the activation poll bounds.
    pub fn with_poll_schedule(mut self, poll: PollSchedule) -> Self {
        self.poll = poll;
        self
    }

    /// Fetch the current state of a file resource (`files/{id}`).
    async fn get_file(&self, name: &str) -> VermeerResult<UploadedFile> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ApiRequest(e.to_string()))
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::new(
                PROVIDER,
                ProviderErrorKind::Http {
                    status: response.status().as_u16(),
                    message: format!("fetching {name}"),
                },
            )
            .into());
        }

        let payload: FilePayload = response.json().await.map_err(|e| {
            ProviderError::new(PROVIDER, ProviderErrorKind::InvalidResponse(e.to_string()))
        })?;
        Ok(payload.into_uploaded(String::new()))
    }

    /// Delete a file by handle (`files/{id}`).
    pub async fn delete(&self, file_id: &str) -> VermeerResult<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.base_url, file_id))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ApiRequest(e.to_string()))
            })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ProviderError::new(
                PROVIDER,
                ProviderErrorKind::Http {
                    status: status.as_u16(),
                    message: format!("deleting {file_id}"),
                },
            )
            .into())
        }
    }
}

#[async_trait::async_trait]
impl UploadStrategy for GeminiFileStrategy {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, data), fields(provider = PROVIDER, size = data.len()))]
    async fn upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile> {
        let upload_err = |msg: String| {
            UploadError::new(UploadErrorKind::Failed(msg)).with_provider(PROVIDER)
        };

        // Phase one: announce the upload, get a session URL back.
        let start = self
            .client
            .post(&self.upload_url)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": filename } }))
            .send()
            .await
            .map_err(|e| upload_err(format!("start request failed: {e}")))?;

        if !start.status().is_success() {
            return Err(upload_err(format!("start returned {}", start.status())).into());
        }
        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| upload_err("start response missing upload URL".to_string()))?;

        // Phase two: send the bytes and finalize in one shot.
        let finalize = self
            .client
            .post(session_url)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| upload_err(format!("finalize request failed: {e}")))?;

        if !finalize.status().is_success() {
            return Err(upload_err(format!("finalize returned {}", finalize.status())).into());
        }

        let envelope: FileEnvelope = finalize
            .json()
            .await
            .map_err(|e| upload_err(format!("unreadable finalize response: {e}")))?;

        let uploaded = envelope.file.into_uploaded(filename.to_string());
        debug!(id = %uploaded.id, state = ?uploaded.state, "file uploaded");
        Ok(uploaded)
    }

    #[instrument(skip(self, file), fields(provider = PROVIDER, id = %file.id))]
    async fn reference_for_analysis(&self, file: &UploadedFile) -> VermeerResult<FileReference> {
        let mut current = file.clone();
        let mut delay = self.poll.initial;
        let mut elapsed = Duration::ZERO;

        loop {
            match current.state {
                Some(FileState::Active) | None => {
                    if current.uri.is_none() && current.id.is_empty() {
                        return Err(UploadError::new(UploadErrorKind::MissingReference(
                            current.filename.clone(),
                        ))
                        .with_provider(PROVIDER)
                        .into());
                    }
                    let uri = current
                        .uri
                        .clone()
                        .unwrap_or_else(|| format!("{}/{}", self.base_url, current.id));
                    return Ok(FileReference::FileUri {
                        uri,
                        mime_type: current.mime_type.clone(),
                    });
                }
                Some(FileState::Failed) => {
                    return Err(UploadError::new(UploadErrorKind::FileFailed(
                        current.id.clone(),
                    ))
                    .with_provider(PROVIDER)
                    .into());
                }
                Some(FileState::Processing) => {
                    if elapsed >= self.poll.ceiling {
                        return Err(ProviderError::new(
                            PROVIDER,
                            ProviderErrorKind::Timeout(self.poll.ceiling.as_secs()),
                        )
                        .into());
                    }
                    tokio::time::sleep(delay).await;
                    elapsed += delay;
                    delay = (delay * 2).min(self.poll.cap);

                    let mut refreshed = self.get_file(&current.id).await?;
                    refreshed.filename = current.filename.clone();
                    current = refreshed;
                }
            }
        }
    }

    async fn cleanup(&self, file_id: &str) {
        if let Err(e) = self.delete(file_id).await {
            warn!(file_id, error = %e, "file cleanup failed");
        }
    }
}

/// File resource as the API reports it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilePayload {
    name: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    size_bytes: Option<String>,
    #[serde(default)]
    create_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    expiration_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    sha256_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: FilePayload,
}

impl FilePayload {
    fn into_uploaded(self, filename: String) -> UploadedFile {
        UploadedFile {
            id: self.name,
            filename,
            mime_type: self
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: self
                .size_bytes
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            uri: self.uri,
            url: None,
            state: self.state.as_deref().map(FileState::parse),
            created_at: self.create_time,
            expires_at: self.expiration_time,
            sha256: self.sha256_hash,
        }
    }
}
