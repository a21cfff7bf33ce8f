//! Vertex AI enterprise provider.
//!
//! Same `generateContent` dialect as the direct API, but authenticated with
//! OAuth bearer tokens, addressed per project/location, and with no native
//! file endpoint: all staged media goes through external object storage and
//! is referenced as `gs://bucket/path`. Generation calls run under explicit
//! deadlines since the enterprise endpoint has no implicit ones.

use crate::factory::vertex_staging_parts;
use crate::file_service::FileHandlingService;
use crate::options::{AnalysisOptions, AnalysisResult, Capabilities, ProviderInfo};
use crate::provider::VisionProvider;
use crate::storage_strategy::StorageUploadStrategy;
use crate::strategy::UploadStrategy;
use crate::wire::{
    error_message, into_result, Content, GenerateRequest, GenerateResponse, GenerationConfigBody,
    Part,
};
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_core::{
    classify, FileReference, GenerationConfig, MediaKind, SourceKind, UploadedFile, VermeerConfig,
};
use vermeer_error::{ProviderError, ProviderErrorKind, VermeerResult};
use vermeer_storage::auth::OauthTokenSource;
use vermeer_storage::StorageProvider;

const PROVIDER: &str = "vertex";

/// [`VisionProvider`] over a Vertex AI regional endpoint.
pub struct VertexProvider {
    project_id: String,
    location: String,
    model: String,
    inline_limit: u64,
    image_timeout: Duration,
    video_timeout: Duration,
    generation: GenerationConfig,
    client: reqwest::Client,
    token: OauthTokenSource,
    storage: Arc<dyn StorageProvider>,
    images: FileHandlingService,
    videos: FileHandlingService,
    image_formats: Vec<String>,
    video_formats: Vec<String>,
}

impl VertexProvider {
    /// Build a provider from the config snapshot.
    ///
    /// Fails fast with a config error naming every missing field (bucket,
    /// project, storage credentials) before any request is served.
    pub fn new(config: &VermeerConfig) -> VermeerResult<Self> {
        let parts = vertex_staging_parts(config)?;
        let strategy: Arc<dyn UploadStrategy> = Arc::new(StorageUploadStrategy::new(
            PROVIDER,
            parts.bucket,
            parts.storage.clone(),
        ));

        let images =
            FileHandlingService::from_config(MediaKind::Image, config, PROVIDER, strategy.clone())?;
        let videos =
            FileHandlingService::from_config(MediaKind::Video, config, PROVIDER, strategy)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ClientCreation(e.to_string()))
            })?;

        Ok(Self {
            project_id: parts.project_id,
            location: config.vertex.location.clone(),
            model: config.vertex.model.clone(),
            inline_limit: config.vertex.inline_limit_bytes,
            image_timeout: Duration::from_secs(config.vertex.image_timeout_secs),
            video_timeout: Duration::from_secs(config.vertex.video_timeout_secs),
            generation: config.generation.clone(),
            client,
            token: OauthTokenSource::new(PROVIDER),
            storage: parts.storage,
            images,
            videos,
            image_formats: config.policy.allowed_image_formats.clone(),
            video_formats: config.policy.allowed_video_formats.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{proj}/locations/{loc}/publishers/google/models/{model}:generateContent",
            loc = self.location,
            proj = self.project_id,
        )
    }

    fn deadline(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => self.image_timeout,
            MediaKind::Video => self.video_timeout,
        }
    }

    /// Build the media part for a resolved reference, re-classifying the
    /// rendered string with the shared classifier.
    fn media_part(&self, reference: &FileReference) -> Part {
        let rendered = reference.as_reference_string();
        match classify(&rendered) {
            Ok(SourceKind::DataUri { mime_type, data }) => Part::inline(
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(data),
            ),
            Ok(SourceKind::FileHandle(handle)) => Part::file(reference.mime_type(), handle),
            Ok(SourceKind::CloudUri(uri)) => Part::file(reference.mime_type(), uri),
            Ok(SourceKind::Url(url)) => Part::file(reference.mime_type(), url),
            Ok(SourceKind::LocalPath(_)) | Err(_) => Part::file(reference.mime_type(), rendered),
        }
    }

    async fn generate(
        &self,
        parts: Vec<Part>,
        kind: MediaKind,
        function: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let params = self
            .generation
            .resolve(&options.params, function, options.task.as_deref());
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfigBody::from_params(&params),
        };

        let deadline = self.deadline(kind);
        debug!(model, function, deadline_secs = deadline.as_secs(), "issuing generateContent");

        let call = async {
            let token = self.token.bearer_token(&self.client).await?;
            let response = self
                .client
                .post(self.endpoint(model))
                .bearer_auth(token)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    ProviderError::new(PROVIDER, ProviderErrorKind::ApiRequest(e.to_string()))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::new(
                    PROVIDER,
                    ProviderErrorKind::Http {
                        status: status.as_u16(),
                        message: error_message(&body),
                    },
                )
                .into());
            }

            let parsed: GenerateResponse = response.json().await.map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::InvalidResponse(e.to_string()))
            })?;
            into_result(parsed, model, PROVIDER)
        };

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(
                PROVIDER,
                ProviderErrorKind::Timeout(deadline.as_secs()),
            )
            .into()),
        }
    }
}

#[async_trait::async_trait]
impl VisionProvider for VertexProvider {
    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.to_string(),
            model: self.model.clone(),
            location: Some(self.location.clone()),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_video: true,
            supports_file_upload: false,
            max_inline_bytes: self.inline_limit,
        }
    }

    fn supported_formats(&self, kind: MediaKind) -> Vec<String> {
        match kind {
            MediaKind::Image => self.image_formats.clone(),
            MediaKind::Video => self.video_formats.clone(),
        }
    }

    #[instrument(skip(self, source, prompt, options), fields(provider = PROVIDER))]
    async fn analyze_image(
        &self,
        source: &str,
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult> {
        let reference = self.images.handle_source(source).await?;
        let parts = vec![Part::text(prompt), self.media_part(&reference)];
        self.generate(parts, MediaKind::Image, "analyze_image", options)
            .await
    }

    #[instrument(skip(self, source, prompt, options), fields(provider = PROVIDER))]
    async fn analyze_video(
        &self,
        source: &str,
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult> {
        let reference = self.videos.handle_source(source).await?;
        let parts = vec![Part::text(prompt), self.media_part(&reference)];
        self.generate(parts, MediaKind::Video, "analyze_video", options)
            .await
    }

    #[instrument(skip(self, sources, prompt, options), fields(provider = PROVIDER, count = sources.len()))]
    async fn compare_images(
        &self,
        sources: &[String],
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult> {
        let mut parts = vec![Part::text(prompt)];
        for source in sources {
            let reference = self.images.handle_source(source).await?;
            parts.push(self.media_part(&reference));
        }
        self.generate(parts, MediaKind::Image, "compare_images", options)
            .await
    }

    async fn upload_file(
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
            uri: Some(stored.url.clone()),
            url: Some(stored.url),
            state: None,
            created_at: Some(stored.last_modified),
            expires_at: None,
            sha256: None,
        })
    }

    async fn download_file(&self, id: &str) -> VermeerResult<Vec<u8>> {
        self.storage.download_file(id).await
    }

    async fn delete_file(&self, id: &str) -> VermeerResult<()> {
        self.storage.delete_file(id).await
    }

    /// Liveness is defined as "we can obtain credentials": it exercises the
    /// env/metadata token path without spending a generation call.
    async fn health_check(&self) -> VermeerResult<()> {
        self.token.bearer_token(&self.client).await.map(|_| ())
    }
}
