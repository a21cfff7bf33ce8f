//! Direct Gemini API provider.

use crate::file_service::FileHandlingService;
use crate::gemini_files::GeminiFileStrategy;
use crate::options::{AnalysisOptions, AnalysisResult, Capabilities, ProviderInfo};
use crate::provider::VisionProvider;
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

const PROVIDER: &str = "gemini";

/// [`VisionProvider`] over the public Gemini REST API.
pub struct GeminiProvider {
    model: String,
    base_url: String,
    api_key: String,
    inline_limit: u64,
    generation: GenerationConfig,
    client: reqwest::Client,
    files: Arc<GeminiFileStrategy>,
    images: FileHandlingService,
    videos: FileHandlingService,
    image_formats: Vec<String>,
    video_formats: Vec<String>,
}

impl GeminiProvider {
    /// Build a provider from the config snapshot. Requires `GEMINI_API_KEY`.
    pub fn new(config: &VermeerConfig) -> VermeerResult<Self> {
        let api_key = config.gemini.api_key()?;
        let files = Arc::new(GeminiFileStrategy::new(
            &config.gemini.base_url,
            api_key.clone(),
        )?);

        let images = FileHandlingService::from_config(
            MediaKind::Image,
            config,
            PROVIDER,
            files.clone() as Arc<dyn UploadStrategy>,
        )?;
        let videos = FileHandlingService::from_config(
            MediaKind::Video,
            config,
            PROVIDER,
            files.clone() as Arc<dyn UploadStrategy>,
        )?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ClientCreation(e.to_string()))
            })?;

        Ok(Self {
            model: config.gemini.model.clone(),
            base_url: config.gemini.base_url.trim_end_matches('/').to_string(),
            api_key,
            inline_limit: config.gemini.inline_limit_bytes,
            generation: config.generation.clone(),
            client,
            files,
            images,
            videos,
            image_formats: config.policy.allowed_image_formats.clone(),
            video_formats: config.policy.allowed_video_formats.clone(),
        })
    }

    /// Build the media part for a resolved reference.
    ///
    /// The reference string goes back through the classifier, so this site
    /// and the file service can never disagree about what a string means.
    fn media_part(&self, reference: &FileReference) -> Part {
        let rendered = reference.as_reference_string();
        match classify(&rendered) {
            Ok(SourceKind::DataUri { mime_type, data }) => Part::inline(
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(data),
            ),
            Ok(SourceKind::FileHandle(handle)) => {
                let uri = if handle.starts_with("http") {
                    handle
                } else {
                    format!("{}/{}", self.base_url, handle)
                };
                Part::file(reference.mime_type(), uri)
            }
            Ok(SourceKind::CloudUri(uri)) => Part::file(reference.mime_type(), uri),
            Ok(SourceKind::Url(url)) => Part::file(reference.mime_type(), url),
            Ok(SourceKind::LocalPath(_)) | Err(_) => {
                Part::file(reference.mime_type(), rendered)
            }
        }
    }

    async fn generate(
        &self,
        parts: Vec<Part>,
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

        debug!(model, function, "issuing generateContent");
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
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
    }
}

#[async_trait::async_trait]
impl VisionProvider for GeminiProvider {
    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.to_string(),
            model: self.model.clone(),
            location: None,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_video: true,
            supports_file_upload: true,
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
        self.generate(parts, "analyze_image", options).await
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
        self.generate(parts, "analyze_video", options).await
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
        self.generate(parts, "compare_images", options).await
    }

    async fn upload_file(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile> {
        self.files.upload(data, filename, mime_type).await
    }

    async fn download_file(&self, id: &str) -> VermeerResult<Vec<u8>> {
        Err(ProviderError::new(
            PROVIDER,
            ProviderErrorKind::ApiRequest(format!(
                "the Files API does not expose downloads (requested {id})"
            )),
        )
        .into())
    }

    async fn delete_file(&self, id: &str) -> VermeerResult<()> {
        self.files.delete(id).await
    }

    async fn health_check(&self) -> VermeerResult<()> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(PROVIDER, ProviderErrorKind::ApiRequest(e.to_string()))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::new(
                PROVIDER,
                ProviderErrorKind::Http {
                    status: response.status().as_u16(),
                    message: "health check".to_string(),
                },
            )
            .into())
        }
    }
}
