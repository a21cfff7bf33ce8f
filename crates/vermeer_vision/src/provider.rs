//! Vision provider abstraction.

use crate::options::{AnalysisOptions, AnalysisResult, Capabilities, ProviderInfo};
use vermeer_core::{MediaKind, UploadedFile};
use vermeer_error::VermeerResult;

/// A multimodal AI backend capable of analyzing images and videos.
///
/// Providers own their file handling services; callers hand over raw source
/// strings and get text back. File management passthroughs expose the
/// backend's upload/delete surface to the tool layer without it knowing
/// which staging path is in use.
#[async_trait::async_trait]
pub trait VisionProvider: Send + Sync {
    /// Static description of this backend.
    fn provider_info(&self) -> ProviderInfo;

    /// What this backend can do.
    fn capabilities(&self) -> Capabilities;

    /// Mime types this backend accepts for a media kind.
    fn supported_formats(&self, kind: MediaKind) -> Vec<String>;

    /// Analyze a single image.
    async fn analyze_image(
        &self,
        source: &str,
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult>;

    /// Analyze a single video.
    async fn analyze_video(
        &self,
        source: &str,
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult>;

    /// Analyze several images in one request.
    async fn compare_images(
        &self,
        sources: &[String],
        prompt: &str,
        options: &AnalysisOptions,
    ) -> VermeerResult<AnalysisResult>;

    /// Upload bytes through this backend's staging path.
    async fn upload_file(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile>;

    /// Download previously staged bytes, where the staging path supports it.
    async fn download_file(&self, id: &str) -> VermeerResult<Vec<u8>>;

    /// Delete a staged file by id/handle.
    async fn delete_file(&self, id: &str) -> VermeerResult<()>;

    /// Cheap liveness probe against the backend.
    async fn health_check(&self) -> VermeerResult<()>;
}

impl std::fmt::Debug for dyn VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProvider")
            .field("info", &self.provider_info())
            .finish_non_exhaustive()
    }
}
