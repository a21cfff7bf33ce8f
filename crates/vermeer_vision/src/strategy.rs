//! Upload strategy abstraction.

use vermeer_core::{FileReference, UploadedFile};
use vermeer_error::VermeerResult;

/// How large media reaches a backend: directly through its files API, or
/// staged through external object storage.
///
/// One strategy instance is built per provider at startup; configuration
/// problems surface at construction, never mid-request.
#[async_trait::async_trait]
pub trait UploadStrategy: Send + Sync {
    /// Backend name the strategy serves, used in error tags and log fields.
    fn provider(&self) -> &'static str;

    /// Upload bytes, returning the created file record.
    async fn upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile>;

    /// Turn an uploaded file into the reference a generation call consumes.
    ///
    /// For backends with asynchronous activation this waits (bounded) until
    /// the file is usable.
    async fn reference_for_analysis(&self, file: &UploadedFile) -> VermeerResult<FileReference>;

    /// Best-effort deletion of an uploaded file.
    ///
    /// Failures are logged at warn level and swallowed; cleanup is never on
    /// a request's critical path and is never triggered automatically.
    async fn cleanup(&self, file_id: &str);
}

impl std::fmt::Debug for dyn UploadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadStrategy")
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}
