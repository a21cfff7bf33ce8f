//! Upload error types.

/// Kinds of upload errors.
///
/// Covers the full staging pipeline: fetching or reading source bytes,
/// policy validation, and the upload call itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum UploadErrorKind {
    /// Remote fetch returned a non-success HTTP status
    #[display("Fetch failed with status {} for {}", status, url)]
    Fetch {
        /// HTTP status code returned by the remote server
        status: u16,
        /// URL that was fetched
        url: String,
    },
    /// Network-level failure while fetching a remote source
    #[display("Fetch failed: {}", _0)]
    FetchTransport(String),
    /// Failed to read a local file
    #[display("Failed to read local file: {}", _0)]
    FileRead(String),
    /// Media exceeds the configured maximum size
    #[display("File size {} bytes exceeds maximum of {} bytes", size, max)]
    SizeExceeded {
        /// Actual size of the media in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },
    /// Media format is not in the allowed list
    #[display("Unsupported media format: {}", _0)]
    UnsupportedFormat(String),
    /// Uploaded file lacks the identifier/URI needed to build a reference
    #[display("Uploaded file {} has no usable reference", _0)]
    MissingReference(String),
    /// Uploaded file reached a failed processing state
    #[display("Uploaded file {} entered failed state", _0)]
    FileFailed(String),
    /// The backend/storage upload call itself failed
    #[display("Upload failed: {}", _0)]
    Failed(String),
}

impl UploadErrorKind {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            UploadErrorKind::SizeExceeded { .. } => "size_exceeded",
            UploadErrorKind::UnsupportedFormat(_) => "unsupported_format",
            _ => "upload_error",
        }
    }
}

/// Upload error with location tracking and an optional backend tag.
///
/// # Examples
///
/// ```
/// use vermeer_error::{UploadError, UploadErrorKind};
///
/// let err = UploadError::new(UploadErrorKind::Fetch {
///     status: 404,
///     url: "https://example.com/a.jpg".to_string(),
/// })
/// .with_provider("gemini");
///
/// assert!(format!("{}", err).contains("404"));
/// assert_eq!(err.provider.as_deref(), Some("gemini"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upload Error: {} at line {} in {}", kind, line, file)]
pub struct UploadError {
    /// The kind of error that occurred
    pub kind: UploadErrorKind,
    /// Backend the upload was destined for, when known
    pub provider: Option<String>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl UploadError {
    /// Create a new upload error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UploadErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            provider: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Tag the error with the backend it originated from.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}
