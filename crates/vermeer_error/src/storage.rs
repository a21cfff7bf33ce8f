//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to upload an object
    #[display("Failed to upload object: {}", _0)]
    Upload(String),
    /// Failed to download an object
    #[display("Failed to download object: {}", _0)]
    Download(String),
    /// Failed to delete an object
    #[display("Failed to delete object: {}", _0)]
    Delete(String),
    /// Failed to list objects
    #[display("Failed to list objects: {}", _0)]
    List(String),
    /// Object not found at the specified key
    #[display("Object not found: {}", _0)]
    NotFound(String),
    /// Failed to produce a signed URL
    #[display("Failed to sign URL: {}", _0)]
    SignedUrl(String),
    /// Failed to obtain storage credentials
    #[display("Failed to obtain credentials: {}", _0)]
    Credentials(String),
    /// Invalid storage configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
}

/// Storage error with location tracking, tagged with the originating backend.
///
/// # Examples
///
/// ```
/// use vermeer_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new("s3", StorageErrorKind::NotFound("images/a.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// assert_eq!(err.backend, "s3");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error [{}]: {} at line {} in {}", backend, kind, line, file)]
pub struct StorageError {
    /// Storage backend the error originated from ("s3", "gcs")
    pub backend: &'static str,
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(backend: &'static str, kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            backend,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }
}
