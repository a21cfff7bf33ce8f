//! Media source format error types.

/// Format error with source location.
///
/// Raised when a media source string matches no classification rule, or a
/// data-URI fails to parse. These errors are always raised synchronously,
/// before any network call.
///
/// # Examples
///
/// ```
/// use vermeer_error::FormatError;
///
/// let err = FormatError::new("unrecognized media source: ???");
/// assert!(format!("{}", err).contains("unrecognized"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Format Error: {} at line {} in {}", message, line, file)]
pub struct FormatError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl FormatError {
    /// Create a new FormatError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
