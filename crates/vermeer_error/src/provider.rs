//! Vision provider error types.

/// Provider-specific error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Required API key environment variable not set
    #[display("{} environment variable not set", _0)]
    MissingApiKey(String),
    /// Failed to construct the HTTP client
    #[display("Failed to create client: {}", _0)]
    ClientCreation(String),
    /// API request failed at the transport level
    #[display("API request failed: {}", _0)]
    ApiRequest(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status, message)]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message from the response body
        message: String,
    },
    /// Generation call exceeded its deadline
    #[display("Request timed out after {}s", _0)]
    Timeout(u64),
    /// Response body did not match the expected shape
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
}

/// Provider error with location tracking, tagged with the originating backend.
///
/// # Examples
///
/// ```
/// use vermeer_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new("vertex", ProviderErrorKind::Timeout(60));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error [{}]: {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    /// Backend the error originated from ("gemini", "vertex")
    pub provider: &'static str,
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(provider: &'static str, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
