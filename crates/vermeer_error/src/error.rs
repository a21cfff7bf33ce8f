//! Top-level error wrapper types.

use crate::{ConfigError, FormatError, ProviderError, ProviderErrorKind, StorageError, UploadError};

/// Discriminated union over every Vermeer error domain.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerError, FormatError};
///
/// let fmt_err = FormatError::new("unrecognized media source");
/// let err: VermeerError = fmt_err.into();
/// assert_eq!(err.code(), "format_error");
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VermeerErrorKind {
    /// Media source classification/format error
    #[from(FormatError)]
    Format(FormatError),
    /// Fetch/read/decode/upload failure
    #[from(UploadError)]
    Upload(UploadError),
    /// Object storage failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Vision backend failure
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Missing or invalid configuration
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Vermeer error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerResult, ConfigError};
///
/// fn might_fail() -> VermeerResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vermeer Error: {}", _0)]
pub struct VermeerError(Box<VermeerErrorKind>);

impl VermeerError {
    /// Create a new error from a kind.
    pub fn new(kind: VermeerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VermeerErrorKind {
        &self.0
    }

    /// Stable machine-readable code for the MCP error payload.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            VermeerErrorKind::Format(_) => "format_error",
            VermeerErrorKind::Upload(e) => e.kind.code(),
            VermeerErrorKind::Storage(e) => {
                if e.is_not_found() {
                    "not_found"
                } else {
                    "storage_error"
                }
            }
            VermeerErrorKind::Provider(e) => match e.kind {
                ProviderErrorKind::Timeout(_) => "timeout",
                _ => "provider_error",
            },
            VermeerErrorKind::Config(_) => "config_error",
        }
    }

    /// Backend tag carried by the error, when known.
    pub fn provider(&self) -> Option<&str> {
        match self.kind() {
            VermeerErrorKind::Upload(e) => e.provider.as_deref(),
            VermeerErrorKind::Storage(e) => Some(e.backend),
            VermeerErrorKind::Provider(e) => Some(e.provider),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to VermeerErrorKind
impl<T> From<T> for VermeerError
where
    T: Into<VermeerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vermeer operations.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerResult, FormatError};
///
/// fn classify() -> VermeerResult<String> {
///     Err(FormatError::new("unrecognized media source"))?
/// }
/// ```
pub type VermeerResult<T> = std::result::Result<T, VermeerError>;
