//! Configuration error types.

/// Configuration error with source location.
///
/// Raised at construction time when required configuration is missing or
/// invalid, before any request is served.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use vermeer_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing required field");
    /// assert!(err.message.contains("Missing required"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a ConfigError naming every missing field.
    ///
    /// Used by factories that validate configuration up front: all missing
    /// fields are reported at once rather than one per attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use vermeer_error::ConfigError;
    ///
    /// let err = ConfigError::missing_fields("vertex", &["storage.bucket", "storage.project"]);
    /// assert!(err.message.contains("storage.bucket"));
    /// assert!(err.message.contains("storage.project"));
    /// ```
    #[track_caller]
    pub fn missing_fields(section: &str, fields: &[&str]) -> Self {
        Self::new(format!(
            "Missing required configuration for {}: {}",
            section,
            fields.join(", ")
        ))
    }
}
