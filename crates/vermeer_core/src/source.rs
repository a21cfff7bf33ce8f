//! Media source classification.
//!
//! Every media-source string a tool receives is ambiguous: it may be an
//! inline data-URI, an already-resolved backend file handle, a cloud storage
//! URI, a fetchable URL, or a local path. Classification is total — every
//! input falls into exactly one category or is rejected with a format error —
//! and is used identically by the file handling service (to decide how to
//! stage bytes) and by each vision provider (to phrase its request payload).

use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;
use vermeer_error::FormatError;

/// Prefix marking an already-resolved Gemini Files API handle.
pub const GEMINI_HANDLE_PREFIX: &str = "files/";

/// Hostname of resolved Gemini file URIs.
pub const GEMINI_FILE_HOST: &str = "generativelanguage.googleapis.com";

/// Classification of a media source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Inline `data:<mime>;base64,<payload>` URI, decoded.
    DataUri {
        /// Mime type declared by the URI
        mime_type: String,
        /// Decoded payload bytes
        data: Vec<u8>,
    },
    /// Already-resolved backend file handle (`files/...` or a Gemini file URL).
    FileHandle(String),
    /// Already-resolved cloud storage URI (`gs://bucket/path`).
    CloudUri(String),
    /// Fetchable http(s) URL.
    Url(String),
    /// Local filesystem path.
    LocalPath(String),
}

impl SourceKind {
    /// Whether this source is already usable by a backend generation call,
    /// requiring no fetch, upload, or size check.
    pub fn is_resolved(&self) -> bool {
        matches!(self, SourceKind::FileHandle(_) | SourceKind::CloudUri(_))
    }
}

fn data_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+);base64,(?P<data>[A-Za-z0-9+/=]+)$")
            .expect("data URI regex is valid")
    })
}

fn drive_letter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]:[/\\]").expect("drive letter regex is valid"))
}

fn looks_like_local_path(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with(".\\")
        || source.starts_with("..\\")
        || source.starts_with("\\\\")
        || drive_letter_regex().is_match(source)
        || (source.contains('\\') && !source.contains("://"))
}

/// Classify a media source string.
///
/// Rules are applied in priority order:
///
/// 1. Gemini file handle (`files/` prefix or the Gemini host) → [`SourceKind::FileHandle`]
/// 2. `gs://` scheme → [`SourceKind::CloudUri`]
/// 3. Base64 data-URI → [`SourceKind::DataUri`] (decoded; malformed payloads
///    are format errors)
/// 4. `http://` / `https://` → [`SourceKind::Url`]
/// 5. Local path patterns (absolute POSIX, `./`/`../` relative, drive
///    letter, UNC, backslash-relative) → [`SourceKind::LocalPath`]
/// 6. Anything else → format error.
///
/// Classification performs no I/O and is deterministic: the same input always
/// yields the same category.
///
/// # Examples
///
/// ```
/// use vermeer_core::{classify, SourceKind};
///
/// assert_eq!(
///     classify("gs://bucket/images/a.png").unwrap(),
///     SourceKind::CloudUri("gs://bucket/images/a.png".to_string())
/// );
/// assert!(classify("not a source").is_err());
/// ```
pub fn classify(source: &str) -> Result<SourceKind, FormatError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(FormatError::new("empty media source"));
    }

    if trimmed.starts_with(GEMINI_HANDLE_PREFIX) || trimmed.contains(GEMINI_FILE_HOST) {
        return Ok(SourceKind::FileHandle(trimmed.to_string()));
    }

    if trimmed.starts_with("gs://") {
        return Ok(SourceKind::CloudUri(trimmed.to_string()));
    }

    if trimmed.starts_with("data:") {
        let caps = data_uri_regex().captures(trimmed).ok_or_else(|| {
            FormatError::new(format!(
                "malformed data URI: {}",
                &trimmed[..trimmed.len().min(64)]
            ))
        })?;
        let mime_type = caps["mime"].to_string();
        let data = base64::engine::general_purpose::STANDARD
            .decode(&caps["data"])
            .map_err(|e| FormatError::new(format!("invalid base64 payload in data URI: {e}")))?;
        return Ok(SourceKind::DataUri { mime_type, data });
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(SourceKind::Url(trimmed.to_string()));
    }

    if looks_like_local_path(trimmed) {
        return Ok(SourceKind::LocalPath(trimmed.to_string()));
    }

    Err(FormatError::new(format!(
        "unrecognized media source: {}",
        &trimmed[..trimmed.len().min(64)]
    )))
}

/// Encode bytes as a `data:<mime>;base64,<payload>` URI.
///
/// Round-trips with [`classify`]: decoding the result recovers the original
/// bytes and mime type exactly.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_handle_prefix_wins_over_url_rule() {
        let uri = "https://generativelanguage.googleapis.com/v1beta/files/abc123";
        assert_eq!(classify(uri).unwrap(), SourceKind::FileHandle(uri.to_string()));
    }

    #[test]
    fn windows_paths_classify_as_local() {
        for p in ["C:\\media\\a.png", "C:/media/a.png", "\\\\server\\share\\a.png", "..\\a.png"] {
            assert!(matches!(classify(p).unwrap(), SourceKind::LocalPath(_)), "{p}");
        }
    }

    #[test]
    fn malformed_data_uri_is_format_error() {
        assert!(classify("data:image/png;base64").is_err());
        assert!(classify("data:image/png;base64,%%%").is_err());
    }
}
