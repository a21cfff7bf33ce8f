//! Media kinds and mime-type resolution.

use serde::{Deserialize, Serialize};

/// Kind of media a request is handling.
///
/// Vermeer runs one file handling service per kind; the two kinds differ in
/// inline policy (videos are never inlined) and size/format limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image content (PNG, JPEG, WebP, GIF, ...)
    Image,
    /// Video content (MP4, WebM, AVI, ...)
    Video,
}

impl MediaKind {
    /// String representation used in config sections and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Default mime type when neither extension nor byte signature resolves.
    pub fn fallback_mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

/// Look up a mime type from a filename extension.
///
/// # Examples
///
/// ```
/// use vermeer_core::mime_from_extension;
///
/// assert_eq!(mime_from_extension("photo.JPG"), Some("image/jpeg"));
/// assert_eq!(mime_from_extension("clip.webm"), Some("video/webm"));
/// assert_eq!(mime_from_extension("notes"), None);
/// ```
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit('.').next()?;
    if ext.len() == name.len() {
        return None; // no dot at all
    }
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "mp4" => Some("video/mp4"),
        "m4v" => Some("video/x-m4v"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "avi" => Some("video/x-msvideo"),
        "mkv" => Some("video/x-matroska"),
        "mpg" | "mpeg" => Some("video/mpeg"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Pick a filename extension (with leading dot) for a mime type.
///
/// Used when synthesizing object keys from uploads that arrived without a
/// filename. Unknown types get `.bin`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        "video/x-msvideo" => ".avi",
        "video/x-matroska" => ".mkv",
        "application/pdf" => ".pdf",
        _ => ".bin",
    }
}

/// Sniff a mime type from leading byte signatures.
///
/// Recognizes the common image magic numbers (PNG, JPEG, GIF, WebP) and
/// video container signatures (MP4 `ftyp` box, Matroska/WebM, RIFF/AVI).
/// Returns `None` when no signature matches.
///
/// # Examples
///
/// ```
/// use vermeer_core::sniff_mime;
///
/// assert_eq!(sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]), Some("image/png"));
/// assert_eq!(sniff_mime(b"plain text"), None);
/// ```
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 {
        return match bytes {
            b if b.starts_with(&[0xFF, 0xD8, 0xFF]) => Some("image/jpeg"),
            b if b.starts_with(b"GIF8") => Some("image/gif"),
            _ => None,
        };
    }

    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.starts_with(b"RIFF") {
        return match &bytes[8..12] {
            b"WEBP" => Some("image/webp"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }
    // ISO BMFF: size (4 bytes) then "ftyp"
    if &bytes[4..8] == b"ftyp" {
        return Some("video/mp4");
    }
    // Matroska/WebM EBML header
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(mime_from_extension("A.PNG"), Some("image/png"));
        assert_eq!(mime_from_extension("b.Mp4"), Some("video/mp4"));
    }

    #[test]
    fn sniffs_mp4_ftyp_box() {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x20];
        bytes.extend_from_slice(b"ftypisom");
        bytes.extend_from_slice(&[0u8; 8]);
        assert_eq!(sniff_mime(&bytes), Some("video/mp4"));
    }

    #[test]
    fn sniffs_webp_inside_riff() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(sniff_mime(&bytes), Some("image/webp"));
    }

    #[test]
    fn short_jpeg_prefix_still_matches() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
    }
}
