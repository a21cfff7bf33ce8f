//! Resolved file references passed to generation calls.

use serde::{Deserialize, Serialize};

/// Canonical resolved form of a media source, paired with its mime type.
///
/// Exactly one payload field exists per variant, matching the tag — the
/// tagged-union invariant from the data model holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileReference {
    /// Backend file handle or cloud storage URI (`files/...`, `gs://...`,
    /// or a resolved Gemini file URL).
    FileUri {
        /// The URI usable directly in a generation call
        uri: String,
        /// Mime type of the referenced media
        mime_type: String,
    },
    /// Publicly fetchable URL, passed through without staging.
    Url {
        /// The URL
        url: String,
        /// Mime type of the referenced media
        mime_type: String,
    },
    /// Inline base64 payload.
    Inline {
        /// Base64-encoded bytes
        data: String,
        /// Mime type of the inline media
        mime_type: String,
    },
}

impl FileReference {
    /// Mime type of the referenced media, regardless of variant.
    pub fn mime_type(&self) -> &str {
        match self {
            FileReference::FileUri { mime_type, .. }
            | FileReference::Url { mime_type, .. }
            | FileReference::Inline { mime_type, .. } => mime_type,
        }
    }

    /// The reference as the string a generation call consumes.
    ///
    /// Inline payloads render back to a data-URI; URIs and URLs pass through.
    pub fn as_reference_string(&self) -> String {
        match self {
            FileReference::FileUri { uri, .. } => uri.clone(),
            FileReference::Url { url, .. } => url.clone(),
            FileReference::Inline { data, mime_type } => {
                format!("data:{};base64,{}", mime_type, data)
            }
        }
    }
}
