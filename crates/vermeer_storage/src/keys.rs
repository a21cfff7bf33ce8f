//! Object key synthesis and canonical cloud URI conversion.

use chrono::Utc;
use uuid::Uuid;
use vermeer_core::{extension_for_mime, mime_from_extension};

/// Type bucket an object lands under, derived from its mime type.
///
/// Images and videos get their own top-level prefixes; everything else goes
/// under `files/`.
pub fn type_bucket(mime_type: &str) -> &'static str {
    if mime_type.starts_with("image/") {
        "images"
    } else if mime_type.starts_with("video/") {
        "videos"
    } else {
        "files"
    }
}

/// Synthesize a collision-free object key for an upload.
///
/// The layout is `<bucket>/<YYYY-MM-DD>/<random id><ext>`. The extension
/// comes from the original filename when it has a recognized one, otherwise
/// from the mime type. Caller input never becomes part of the key beyond the
/// extension, so unsanitized filenames cannot influence object placement.
///
/// # Examples
///
/// ```
/// use vermeer_storage::synthesize_key;
///
/// let key = synthesize_key("holiday photo.PNG", "image/png");
/// assert!(key.starts_with("images/"));
/// assert!(key.ends_with(".png"));
/// ```
pub fn synthesize_key(filename: &str, mime_type: &str) -> String {
    let ext = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && mime_from_extension(filename).is_some() => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => extension_for_mime(mime_type).to_string(),
    };
    format!(
        "{}/{}/{}{}",
        type_bucket(mime_type),
        Utc::now().format("%Y-%m-%d"),
        Uuid::new_v4().simple(),
        ext
    )
}

/// Rewrite an object URL into the canonical `gs://bucket/path` form.
///
/// Enterprise backends only accept cloud URIs in this shape, while storage
/// providers hand out HTTPS object URLs. Handles all three shapes an object
/// URL can take:
///
/// - already canonical (`gs://bucket/path`) — returned unchanged
/// - virtual-host style (`https://bucket.host/path`)
/// - path style (`https://host/bucket/path`)
///
/// Returns `None` when the URL does not reference the given bucket.
///
/// # Examples
///
/// ```
/// use vermeer_storage::canonical_cloud_uri;
///
/// assert_eq!(
///     canonical_cloud_uri("https://storage.googleapis.com/media/images/a.png", "media"),
///     Some("gs://media/images/a.png".to_string()),
/// );
/// assert_eq!(
///     canonical_cloud_uri("gs://media/images/a.png", "media"),
///     Some("gs://media/images/a.png".to_string()),
/// );
/// ```
pub fn canonical_cloud_uri(url: &str, bucket: &str) -> Option<String> {
    if url.starts_with("gs://") {
        return Some(url.to_string());
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    let host = host.split(':').next().unwrap_or(host);

    // Virtual-host style: bucket is the leading host label.
    if host.strip_prefix(bucket).is_some_and(|r| r.starts_with('.')) {
        return Some(format!("gs://{}/{}", bucket, path));
    }

    // Path style: bucket is the first path segment.
    if let Some(key) = path.strip_prefix(bucket) {
        if let Some(key) = key.strip_prefix('/') {
            return Some(format!("gs://{}/{}", bucket, key));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_date_bucketed_and_unique() {
        let a = synthesize_key("a.jpg", "image/jpeg");
        let b = synthesize_key("a.jpg", "image/jpeg");
        assert_ne!(a, b);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        assert!(a.starts_with(&format!("images/{date}/")));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn unknown_extension_falls_back_to_mime() {
        let key = synthesize_key("upload.tmp", "video/mp4");
        assert!(key.starts_with("videos/"));
        assert!(key.ends_with(".mp4"));

        let key = synthesize_key("no-extension", "application/pdf");
        assert!(key.starts_with("files/"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn filename_stem_never_reaches_the_key() {
        let key = synthesize_key("../../etc/passwd.png", "image/png");
        assert!(!key.contains("passwd"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn canonical_conversion_covers_both_url_styles() {
        assert_eq!(
            canonical_cloud_uri("https://media.storage.googleapis.com/videos/a.mp4", "media"),
            Some("gs://media/videos/a.mp4".to_string()),
        );
        assert_eq!(
            canonical_cloud_uri("https://storage.googleapis.com/media/videos/a.mp4", "media"),
            Some("gs://media/videos/a.mp4".to_string()),
        );
        // A bucket that merely prefixes another name must not match.
        assert_eq!(
            canonical_cloud_uri("https://storage.googleapis.com/media2/videos/a.mp4", "media"),
            None,
        );
    }

    #[test]
    fn canonical_input_is_a_no_op() {
        let uri = "gs://media/images/2026-08-30/abc.png";
        assert_eq!(canonical_cloud_uri(uri, "media"), Some(uri.to_string()));
    }
}
