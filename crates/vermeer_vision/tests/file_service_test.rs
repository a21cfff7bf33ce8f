//! File handling service behavior: inline thresholds, policy gates, fetch
//! normalization, and pass-through of resolved sources.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vermeer_core::{data_uri, FileReference, MediaKind, MediaPolicy, UploadedFile};
use vermeer_error::VermeerResult;
use vermeer_vision::{FileHandlingService, UploadStrategy};

#[derive(Default)]
struct RecordingStrategy {
    uploads: AtomicUsize,
    cleanups: AtomicUsize,
}

#[async_trait::async_trait]
impl UploadStrategy for RecordingStrategy {
    fn provider(&self) -> &'static str {
        "recording"
    }

    async fn upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<UploadedFile> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedFile {
            id: "files/rec-1".to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: data.len() as u64,
            uri: Some("https://generativelanguage.googleapis.com/v1beta/files/rec-1".to_string()),
            url: None,
            state: Some(vermeer_core::FileState::Active),
            created_at: None,
            expires_at: None,
            sha256: None,
        })
    }

    async fn reference_for_analysis(&self, file: &UploadedFile) -> VermeerResult<FileReference> {
        Ok(FileReference::FileUri {
            uri: file.uri.clone().unwrap_or_else(|| file.id.clone()),
            mime_type: file.mime_type.clone(),
        })
    }

    async fn cleanup(&self, _file_id: &str) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

fn make_service(
    kind: MediaKind,
    inline_limit: u64,
    policy: MediaPolicy,
) -> (FileHandlingService, Arc<RecordingStrategy>) {
    let strategy = Arc::new(RecordingStrategy::default());
    let service = FileHandlingService::new(
        kind,
        "gemini",
        inline_limit,
        policy,
        strategy.clone() as Arc<dyn UploadStrategy>,
    )
    .unwrap();
    (service, strategy)
}

#[tokio::test]
async fn small_data_uri_is_returned_verbatim_without_any_upload() {
    let (service, strategy) = make_service(MediaKind::Image, 10 * 1024 * 1024, MediaPolicy::default());
    let source = data_uri("image/png", b"tiny image bytes");

    let reference = service.handle_source(&source).await.unwrap();

    assert_eq!(reference.as_reference_string(), source);
    assert!(matches!(reference, FileReference::Inline { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payload_at_threshold_inlines_and_one_byte_over_uploads() {
    let payload = vec![0x42u8; 64];

    let (service, strategy) = make_service(MediaKind::Image, 64, MediaPolicy::default());
    let at = service
        .handle_source(&data_uri("image/png", &payload))
        .await
        .unwrap();
    assert!(matches!(at, FileReference::Inline { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);

    let (service, strategy) = make_service(MediaKind::Image, 63, MediaPolicy::default());
    let over = service
        .handle_source(&data_uri("image/png", &payload))
        .await
        .unwrap();
    assert!(matches!(over, FileReference::FileUri { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_threshold_uploads_every_image() {
    let (service, strategy) = make_service(MediaKind::Image, 0, MediaPolicy::default());

    let reference = service
        .handle_source(&data_uri("image/png", b"x"))
        .await
        .unwrap();

    assert!(matches!(reference, FileReference::FileUri { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn videos_upload_even_under_the_threshold() {
    let (service, strategy) = make_service(MediaKind::Video, 10 * 1024 * 1024, MediaPolicy::default());

    let reference = service
        .handle_source(&data_uri("video/mp4", b"small video"))
        .await
        .unwrap();

    assert!(matches!(reference, FileReference::FileUri { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn large_local_file_uploads_exactly_once_with_no_automatic_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.png");
    std::fs::write(&path, vec![0u8; 15 * 1024 * 1024]).unwrap();

    let (service, strategy) = make_service(MediaKind::Image, 10 * 1024 * 1024, MediaPolicy::default());
    let reference = service
        .handle_source(path.to_str().unwrap())
        .await
        .unwrap();

    assert!(matches!(reference, FileReference::FileUri { .. }));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(strategy.cleanups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversize_payload_is_rejected_before_any_upload() {
    let policy = MediaPolicy {
        max_image_bytes: 4,
        ..Default::default()
    };
    let (service, strategy) = make_service(MediaKind::Image, 0, policy);

    let err = service
        .handle_source(&data_uri("image/png", b"eight by"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "size_exceeded");
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disallowed_format_is_rejected_before_any_upload() {
    let (service, strategy) = make_service(MediaKind::Image, 0, MediaPolicy::default());

    let err = service
        .handle_source(&data_uri("image/bmp", b"bitmap bytes"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "unsupported_format");
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolved_sources_pass_through_untouched() {
    let (service, strategy) = make_service(MediaKind::Image, 0, MediaPolicy::default());

    let handle = service.handle_source("files/abc-123").await.unwrap();
    assert_eq!(handle.as_reference_string(), "files/abc-123");

    let cloud = service
        .handle_source("gs://media/images/a.png")
        .await
        .unwrap();
    assert_eq!(cloud.as_reference_string(), "gs://media/images/a.png");
    assert_eq!(cloud.mime_type(), "image/png");

    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn video_urls_pass_through_unfetched() {
    let (service, strategy) = make_service(MediaKind::Video, 0, MediaPolicy::default());

    let reference = service
        .handle_source("https://example.com/clip.mp4")
        .await
        .unwrap();

    assert_eq!(
        reference,
        FileReference::Url {
            url: "https://example.com/clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        }
    );
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn escaped_ampersands_are_normalized_before_fetch() {
    let (addr, listener) = support::bind().await;
    let log: support::RequestLog = Default::default();
    support::serve(listener, log.clone(), |request_line| {
        if request_line.contains("a=1&b=2") {
            support::ok_response("image/png", "fakepngdata")
        } else {
            support::status_response("400 Bad Request")
        }
    });

    let (service, _) = make_service(MediaKind::Image, 10 * 1024 * 1024, MediaPolicy::default());
    let source = format!("http://{addr}/img.png?a=1\\&b=2");

    let reference = service.handle_source(&source).await.unwrap();

    assert!(matches!(reference, FileReference::Inline { .. }));
    assert_eq!(reference.mime_type(), "image/png");
    let seen = log.lock().unwrap();
    assert!(seen[0].contains("a=1&b=2"));
    assert!(!seen[0].contains('\\'));
}

#[tokio::test]
async fn fetch_failure_names_the_http_status() {
    let (addr, listener) = support::bind().await;
    support::serve(listener, Default::default(), |_| {
        support::status_response("404 Not Found")
    });

    let (service, strategy) = make_service(MediaKind::Image, 0, MediaPolicy::default());
    let err = service
        .handle_source(&format!("http://{addr}/gone.png"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "upload_error");
    assert!(err.to_string().contains("404"));
    assert_eq!(strategy.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_local_file_is_an_upload_error() {
    let (service, _) = make_service(MediaKind::Image, 0, MediaPolicy::default());

    let err = service
        .handle_source("/no/such/directory/image.png")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "upload_error");
}
