//! Files API strategy: resumable upload and the activation poll.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vermeer_core::{FileReference, FileState, UploadedFile};
use vermeer_vision::{GeminiFileStrategy, PollSchedule, UploadStrategy};

fn fast_poll() -> PollSchedule {
    PollSchedule {
        initial: Duration::from_millis(10),
        cap: Duration::from_millis(40),
        ceiling: Duration::from_secs(5),
    }
}

fn file_json(state: &str, base: &str) -> String {
    support::ok_response(
        "application/json",
        &format!(
            r#"{{"name":"files/poll-1","uri":"{base}/v1beta/files/poll-1","state":"{state}","mimeType":"image/png","sizeBytes":"4"}}"#
        ),
    )
}

/// Stub covering the full Files API surface: resumable start, finalize,
/// polling GET, and DELETE. `active_after` controls how many GETs report
/// `PROCESSING` before the file activates.
fn spawn_files_stub(
    addr: std::net::SocketAddr,
    listener: tokio::net::TcpListener,
    log: support::RequestLog,
    active_after: usize,
) -> Arc<AtomicUsize> {
    let polls = Arc::new(AtomicUsize::new(0));
    let poll_counter = polls.clone();
    let base = format!("http://{addr}");

    support::serve(listener, log, move |request_line| {
        if request_line.starts_with("POST /upload/v1beta/files") {
            support::ok_with_headers(&[("x-goog-upload-url", &format!("{base}/upload/session"))])
        } else if request_line.starts_with("POST /upload/session") {
            support::ok_response(
                "application/json",
                &format!(
                    r#"{{"file":{{"name":"files/poll-1","uri":"{base}/v1beta/files/poll-1","state":"PROCESSING","mimeType":"image/png","sizeBytes":"4"}}}}"#
                ),
            )
        } else if request_line.starts_with("GET /v1beta/files/poll-1") {
            let seen = poll_counter.fetch_add(1, Ordering::SeqCst);
            if seen < active_after {
                file_json("PROCESSING", &base)
            } else {
                file_json("ACTIVE", &base)
            }
        } else if request_line.starts_with("DELETE /v1beta/files/poll-1") {
            support::status_response("204 No Content")
        } else {
            support::status_response("404 Not Found")
        }
    });

    polls
}

#[tokio::test]
async fn upload_runs_the_two_phase_protocol() {
    let (addr, listener) = support::bind().await;
    let log: support::RequestLog = Default::default();
    spawn_files_stub(addr, listener, log.clone(), 0);

    let strategy =
        GeminiFileStrategy::new(&format!("http://{addr}/v1beta"), "test-key".to_string()).unwrap();
    let uploaded = strategy
        .upload(b"data", "photo.png", "image/png")
        .await
        .unwrap();

    assert_eq!(uploaded.id, "files/poll-1");
    assert_eq!(uploaded.filename, "photo.png");
    assert_eq!(uploaded.state, Some(FileState::Processing));
    assert_eq!(uploaded.size_bytes, 4);

    let seen = log.lock().unwrap();
    assert!(seen[0].starts_with("POST /upload/v1beta/files"));
    assert!(seen[1].starts_with("POST /upload/session"));
}

#[tokio::test]
async fn processing_file_is_polled_until_active() {
    let (addr, listener) = support::bind().await;
    let log: support::RequestLog = Default::default();
    let polls = spawn_files_stub(addr, listener, log, 2);

    let strategy =
        GeminiFileStrategy::new(&format!("http://{addr}/v1beta"), "test-key".to_string())
            .unwrap()
            .with_poll_schedule(fast_poll());

    let uploaded = strategy
        .upload(b"data", "photo.png", "image/png")
        .await
        .unwrap();
    let reference = strategy.reference_for_analysis(&uploaded).await.unwrap();

    match reference {
        FileReference::FileUri { uri, mime_type } => {
            assert_eq!(uri, format!("http://{addr}/v1beta/files/poll-1"));
            assert_eq!(mime_type, "image/png");
        }
        other => panic!("expected file URI, got {other:?}"),
    }
    // Two PROCESSING rounds, then the ACTIVE one.
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_file_errors_instead_of_hanging() {
    let strategy =
        GeminiFileStrategy::new("http://127.0.0.1:1/v1beta", "test-key".to_string()).unwrap();

    let failed = UploadedFile {
        id: "files/bad".to_string(),
        filename: "broken.png".to_string(),
        mime_type: "image/png".to_string(),
        size_bytes: 4,
        uri: None,
        url: None,
        state: Some(FileState::Failed),
        created_at: None,
        expires_at: None,
        sha256: None,
    };

    let err = strategy.reference_for_analysis(&failed).await.unwrap_err();
    assert_eq!(err.code(), "upload_error");
    assert!(err.to_string().contains("files/bad"));
}

#[tokio::test]
async fn active_file_without_handle_or_uri_has_no_usable_reference() {
    let strategy =
        GeminiFileStrategy::new("http://127.0.0.1:1/v1beta", "test-key".to_string()).unwrap();

    let anonymous = UploadedFile {
        id: String::new(),
        filename: "photo.png".to_string(),
        mime_type: "image/png".to_string(),
        size_bytes: 4,
        uri: None,
        url: None,
        state: Some(FileState::Active),
        created_at: None,
        expires_at: None,
        sha256: None,
    };

    let err = strategy
        .reference_for_analysis(&anonymous)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "upload_error");
    assert_eq!(err.provider(), Some("gemini"));
    assert!(err.to_string().contains("no usable reference"));
}

#[tokio::test]
async fn poll_gives_up_at_the_ceiling_with_a_timeout() {
    let (addr, listener) = support::bind().await;
    // Never activates.
    spawn_files_stub(addr, listener, Default::default(), usize::MAX);

    let strategy =
        GeminiFileStrategy::new(&format!("http://{addr}/v1beta"), "test-key".to_string())
            .unwrap()
            .with_poll_schedule(PollSchedule {
                initial: Duration::from_millis(10),
                cap: Duration::from_millis(20),
                ceiling: Duration::from_millis(60),
            });

    let uploaded = strategy
        .upload(b"data", "photo.png", "image/png")
        .await
        .unwrap();
    let err = strategy.reference_for_analysis(&uploaded).await.unwrap_err();
    assert_eq!(err.code(), "timeout");
}

#[tokio::test]
async fn cleanup_swallows_delete_failures() {
    // Nothing is listening here; cleanup must not panic or propagate.
    let strategy =
        GeminiFileStrategy::new("http://127.0.0.1:1/v1beta", "test-key".to_string()).unwrap();
    strategy.cleanup("files/gone").await;
}
