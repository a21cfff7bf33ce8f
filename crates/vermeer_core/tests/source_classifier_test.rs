//! Tests for media source classification.

use base64::Engine;
use vermeer_core::{classify, data_uri, SourceKind};

#[test]
fn classification_is_total_and_deterministic() {
    let sources = [
        "data:image/png;base64,aGVsbG8=",
        "files/abc-123",
        "https://generativelanguage.googleapis.com/v1beta/files/abc",
        "gs://bucket/videos/2026-01-01/a.mp4",
        "https://example.com/a.jpg",
        "http://example.com/a.jpg",
        "/var/media/a.png",
        "./relative.png",
        "../up/one.png",
        "C:\\media\\a.png",
        "\\\\server\\share\\a.png",
    ];

    for source in sources {
        let first = classify(source).unwrap();
        // Re-running the same classification yields the same category.
        let second = classify(source).unwrap();
        assert_eq!(first, second, "unstable classification for {source}");
    }
}

#[test]
fn each_rule_yields_its_category() {
    assert!(matches!(
        classify("data:image/png;base64,aGVsbG8=").unwrap(),
        SourceKind::DataUri { .. }
    ));
    assert!(matches!(classify("files/xyz").unwrap(), SourceKind::FileHandle(_)));
    assert!(matches!(
        classify("gs://bucket/images/a.png").unwrap(),
        SourceKind::CloudUri(_)
    ));
    assert!(matches!(
        classify("https://example.com/a.jpg").unwrap(),
        SourceKind::Url(_)
    ));
    assert!(matches!(classify("/tmp/a.jpg").unwrap(), SourceKind::LocalPath(_)));
}

#[test]
fn unmatched_input_is_a_format_error() {
    for source in ["", "just words", "ftp://example.com/a.jpg", "a.jpg"] {
        assert!(classify(source).is_err(), "expected format error for {source:?}");
    }
}

#[test]
fn data_uri_round_trip_recovers_bytes_and_mime() {
    let bytes: Vec<u8> = (0u8..=255).collect();
    let uri = data_uri("image/webp", &bytes);

    match classify(&uri).unwrap() {
        SourceKind::DataUri { mime_type, data } => {
            assert_eq!(mime_type, "image/webp");
            assert_eq!(data, bytes);
        }
        other => panic!("expected data URI, got {other:?}"),
    }
}

#[test]
fn resolved_sources_need_no_staging() {
    assert!(classify("files/xyz").unwrap().is_resolved());
    assert!(classify("gs://bucket/a.png").unwrap().is_resolved());
    assert!(!classify("https://example.com/a.jpg").unwrap().is_resolved());
    assert!(!classify("/tmp/a.jpg").unwrap().is_resolved());
}

#[test]
fn data_uri_mime_is_taken_from_declaration() {
    // A declared mime type wins even when the payload's signature disagrees;
    // sniffing is only a fallback for sources without a declaration.
    let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let payload = base64::engine::general_purpose::STANDARD.encode(png_magic);
    let uri = format!("data:image/jpeg;base64,{payload}");

    match classify(&uri).unwrap() {
        SourceKind::DataUri { mime_type, .. } => assert_eq!(mime_type, "image/jpeg"),
        other => panic!("expected data URI, got {other:?}"),
    }
}
