//! Integration tests for the S3-compatible provider against a local HTTP stub.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vermeer_storage::{S3CompatibleStorage, S3Config, StorageProvider};

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Minimal single-purpose object store: 200 for PUT, 404 for DELETE and
/// GET of unknown keys, a one-entry listing for ListObjectsV2.
async fn spawn_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut tmp = [0u8; 4096];
                let head_end = loop {
                    let Ok(n) = socket.read(&mut tmp).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&tmp[..n]);
                    if let Some(pos) = find(&buf, b"\r\n\r\n") {
                        break pos;
                    }
                };

                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let request_line = head.lines().next().unwrap_or_default().to_string();
                let content_length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);

                let mut body = buf[head_end + 4..].to_vec();
                while body.len() < content_length {
                    let Ok(n) = socket.read(&mut tmp).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    body.extend_from_slice(&tmp[..n]);
                }

                let response = if request_line.starts_with("PUT") {
                    "HTTP/1.1 200 OK\r\netag: \"stub-etag\"\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                        .to_string()
                } else if request_line.starts_with("DELETE") {
                    "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                        .to_string()
                } else if request_line.starts_with("GET") && request_line.contains("list-type=2") {
                    let xml = concat!(
                        "<ListBucketResult><Contents>",
                        "<Key>images/2026-08-30/stub.png</Key>",
                        "<LastModified>2026-08-30T00:00:00.000Z</LastModified>",
                        "<ETag>\"e1\"</ETag><Size>4</Size>",
                        "</Contents></ListBucketResult>",
                    );
                    format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/xml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{xml}",
                        xml.len()
                    )
                } else {
                    "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                        .to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

async fn storage_against(endpoint: &str) -> S3CompatibleStorage {
    S3CompatibleStorage::new(S3Config {
        bucket: "media".into(),
        region: "us-east-1".into(),
        access_key: "AKIDEXAMPLE".into(),
        secret_key: "secret".into(),
        endpoint: Some(endpoint.to_string()),
        path_style: true,
        cdn_base_url: None,
    })
    .unwrap()
}

#[tokio::test]
async fn upload_synthesizes_key_and_reports_etag() {
    let endpoint = spawn_stub().await;
    let storage = storage_against(&endpoint).await;

    let stored = storage
        .upload_file(b"test", "photo.png", "image/png")
        .await
        .unwrap();

    assert!(stored.key.starts_with("images/"));
    assert!(stored.key.ends_with(".png"));
    assert_ne!(stored.key, "photo.png");
    assert_eq!(stored.size_bytes, 4);
    assert_eq!(stored.etag.as_deref(), Some("stub-etag"));
    assert_eq!(stored.url, format!("{endpoint}/media/{}", stored.key));
}

#[tokio::test]
async fn deleting_a_missing_key_is_success() {
    let endpoint = spawn_stub().await;
    let storage = storage_against(&endpoint).await;

    storage
        .delete_file("images/2026-08-30/never-existed.png")
        .await
        .unwrap();
}

#[tokio::test]
async fn downloading_a_missing_key_is_not_found() {
    let endpoint = spawn_stub().await;
    let storage = storage_against(&endpoint).await;

    let err = storage
        .download_file("images/2026-08-30/never-existed.png")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn listing_yields_parsed_objects() {
    let endpoint = spawn_stub().await;
    let storage = storage_against(&endpoint).await;

    let files = storage.list_files(Some("images/")).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].key, "images/2026-08-30/stub.png");
    assert_eq!(files[0].mime_type, "image/png");
    assert_eq!(files[0].size_bytes, 4);
}

#[tokio::test]
async fn signed_urls_expire_after_the_requested_window() {
    let endpoint = spawn_stub().await;
    let storage = storage_against(&endpoint).await;

    let url = storage
        .signed_url("images/a.png", Duration::from_secs(600))
        .await
        .unwrap();
    assert!(url.contains("X-Amz-Expires=600"));
}
