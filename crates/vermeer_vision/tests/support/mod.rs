//! Minimal HTTP stub shared by the integration tests.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Request lines seen by a stub, in arrival order.
pub type RequestLog = Arc<Mutex<Vec<String>>>;

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Bind a stub listener; the address is known before the handler is built,
/// so handlers can embed absolute URLs pointing back at the stub.
pub async fn bind() -> (std::net::SocketAddr, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, listener)
}

/// Serve connections, answering each request with `handler(request_line)`.
///
/// The handler returns a complete HTTP/1.1 response. Request bodies are
/// drained per Content-Length; request lines are appended to the log.
pub fn serve<F>(listener: TcpListener, log: RequestLog, handler: F)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            let log = log.clone();
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

                let mut body_len = buf.len() - head_end - 4;
                while body_len < content_length {
                    let Ok(n) = socket.read(&mut tmp).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    body_len += n;
                }

                log.lock().unwrap().push(request_line.clone());
                let response = handler(&request_line);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
}

/// A 200 response with a body and content type.
pub fn ok_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// A bodyless response with the given status line suffix ("404 Not Found").
pub fn status_response(status: &str) -> String {
    format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
}

/// A 200 response carrying extra headers before an empty JSON body.
pub fn ok_with_headers(extra_headers: &[(&str, &str)]) -> String {
    let mut response = String::from("HTTP/1.1 200 OK\r\n");
    for (name, value) in extra_headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("content-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}");
    response
}
