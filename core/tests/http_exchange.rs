/*
 * http_exchange.rs
 * Copyright (C) 2026 The Portolano authors
 *
 * This file is part of Portolano, an asynchronous HTTP client engine.
 *
 * Portolano is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portolano is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portolano.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Exchanges against a local TCP listener acting as the peer.
//!
//! Run with:
//!   cargo test -p portolano_core --test http_exchange

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinHandle;

use portolano_core::exec::{ExecController, Execution};
use portolano_core::protocol::http::{ErrorKind, HttpClient, HttpClientConfig, Method};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn client(config: HttpClientConfig) -> HttpClient {
    init_tracing();
    HttpClient::new(ExecController::current().unwrap(), config)
}

/// Read one request (head plus Content-Length body) from the socket.
async fn read_request(sock: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if data.len() >= end + 4 + body_len {
                return data;
            }
        }
        let n = sock.read(&mut tmp).await.unwrap();
        if n == 0 {
            return data;
        }
        data.extend_from_slice(&tmp[..n]);
    }
}

/// Accept one connection, capture the request, write `response`, close.
async fn serve_once(response: &'static [u8]) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let request = read_request(&mut sock).await;
        sock.write_all(response).await.unwrap();
        sock.shutdown().await.ok();
        String::from_utf8(request).unwrap()
    });
    (addr, handle)
}

#[tokio::test]
async fn get_sends_default_headers_and_receives_body() {
    let (addr, server) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();

    let response = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/foo?x=1", addr));
        })
        .unwrap()
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /foo?x=1 HTTP/1.1\r\n"));
    assert!(request.contains(&format!("\r\nHost: {}\r\n", addr)));
    assert!(request.contains("\r\nConnection: close\r\n"));
    assert!(!request.to_ascii_lowercase().contains("content-length"));

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.status().reason, "OK");
    assert_eq!(response.headers().get("content-length"), Some("5"));
    assert_eq!(response.body().text(), "hello");
    assert!(response.body().content_type().is_text());
    assert_eq!(response.body().content_type().charset(), Some("utf-8"));
}

#[tokio::test]
async fn post_sends_content_length_and_empty_reply_has_empty_body() {
    let (addr, server) = serve_once(b"HTTP/1.1 204 No Content\r\nServer: test\r\n\r\n").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();

    let response = http
        .post(&execution, |spec| {
            spec.url(format!("http://{}/submit", addr))
                .header("Content-Type", "application/json")
                .body_slice(b"{\"a\":1}");
        })
        .unwrap()
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(request.contains("\r\nContent-Length: 7\r\n"));
    assert!(request.ends_with("\r\n\r\n{\"a\":1}"));

    assert_eq!(response.status_code(), 204);
    assert!(response.body().is_empty());
    assert_eq!(response.body().len(), 0);
    assert!(response.body().content_type().is_unknown());
}

#[tokio::test]
async fn post_configurator_may_override_method() {
    let (addr, server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    http.post(&execution, |spec| {
        spec.url(format!("http://{}/", addr)).method(Method::Put);
    })
    .unwrap()
    .await
    .unwrap();
    assert!(server.await.unwrap().starts_with("PUT / HTTP/1.1\r\n"));
}

#[tokio::test]
async fn chunked_response_is_aggregated() {
    let (addr, _server) = serve_once(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
    )
    .await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let response = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap();
    assert_eq!(response.body().text(), "Wikipedia");
}

#[tokio::test]
async fn read_until_close_response() {
    let (addr, _server) = serve_once(b"HTTP/1.0 200 OK\r\nContent-Type: text/html\r\n\r\n<p>hi</p>").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let response = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap();
    assert_eq!(response.body().text(), "<p>hi</p>");
    assert_eq!(response.body().content_type().essence(), "text/html");
}

#[tokio::test]
async fn interim_continue_is_skipped() {
    let (addr, _server) = serve_once(
        b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 201 Created\r\nContent-Length: 2\r\n\r\nok",
    )
    .await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let response = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap();
    assert_eq!(response.status_code(), 201);
    assert_eq!(response.body().text(), "ok");
}

#[tokio::test]
async fn head_response_has_no_body() {
    let (addr, _server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 1234\r\n\r\n").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let response = http
        .request(&execution, |spec| {
            spec.url(format!("http://{}/", addr)).method(Method::Head);
        })
        .unwrap()
        .await
        .unwrap();
    assert_eq!(response.headers().get("Content-Length"), Some("1234"));
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn oversized_response_fails_and_closes_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n0123456789")
            .await
            .unwrap();
        // The client must hang up without waiting for the rest of the body.
        let mut tmp = [0u8; 16];
        tokio::time::timeout(Duration::from_secs(5), sock.read(&mut tmp)).await
    });

    let http = client(HttpClientConfig::default().max_content_length(16));
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/big", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseTooLarge);

    let observed = server.await.unwrap().expect("client did not close the connection");
    assert!(matches!(observed, Ok(0) | Err(_)));
}

#[tokio::test]
async fn oversized_chunked_body_fails() {
    let (addr, _server) = serve_once(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n8\r\n01234567\r\n8\r\n89abcdef\r\n0\r\n\r\n",
    )
    .await;
    let http = client(HttpClientConfig::default().max_content_length(12));
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseTooLarge);
}

#[tokio::test]
async fn connect_failure_is_reported() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectFailed);
}

#[tokio::test]
async fn unsupported_scheme_fails_before_dispatch() {
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url("ftp://127.0.0.1:1/file");
        })
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.to_string().contains("ftp://127.0.0.1:1/file"));
}

#[tokio::test]
async fn tls_negotiation_failure_is_protocol_error() {
    // Plaintext peer: answers the ClientHello with HTTP bytes.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut tmp = [0u8; 1024];
        let _ = sock.read(&mut tmp).await;
        let _ = sock
            .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
            .await;
        let _ = sock.read(&mut tmp).await;
    });
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("https://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn premature_close_is_protocol_error() {
    let (addr, _server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn malformed_status_line_is_protocol_error() {
    let (addr, _server) = serve_once(b"garbage\r\n\r\n").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn read_timeout_fails_silent_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(sock);
    });

    let http = client(HttpClientConfig::default().read_timeout(Duration::from_millis(200)));
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn body_buffer_released_once_when_execution_closes() {
    let (addr, _server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ndata").await;
    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let response = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap();

    let buffer = response.body().buffer();
    assert_eq!(buffer.ref_count(), 1);
    assert_eq!(response.body().text(), "data");

    execution.close();
    assert!(buffer.is_freed());
    assert!(response.body().bytes().is_empty());
    drop(execution);
    assert_eq!(buffer.ref_count(), 0);
}

#[tokio::test]
async fn response_after_execution_closed_is_abandoned() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = sock
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ndata")
            .await;
    });

    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let promise = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap();
    execution.close();
    let err = promise.await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Abandoned);
}

#[tokio::test]
async fn peer_reset_while_sending_is_write_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (sock, _) = listener.accept().await.unwrap();
        drop(sock);
    });

    let http = client(HttpClientConfig::default());
    let execution = Execution::new();
    let body = vec![b'x'; 32 * 1024 * 1024];
    let err = http
        .post(&execution, move |spec| {
            spec.url(format!("http://{}/upload", addr)).body(body);
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WriteFailed);
}

#[tokio::test]
async fn connect_timeout_fails_unanswered_connect() {
    // A listener that never accepts: once its backlog is full, further SYNs go unanswered.
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = socket.local_addr().unwrap();
    let _listener = socket.listen(0).unwrap();
    let mut fillers = Vec::new();
    for _ in 0..8 {
        if let Ok(Ok(s)) =
            tokio::time::timeout(Duration::from_millis(100), TcpStream::connect(addr)).await
        {
            fillers.push(s);
        }
    }

    let http = client(HttpClientConfig::default().connect_timeout(Duration::from_millis(200)));
    let execution = Execution::new();
    let err = http
        .get(&execution, |spec| {
            spec.url(format!("http://{}/", addr));
        })
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    drop(fillers);
}

#[tokio::test]
#[ignore] // requires network; run with: cargo test --test http_exchange -- --ignored --nocapture
async fn https_get_over_system_trust() {
    let http = client(HttpClientConfig::default().connect_timeout(Duration::from_secs(15)));
    let execution = Execution::new();
    let response = http
        .get(&execution, |spec| {
            spec.url("https://example.com/").header("Accept", "text/html");
        })
        .unwrap()
        .await
        .expect("request failed");
    println!("Status: {}", response.status());
    for (name, value) in response.headers().iter() {
        println!("{}: {}", name, value);
    }
    assert!(response.status().is_success());
    assert!(response.body().text().contains("<html"));
}
