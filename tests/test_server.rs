//! Socket-level tests: listener, connection state machine, writer

use std::fs;
use std::sync::Arc;

use staticd::files::Dispatcher;
use staticd::server::listener;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(list_directories: bool) -> (TempDir, std::net::SocketAddr) {
    let site = TempDir::new().unwrap();
    fs::write(site.path().join("hello.txt"), "hello, world").unwrap();
    fs::create_dir(site.path().join("docs")).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let dispatcher = Arc::new(Dispatcher::new(site.path(), list_directories));
    tokio::spawn(listener::serve(listener, dispatcher));

    (site, addr)
}

async fn exchange(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_get_over_socket() {
    let (_site, addr) = start(false).await;

    let reply = exchange(
        addr,
        "GET /hello.txt HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: text/plain\r\n"));
    assert!(reply.contains("Content-Length: 12\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
    assert!(reply.ends_with("\r\n\r\nhello, world"));
}

#[tokio::test]
async fn test_keep_alive_serves_pipelined_requests() {
    let (_site, addr) = start(false).await;

    let reply = exchange(
        addr,
        "GET /hello.txt HTTP/1.1\r\nHost: test\r\n\r\n\
         GET /missing HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(reply.matches("HTTP/1.1 ").count(), 2);
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_head_over_socket_has_no_body() {
    let (_site, addr) = start(false).await;

    let reply = exchange(
        addr,
        "HEAD /hello.txt HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Length: 12\r\n"));
    assert!(reply.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_redirect_over_socket() {
    let (_site, addr) = start(false).await;

    let reply = exchange(addr, "GET /docs HTTP/1.0\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
    assert!(reply.contains("Location: /docs/\r\n"));
}

#[tokio::test]
async fn test_unknown_method_over_socket() {
    let (_site, addr) = start(false).await;

    let reply = exchange(addr, "BREW /hello.txt HTTP/1.0\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(reply.contains("Allow: GET, HEAD\r\n"));
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let (_site, addr) = start(false).await;

    let reply = exchange(addr, "GET /hello.txt HTTP/1.1\r\nNoColonHere\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_oversized_body_gets_400() {
    let (_site, addr) = start(false).await;

    let reply = exchange(
        addr,
        "GET /hello.txt HTTP/1.1\r\nContent-Length: 99999999999\r\n\r\nabc",
    )
    .await;

    assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_large_file_is_streamed_whole() {
    let (site, addr) = start(false).await;
    let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(site.path().join("movie.mp4"), &payload).unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /movie.mp4 HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    let split = out.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let head = String::from_utf8(out[..split].to_vec()).unwrap();
    assert!(head.contains("Content-Type: video/mp4\r\n"));
    assert!(head.contains("Content-Length: 300000\r\n"));
    assert_eq!(&out[split..], payload.as_slice());
}
