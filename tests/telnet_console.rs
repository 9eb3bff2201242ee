use rawline::config::Config;
use rawline::net::telnet::serve_listener;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn read_until(stream: &mut TcpStream, needle: &[u8]) -> Vec<u8> {
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    tokio::time::timeout(Duration::from_secs(5), async {
        while !seen.windows(needle.len()).any(|w| w == needle) {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early");
            seen.extend_from_slice(&buf[..n]);
        }
    })
    .await
    .expect("timed out waiting for console output");
    seen
}

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cfg = Arc::new(Config {
        symbols: vec!["println".to_string()],
        ..Config::default()
    });
    tokio::spawn(serve_listener(listener, cfg));
    addr
}

async fn start() -> TcpStream {
    let addr = start_server().await;
    TcpStream::connect(addr).await.unwrap()
}

#[tokio::test]
async fn negotiates_and_prompts() {
    let mut client = start().await;
    let greeting = read_until(&mut client, b"> ").await;
    // WILL ECHO
    assert!(greeting.windows(3).any(|w| w == [255, 251, 1]));
}

#[tokio::test]
async fn line_is_echoed_and_reported() {
    let mut client = start().await;
    read_until(&mut client, b"> ").await;

    client.write_all(b"hi\r\n").await.unwrap();
    let out = read_until(&mut client, b"104 105").await;
    assert!(out.starts_with(b"hi\r\n"));
    assert!(out.windows(8).any(|w| w == b"line: hi"));
}

#[tokio::test]
async fn tab_completes_configured_symbols() {
    let mut client = start().await;
    read_until(&mut client, b"> ").await;

    client.write_all(b"pri\t\r").await.unwrap();
    read_until(&mut client, b"line: println").await;
}

#[tokio::test]
async fn sessions_are_independent() {
    let addr = start_server().await;

    let mut a = TcpStream::connect(addr).await.unwrap();
    read_until(&mut a, b"> ").await;
    a.write_all(b"only-a\r").await.unwrap();
    read_until(&mut a, b"line: only-a").await;

    let mut b = TcpStream::connect(addr).await.unwrap();
    read_until(&mut b, b"> ").await;
    b.write_all(b"history\r").await.unwrap();
    let out = read_until(&mut b, b"history\r\n> ").await;
    assert!(out.windows(10).any(|w| w == b"   1  hist"));
    assert!(!out.windows(6).any(|w| w == b"only-a"));
}

#[tokio::test]
async fn exit_closes_connection() {
    let mut client = start().await;
    read_until(&mut client, b"> ").await;
    client.write_all(b"exit\r").await.unwrap();
    read_until(&mut client, b"bye\r\n").await;

    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
}
