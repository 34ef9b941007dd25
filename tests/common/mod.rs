#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use watchkv::KvNodeConfig;
use watchkv::MemKvStore;
use watchkv::Node;
use watchkv::NodeBuilder;

pub const TOKEN: &str = "integration-token";

pub struct TestServer {
    pub node: Arc<Node>,
    pub addr: SocketAddr,
    pub shutdown_tx: watch::Sender<()>,
    pub server: JoinHandle<()>,
}

pub fn test_config(watch_timeout_ms: u64) -> KvNodeConfig {
    let mut config = KvNodeConfig::default();
    config.auth.token = TOKEN.to_string();
    config.watch.timeout_ms = watch_timeout_ms;
    config
}

pub fn build_node(
    config: KvNodeConfig,
    shutdown_rx: watch::Receiver<()>,
) -> Arc<Node> {
    NodeBuilder::init(config, shutdown_rx)
        .store(Arc::new(MemKvStore::new()))
        .build()
        .expect("node builds")
        .ready()
        .expect("node ready")
}

/// Serves a fresh in-memory node on an ephemeral localhost port.
pub async fn start_server(watch_timeout_ms: u64) -> TestServer {
    start_server_with(test_config(watch_timeout_ms)).await
}

pub async fn start_server_with(config: KvNodeConfig) -> TestServer {
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let node = build_node(config, shutdown_rx);
    let (addr, server) = node.bind(([127, 0, 0, 1], 0).into()).expect("bind");
    let server = tokio::spawn(server);
    TestServer {
        node,
        addr,
        shutdown_tx,
        server,
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP/1.1 exchange over a fresh connection.
pub async fn http(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: &[u8],
) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let mut request = format!(
        "{method} {path} HTTP/1.1\r\nhost: {addr}\r\nconnection: close\r\ncontent-length: {}\r\n",
        body.len()
    );
    if let Some(token) = token {
        request.push_str(&format!("authorization: Bearer {token}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.expect("write head");
    stream.write_all(body).await.expect("write body");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    parse_response(&raw)
}

/// Sends `body` with `transfer-encoding: chunked`, one chunk per element.
pub async fn http_chunked(
    addr: SocketAddr,
    method: &str,
    path: &str,
    chunks: &[&[u8]],
) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let head = format!(
        "{method} {path} HTTP/1.1\r\nhost: {addr}\r\nconnection: close\r\n\
         transfer-encoding: chunked\r\nauthorization: Bearer {TOKEN}\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.expect("write head");
    for chunk in chunks {
        stream
            .write_all(format!("{:x}\r\n", chunk.len()).as_bytes())
            .await
            .expect("write chunk size");
        stream.write_all(chunk).await.expect("write chunk");
        stream.write_all(b"\r\n").await.expect("write chunk end");
    }
    stream.write_all(b"0\r\n\r\n").await.expect("write last chunk");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    parse_response(&raw)
}

/// Sends a keep-alive `GET` and returns the still-open connection without
/// reading the response.
pub async fn open_request(
    addr: SocketAddr,
    path: &str,
) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let head = format!("GET {path} HTTP/1.1\r\nhost: {addr}\r\nauthorization: Bearer {TOKEN}\r\n\r\n");
    stream.write_all(head.as_bytes()).await.expect("write head");
    stream
}

fn parse_response(raw: &[u8]) -> HttpResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("complete response head");
    let head = String::from_utf8_lossy(&raw[..split]);
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    HttpResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
