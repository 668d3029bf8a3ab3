//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use epiphany::config::ServerConfig;
use epiphany::lifecycle::Shutdown;
use epiphany::net::Listener;
use epiphany::storage::Item;
use epiphany::{HttpServer, MemoryStore, MetricsRegistry};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

pub const INDEX_HTML: &str = "<html><body>epiphany</body></html>";

/// A running server on an ephemeral port, backed by an in-memory store.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<MetricsRegistry>,
    pub handle: JoinHandle<epiphany::Result<()>>,
    _web_root: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// `n` items titled "Widget 0" .. "Widget n-1" priced 1.0 .. n.
pub fn widgets(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| Item::new(format!("Widget {i}"), (i + 1) as f64, format!("https://img/{i}.jpg")))
        .collect()
}

pub async fn start_server(items: Vec<Item>) -> TestServer {
    let web_root = tempfile::tempdir().unwrap();
    std::fs::write(web_root.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(web_root.path().join("style.css"), "body { margin: 0 }").unwrap();

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.listener.read_timeout_secs = 5;
    config.assets.web_root = web_root.path().to_string_lossy().into_owned();

    let store = Arc::new(MemoryStore::with_items(items));
    let registry = Arc::new(MetricsRegistry::new());
    let server = HttpServer::new(&config, store.clone(), registry.clone());

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    TestServer {
        addr,
        shutdown,
        store,
        registry,
        handle,
        _web_root: web_root,
    }
}

/// Send raw bytes, then read until the server closes the connection.
#[allow(dead_code)]
pub async fn raw_request(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Status code, head and body of a raw response.
#[allow(dead_code)]
pub fn split_response(raw: &str) -> (u16, &str, &str) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    (status, head, body)
}
