//! Per-connection I/O and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Read one request head off the socket, bounded in size and time
//! - Write a rendered response and close the write side
//! - Count in-flight connections so shutdown can drain them

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Using relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const READ_CHUNK: usize = 4096;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum ReadError {
    /// Peer closed the connection without sending anything.
    #[error("connection closed before any data was sent")]
    Empty,

    #[error("request head exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("timed out waiting for request")]
    Timeout,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a request head (request line and headers).
///
/// Reads until a blank line or EOF. Bytes past the blank line in the same
/// chunk are kept; callers only look at the head. Invalid UTF-8 is replaced
/// rather than rejected.
pub async fn read_request<R>(
    stream: &mut R,
    max_header_bytes: usize,
    timeout: Option<Duration>,
) -> Result<String, ReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match timeout {
            Some(limit) => tokio::time::timeout(limit, stream.read(&mut chunk))
                .await
                .map_err(|_| ReadError::Timeout)??,
            None => stream.read(&mut chunk).await?,
        };

        if n == 0 {
            if buf.is_empty() {
                return Err(ReadError::Empty);
            }
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = head_end(&buf) {
            if end > max_header_bytes {
                return Err(ReadError::TooLarge { limit: max_header_bytes });
            }
            break;
        }
        if buf.len() > max_header_bytes {
            return Err(ReadError::TooLarge { limit: max_header_bytes });
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Offset just past the blank line ending the head, if present.
fn head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Write the full response, then shut down the write half.
pub async fn write_response<W>(stream: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(&response.to_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed or `limit` elapses.
    /// Returns false if connections were still open at the deadline.
    pub async fn drain(&self, limit: Duration) -> bool {
        let wait = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
