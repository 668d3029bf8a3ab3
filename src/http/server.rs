//! HTTP server: the connection loop.
//!
//! # Responsibilities
//! - Accept connections from a bounded [`Listener`]
//! - Read one request head per connection and dispatch it to the [`Router`]
//! - Record request count and latency once the response is ready
//! - Attach a request ID, write the response and close
//! - Stop accepting on shutdown and drain in-flight connections
//!
//! # Design Decisions
//! - One request per connection (`Connection: close`)
//! - Dispatch touches the store synchronously, so it runs on the blocking pool
//! - With the default single permit, connections are handled strictly in order

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ListenerConfig, ServerConfig};
use crate::http::assets::{AssetSource, FsAssets};
use crate::http::request::request_line_summary;
use crate::http::response::{Response, Status};
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::{read_request, write_response, ConnectionId, ConnectionTracker, ReadError};
use crate::net::listener::{Listener, ListenerError};
use crate::observability::{metrics, MetricsRegistry};
use crate::routing::Router;
use crate::search::{QueryService, Searcher};
use crate::storage::Store;

/// Header carrying the per-request UUID.
pub const X_REQUEST_ID: &str = "X-Request-Id";

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Pause after a failed accept (e.g. EMFILE) before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server for the search service.
pub struct HttpServer {
    router: Arc<Router>,
    max_header_bytes: usize,
    read_timeout: Option<Duration>,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Wire the query service, static assets and metrics into a router.
    pub fn new(config: &ServerConfig, store: Arc<dyn Store>, registry: Arc<MetricsRegistry>) -> Self {
        let qrs = QueryService::new(Searcher::new(store), config.search.aggregates_enabled);
        let assets: Arc<dyn AssetSource> = Arc::new(FsAssets::new(config.assets.web_root.clone()));
        Self::from_router(Router::new(qrs, registry, assets), &config.listener)
    }

    pub fn from_router(router: Router, config: &ListenerConfig) -> Self {
        let read_timeout = match config.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            router: Arc::new(router),
            max_header_bytes: config.max_header_bytes,
            read_timeout,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> crate::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            "HTTP server starting"
        );

        let handler = Arc::new(ConnectionHandler {
            router: Arc::clone(&self.router),
            max_header_bytes: self.max_header_bytes,
            read_timeout: self.read_timeout,
        });

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let guard = self.tracker.track();
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move {
                            handler.handle(stream, peer, guard.id()).await;
                            drop(permit);
                            drop(guard);
                        });
                    }
                    Err(e) => match accept_retry_delay(&e) {
                        Some(delay) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e.into()),
                    },
                },
            }
        }

        if !self.tracker.drain(DRAIN_TIMEOUT).await {
            tracing::warn!(
                active = self.tracker.active_count(),
                "Drain deadline reached with connections still open"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// How long to wait before accepting again, or `None` if the listener is
/// unusable.
fn accept_retry_delay(error: &ListenerError) -> Option<Duration> {
    match error {
        ListenerError::Closed => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}

struct ConnectionHandler {
    router: Arc<Router>,
    max_header_bytes: usize,
    read_timeout: Option<Duration>,
}

impl ConnectionHandler {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr, conn_id: ConnectionId) {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("connection", %conn_id, %request_id, %peer);
        self.serve(stream, peer, request_id).instrument(span).await
    }

    /// Latency covers processing only; time spent waiting on the client's
    /// request head is not recorded.
    async fn serve(&self, mut stream: TcpStream, peer: SocketAddr, request_id: Uuid) {
        let raw = match read_request(&mut stream, self.max_header_bytes, self.read_timeout).await {
            Ok(raw) => raw,
            Err(ReadError::TooLarge { limit }) => {
                tracing::warn!(limit, "Request head too large");
                let start = Instant::now();
                let response = self
                    .router
                    .reject(Status::RequestHeaderFieldsTooLarge, "request header too large");
                self.respond(&mut stream, "-", "-", response, start, request_id).await;
                return;
            }
            Err(ReadError::Empty) => {
                tracing::debug!("Connection closed before sending a request");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request");
                return;
            }
        };

        let start = Instant::now();
        let (method, target) = request_line_summary(&raw);
        let (method, target) = (method.to_string(), target.to_string());

        let router = Arc::clone(&self.router);
        let response = match tokio::task::spawn_blocking(move || router.dispatch(&raw, peer)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Request handler panicked");
                Response::error(Status::InternalServerError, "internal error")
            }
        };

        self.respond(&mut stream, &method, &target, response, start, request_id)
            .await;
    }

    async fn respond(
        &self,
        stream: &mut TcpStream,
        method: &str,
        target: &str,
        response: Response,
        start: Instant,
        request_id: Uuid,
    ) {
        let latency_ms: u64 = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        let registry = self.router.metrics();
        registry.record_request();
        registry.record_latency(latency_ms);
        metrics::record_request(method, response.status.code(), start);

        tracing::info!(
            method = %method,
            path = %target,
            status = response.status.code(),
            latency_ms,
            "Request handled"
        );

        let response = response.with_header(X_REQUEST_ID, request_id.to_string());
        if let Err(e) = write_response(stream, &response).await {
            tracing::debug!(error = %e, "Failed to write response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_errors_back_off_before_retrying() {
        let emfile = ListenerError::Accept(std::io::Error::from_raw_os_error(24));
        assert_eq!(accept_retry_delay(&emfile), Some(ACCEPT_BACKOFF));
        assert!(ACCEPT_BACKOFF >= Duration::from_millis(10));
    }

    #[test]
    fn closed_limiter_is_fatal() {
        assert_eq!(accept_retry_delay(&ListenerError::Closed), None);
    }
}
