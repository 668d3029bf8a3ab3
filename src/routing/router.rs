//! Request dispatch.
//!
//! # Responsibilities
//! - Parse the raw request and reject anything but GET
//! - Map `/` to `/index.html`
//! - Dispatch to health, metrics, client info, search and static handlers
//! - Turn every client mistake into a `4xx` JSON error
//!
//! # Design Decisions
//! - Never fails: every input produces a complete response
//! - Every `4xx` increments the error counter exactly once
//! - Path traversal (`..` anywhere in the target) is refused before the
//!   asset source is consulted

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;

use crate::http::assets::{mime_type, AssetSource};
use crate::http::request::Request;
use crate::http::response::{Response, Status};
use crate::observability::{Endpoint, MetricsRegistry};
use crate::routing::matcher::{resolve, Route};
use crate::search::QueryService;
use crate::storage::DEFAULT_LIMIT;

const DEFAULT_DOCUMENT: &str = "/index.html";

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ClientInfo<'a> {
    ip: String,
    port: u16,
    user_agent: &'a str,
    accept_language: &'a str,
    host: &'a str,
    connection: &'a str,
    accept: &'a str,
    headers: &'a BTreeMap<String, String>,
}

/// Validated `/api/search*` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub q: String,
    pub limit: i64,
    pub offset: i64,
}

impl SearchParams {
    /// `q` is required and non-empty; `limit`/`offset` must be integers when
    /// present and default to 10/0.
    pub fn from_request(request: &Request) -> Result<Self, &'static str> {
        let params = request.query();
        let q = params.get("q").filter(|q| !q.is_empty()).ok_or("missing q")?;

        let parse = |name| {
            params.get_int(name).map_err(|e| {
                tracing::debug!(error = %e, "Rejecting search parameters");
                "invalid limit or offset"
            })
        };
        let limit = parse("limit")?.unwrap_or(DEFAULT_LIMIT);
        let offset = parse("offset")?.unwrap_or(0);

        Ok(Self {
            q: q.to_string(),
            limit,
            offset,
        })
    }
}

pub struct Router {
    qrs: QueryService,
    metrics: Arc<MetricsRegistry>,
    assets: Arc<dyn AssetSource>,
}

impl Router {
    pub fn new(qrs: QueryService, metrics: Arc<MetricsRegistry>, assets: Arc<dyn AssetSource>) -> Self {
        Self {
            qrs,
            metrics,
            assets,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Parse and answer one raw request.
    pub fn dispatch(&self, raw: &str, peer: SocketAddr) -> Response {
        let response = match Request::parse(raw, peer) {
            Ok(request) => self.handle(&request),
            Err(e) => Response::error(Status::BadRequest, &e.to_string()),
        };
        self.count_error(&response);
        response
    }

    /// Error response for failures detected before dispatch (e.g. an
    /// oversized header block). Counts as an error like any other `4xx`.
    pub fn reject(&self, status: Status, message: &str) -> Response {
        let response = Response::error(status, message);
        self.count_error(&response);
        response
    }

    fn count_error(&self, response: &Response) {
        if response.status.is_client_error() {
            self.metrics.record_error();
        }
    }

    fn handle(&self, request: &Request) -> Response {
        if request.method != "GET" {
            return Response::error(Status::MethodNotAllowed, "method not allowed");
        }

        let path = match request.path() {
            "/" => DEFAULT_DOCUMENT,
            path => path,
        };

        match resolve(path) {
            Some(Route::Health) => {
                self.metrics.record_endpoint(Endpoint::Health);
                Response::json(Status::Ok, &HealthBody { status: "ok" })
            }
            Some(Route::Metrics) => Response::json(Status::Ok, &self.metrics.snapshot_json()),
            Some(Route::ClientInfo) => client_info(request),
            Some(Route::SearchV2) => {
                self.metrics.record_endpoint(Endpoint::SearchV2);
                with_search_params(request, |p| {
                    Response::json(Status::Ok, &self.qrs.search_v2(&p.q, p.limit, p.offset))
                })
            }
            Some(Route::Search) => {
                self.metrics.record_endpoint(Endpoint::Search);
                with_search_params(request, |p| {
                    Response::json(Status::Ok, &self.qrs.search(&p.q, p.limit, p.offset))
                })
            }
            None => self.serve_static(request, path),
        }
    }

    fn serve_static(&self, request: &Request, path: &str) -> Response {
        if request.target.contains("..") {
            tracing::warn!(request_target = %request.target, peer = %request.peer, "Rejected path traversal");
            return Response::error(Status::BadRequest, "invalid path");
        }

        match self.assets.read(path) {
            Ok(Some(body)) => Response::new(Status::Ok, mime_type(path), body),
            Ok(None) => Response::error(Status::NotFound, "not found"),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to read static file");
                Response::error(Status::NotFound, "not found")
            }
        }
    }
}

fn with_search_params<F>(request: &Request, run: F) -> Response
where
    F: FnOnce(SearchParams) -> Response,
{
    match SearchParams::from_request(request) {
        Ok(params) => run(params),
        Err(message) => Response::error(Status::BadRequest, message),
    }
}

fn client_info(request: &Request) -> Response {
    let header = |name| request.header(name).unwrap_or_default();
    Response::json(
        Status::Ok,
        &ClientInfo {
            ip: request.peer.ip().to_string(),
            port: request.peer.port(),
            user_agent: header("User-Agent"),
            accept_language: header("Accept-Language"),
            host: header("Host"),
            connection: header("Connection"),
            accept: header("Accept"),
            headers: &request.headers,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Searcher;
    use crate::storage::{Item, MemoryStore};
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAssets {
        files: BTreeMap<String, Vec<u8>>,
        reads: Mutex<Vec<String>>,
    }

    impl AssetSource for RecordingAssets {
        fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
            self.reads.lock().unwrap().push(path.to_string());
            Ok(self.files.get(path).cloned())
        }
    }

    struct Fixture {
        router: Router,
        metrics: Arc<MetricsRegistry>,
        assets: Arc<RecordingAssets>,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::with_items([
            Item::new("Apple Watch", 299.0, "img1"),
            Item::new("Apple Phone", 999.0, "img2"),
        ]));
        let mut files = BTreeMap::new();
        files.insert("/index.html".to_string(), b"<html>home</html>".to_vec());
        files.insert("/app.js".to_string(), b"console.log(1)".to_vec());
        let assets = Arc::new(RecordingAssets {
            files,
            ..Default::default()
        });
        let metrics = Arc::new(MetricsRegistry::new());
        let qrs = QueryService::new(Searcher::new(store.clone()), true);
        let router = Router::new(qrs, metrics.clone(), assets.clone());
        Fixture {
            router,
            metrics,
            assets,
            store,
        }
    }

    fn peer() -> SocketAddr {
        "192.168.1.20:40000".parse().unwrap()
    }

    fn get(fixture: &Fixture, target: &str) -> Response {
        fixture
            .router
            .dispatch(&format!("GET {target} HTTP/1.1\r\nHost: shop\r\n\r\n"), peer())
    }

    #[test]
    fn health_only_touches_health_counter() {
        let f = fixture();
        for _ in 0..3 {
            let response = get(&f, "/health");
            assert_eq!(response.status, Status::Ok);
            assert_eq!(response.body, br#"{"status":"ok"}"#);
        }
        let snap = f.metrics.snapshot();
        assert_eq!(snap.health, 3);
        assert_eq!((snap.api_search, snap.api_search_v2, snap.errors, snap.requests), (0, 0, 0, 0));
    }

    #[test]
    fn non_get_is_405_and_one_error() {
        let f = fixture();
        for method in ["POST", "PUT", "DELETE", "HEAD"] {
            let before = f.metrics.snapshot().errors;
            let response = f.router.dispatch(&format!("{method} /health HTTP/1.1\r\n\r\n"), peer());
            assert_eq!(response.status, Status::MethodNotAllowed);
            assert_eq!(response.content_type, "application/json");
            assert_eq!(f.metrics.snapshot().errors, before + 1);
        }
        assert_eq!(f.metrics.snapshot().health, 0);
    }

    #[test]
    fn missing_q_is_400() {
        let f = fixture();
        for target in ["/api/search", "/api/search?q=", "/api/search_v2?limit=3", "/api/search_v2?q="] {
            let response = get(&f, target);
            assert_eq!(response.status, Status::BadRequest, "{target}");
            assert_eq!(response.json_body().unwrap()["error"], "missing q");
        }
        assert_eq!(f.metrics.snapshot().errors, 4);
    }

    #[test]
    fn non_integer_paging_is_400() {
        let f = fixture();
        let response = get(&f, "/api/search?q=foo&limit=abc");
        assert_eq!(response.status, Status::BadRequest);
        assert_eq!(response.json_body().unwrap()["error"], "invalid limit or offset");

        let response = get(&f, "/api/search_v2?q=foo&offset=1.5");
        assert_eq!(response.status, Status::BadRequest);
    }

    #[test]
    fn search_pages_but_counts_everything() {
        let f = fixture();
        let response = get(&f, "/api/search?q=Apple&limit=1&offset=0");
        assert_eq!(response.status, Status::Ok);
        let body = response.json_body().unwrap();
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["total"], 2);
        assert!(body["latency_ms"].is_number());
        assert_eq!(f.metrics.snapshot().api_search, 1);
    }

    #[test]
    fn search_decodes_query() {
        let f = fixture();
        let body = get(&f, "/api/search?q=apple+w%61tch").json_body().unwrap();
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["title"], "Apple Watch");
    }

    #[test]
    fn search_v2_envelope() {
        let f = fixture();
        let body = get(&f, "/api/search_v2?q=Apple&limit=1").json_body().unwrap();
        for key in ["trace_id", "limit", "offset", "total", "elapsed_ms", "search_ms", "aggregate_ms", "items"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["limit"], 1);
        assert_eq!(body["offset"], 0);
        assert_eq!(body["total"], 2);
        assert_eq!(
            body["elapsed_ms"].as_u64().unwrap(),
            body["search_ms"].as_u64().unwrap() + body["aggregate_ms"].as_u64().unwrap()
        );
        assert_eq!(body["aggregates"]["price"]["avg"], 649.0);
        let snap = f.metrics.snapshot();
        assert_eq!((snap.api_search, snap.api_search_v2), (0, 1));
    }

    #[test]
    fn storage_failure_still_answers_200() {
        let f = fixture();
        f.store.set_failing(true);
        let response = get(&f, "/api/search_v2?q=Apple");
        assert_eq!(response.status, Status::Ok);
        let body = response.json_body().unwrap();
        assert_eq!(body["items"], serde_json::json!([]));
        assert_eq!(body["total"], 0);
        assert_eq!(f.metrics.snapshot().errors, 0);
    }

    #[test]
    fn traversal_never_reaches_assets() {
        let f = fixture();
        for target in ["/../etc/passwd", "/css/../../secret", "/index.html?x=.."] {
            let response = get(&f, target);
            assert_eq!(response.status, Status::BadRequest, "{target}");
            assert_eq!(response.json_body().unwrap()["error"], "invalid path");
        }
        assert!(f.assets.reads.lock().unwrap().is_empty());
        assert_eq!(f.metrics.snapshot().errors, 3);
    }

    #[test]
    fn root_serves_index_and_static_mime() {
        let f = fixture();
        let response = get(&f, "/");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.content_type, "text/html");
        assert_eq!(response.body, b"<html>home</html>");

        let response = get(&f, "/app.js?v=2");
        assert_eq!(response.content_type, "application/javascript");

        let response = get(&f, "/missing.css");
        assert_eq!(response.status, Status::NotFound);
        assert_eq!(response.json_body().unwrap()["error"], "not found");
        assert_eq!(
            *f.assets.reads.lock().unwrap(),
            vec!["/index.html", "/app.js", "/missing.css"]
        );
    }

    #[test]
    fn client_info_echoes_peer_and_headers() {
        let f = fixture();
        let raw = "GET /api/client_info HTTP/1.1\r\nHost: shop\r\nUser-Agent: test \"agent\"\r\nAccept: */*\r\nX-Path: C:\\temp\r\n\r\n";
        let body = f.router.dispatch(raw, peer()).json_body().unwrap();
        assert_eq!(body["ip"], "192.168.1.20");
        assert_eq!(body["port"], 40000);
        assert_eq!(body["user_agent"], "test \"agent\"");
        assert_eq!(body["accept"], "*/*");
        assert_eq!(body["accept_language"], "");
        assert_eq!(body["connection"], "");
        assert_eq!(body["host"], "shop");
        assert_eq!(body["headers"]["X-Path"], "C:\\temp");
    }

    #[test]
    fn metrics_endpoint_serializes_snapshot() {
        let f = fixture();
        f.metrics.record_request();
        f.metrics.record_latency(7);
        let body = get(&f, "/metrics").json_body().unwrap();
        assert_eq!(body["requests"], 1);
        assert_eq!(body["last_latency_ms"], 7);
        assert_eq!(body["p99_ms"], 10);
    }

    #[test]
    fn garbage_and_rejections_are_client_errors() {
        let f = fixture();
        assert_eq!(f.router.dispatch("", peer()).status, Status::BadRequest);
        let response = f.router.reject(Status::RequestHeaderFieldsTooLarge, "request header too large");
        assert_eq!(response.status.code(), 431);
        assert_eq!(f.metrics.snapshot().errors, 2);
    }
}
