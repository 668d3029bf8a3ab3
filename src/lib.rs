//! Epiphany: a minimal product-search HTTP service.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod search;
pub mod storage;

pub use config::schema::ServerConfig;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::MetricsRegistry;
pub use routing::Router;
pub use storage::{MemoryStore, SqliteStore, Store};
