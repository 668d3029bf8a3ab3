//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (connection loop, request ID, metrics)
//!     → request.rs (parse request line, headers, query string)
//!     → [routing layer picks a handler]
//!     → response.rs (status line, headers, JSON body)
//!     → Send to client, close
//! ```

pub mod assets;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use assets::{AssetSource, FsAssets};
pub use query::QueryParams;
pub use request::Request;
pub use response::{Response, Status};
pub use server::{HttpServer, X_REQUEST_ID};
