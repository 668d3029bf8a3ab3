//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Raw request text (from the connection loop)
//!     → router.rs (parse, method check, `/` → `/index.html`)
//!     → matcher.rs (exact/prefix match in precedence order)
//!     → handler: health | metrics | client_info | search_v2 | search | static
//!     → Response (status, content type, body)
//! ```
//!
//! # Design Decisions
//! - Route table is static and immutable (thread-safe without locks)
//! - Deterministic: same input always matches same route
//! - First match wins

pub mod matcher;
pub mod router;

pub use matcher::{resolve, PathMatcher, Route};
pub use router::{Router, SearchParams};
