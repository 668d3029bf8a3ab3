//! Search subsystem.
//!
//! # Data Flow
//! ```text
//! Router (/api/search, /api/search_v2)
//!     → qrs.rs (trace id, per-phase timing, response shapes)
//!     → searcher.rs (count + page, optional price aggregates)
//!     → storage::Store
//! ```

pub mod qrs;
pub mod searcher;

pub use qrs::{QueryService, SearchResponse, SearchV2Response};
pub use searcher::{SearchResult, Searcher};
