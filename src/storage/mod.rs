//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! Searcher
//!     → Store trait (count / search / price_stats)
//!     → sqlite.rs (production, rusqlite)
//!     → memory.rs (in-memory fake for tests)
//!
//! Startup:
//!     SqliteStore::open → init_schema → seed.rs (demo catalog)
//! ```
//!
//! # Design Decisions
//! - User input is always bound as a parameter, never concatenated into SQL
//! - Matching is a literal, ASCII case-insensitive substring of the title
//! - Paging bounds are clamped here, not by the router

pub mod memory;
pub mod seed;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Page size used when the caller asks for a non-positive limit.
pub const DEFAULT_LIMIT: i64 = 10;
/// Largest page a single search may return.
pub const MAX_LIMIT: i64 = 100;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unsupported connection string {0:?} (expected 'sqlite:<path>')")]
    UnsupportedConnection(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A product row as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub price: f64,
    pub image_url: String,
}

impl Item {
    pub fn new(title: impl Into<String>, price: f64, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price,
            image_url: image_url.into(),
        }
    }
}

/// Price statistics over every row matching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAggregates {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Contract for the backing product store.
///
/// All methods must be safe with untrusted `query` input.
pub trait Store: Send + Sync {
    /// Run a statement with no parameters.
    fn execute(&self, statement: &str) -> Result<(), StorageError>;

    /// Run a statement with positional text parameters.
    fn execute_with(&self, statement: &str, params: &[&str]) -> Result<(), StorageError>;

    /// Page of items whose title contains `query`. `limit`/`offset` are
    /// clamped with [`clamp_page`].
    fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Item>, StorageError>;

    /// Number of items whose title contains `query`, ignoring paging.
    fn count(&self, query: &str) -> Result<u64, StorageError>;

    /// Avg/min/max price over all matches; zeros when nothing matches.
    fn price_stats(&self, query: &str) -> Result<PriceAggregates, StorageError>;

    /// Insert an item unless one with the same title exists.
    fn insert_item(&self, item: &Item) -> Result<(), StorageError> {
        let price = item.price.to_string();
        self.execute_with(
            "INSERT OR IGNORE INTO items (title, price, image_url) VALUES (?1, ?2, ?3)",
            &[&item.title, &price, &item.image_url],
        )
    }
}

/// Clamp paging: `limit <= 0` becomes 10, `limit > 100` becomes 100,
/// `offset < 0` becomes 0.
pub fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    let limit = match limit {
        l if l <= 0 => DEFAULT_LIMIT,
        l if l > MAX_LIMIT => MAX_LIMIT,
        l => l,
    };
    (limit, offset.max(0))
}

/// Build a `LIKE` pattern that matches `query` literally, for use with
/// `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
