//! Combines a count and a page fetch into one search result.
//!
//! The count and the page are two independent store calls with no
//! transaction between them, so `total` can disagree with `items` if the
//! store changes in between.

use std::sync::Arc;

use crate::storage::{Item, PriceAggregates, StorageError, Store};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub items: Vec<Item>,
    /// Matches across all pages.
    pub total: u64,
}

#[derive(Clone)]
pub struct Searcher {
    store: Arc<dyn Store>,
}

impl Searcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn try_search(&self, q: &str, limit: i64, offset: i64) -> Result<SearchResult, StorageError> {
        let total = self.store.count(q)?;
        let items = self.store.search(q, limit, offset)?;
        Ok(SearchResult { items, total })
    }

    /// Like [`Searcher::try_search`], but a store failure yields an empty
    /// result.
    pub fn search(&self, q: &str, limit: i64, offset: i64) -> SearchResult {
        self.try_search(q, limit, offset).unwrap_or_else(|e| {
            tracing::warn!(query = %q, error = %e, "Search failed, returning empty result");
            SearchResult::default()
        })
    }

    /// Price aggregates over every match; zeros on store failure.
    pub fn aggregates(&self, q: &str) -> PriceAggregates {
        self.store.price_stats(q).unwrap_or_else(|e| {
            tracing::warn!(query = %q, error = %e, "Aggregates failed, returning zeros");
            PriceAggregates::default()
        })
    }
}
