//! In-memory product store.
//!
//! Mirrors the SQLite matching rules (literal, ASCII case-insensitive
//! substring; insertion order; duplicate titles ignored) so handler tests can
//! run without a database file.

use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{clamp_page, Item, PriceAggregates, StorageError, Store};

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
    statements: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        for item in items {
            // Infallible for the in-memory store.
            let _ = store.insert_item(&item);
        }
        store
    }

    /// Make every subsequent call fail, to exercise error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Statements passed to `execute`/`execute_with`, in call order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn items(&self) -> Result<MutexGuard<'_, Vec<Item>>, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Database(rusqlite::Error::InvalidQuery));
        }
        self.items.lock().map_err(|_| StorageError::Poisoned)
    }

    fn matching(&self, query: &str) -> Result<Vec<Item>, StorageError> {
        let needle = query.to_ascii_lowercase();
        Ok(self
            .items()?
            .iter()
            .filter(|item| item.title.to_ascii_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn log_statement(&self, statement: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Database(rusqlite::Error::InvalidQuery));
        }
        self.statements
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .push(statement.to_string());
        Ok(())
    }
}

impl Store for MemoryStore {
    fn execute(&self, statement: &str) -> Result<(), StorageError> {
        self.log_statement(statement)
    }

    fn execute_with(&self, statement: &str, _params: &[&str]) -> Result<(), StorageError> {
        self.log_statement(statement)
    }

    fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Item>, StorageError> {
        let (limit, offset) = clamp_page(limit, offset);
        Ok(self
            .matching(query)?
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    fn count(&self, query: &str) -> Result<u64, StorageError> {
        Ok(self.matching(query)?.len() as u64)
    }

    fn price_stats(&self, query: &str) -> Result<PriceAggregates, StorageError> {
        let matches = self.matching(query)?;
        if matches.is_empty() {
            return Ok(PriceAggregates::default());
        }
        let prices = matches.iter().map(|item| item.price);
        let sum: f64 = prices.clone().sum();
        Ok(PriceAggregates {
            avg: sum / matches.len() as f64,
            min: prices.clone().fold(f64::INFINITY, f64::min),
            max: prices.fold(f64::NEG_INFINITY, f64::max),
        })
    }

    fn insert_item(&self, item: &Item) -> Result<(), StorageError> {
        let mut items = self.items()?;
        if !items.iter().any(|existing| existing.title == item.title) {
            items.push(item.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::with_items([
            Item::new("Apple Watch", 299.0, "img1"),
            Item::new("Apple Phone", 999.0, "img2"),
            Item::new("Banana Phone", 10.0, "img3"),
        ])
    }

    #[test]
    fn matches_case_insensitively_and_pages() {
        let store = store();
        assert_eq!(store.count("APPLE").unwrap(), 2);
        assert_eq!(store.search("apple", 1, 1).unwrap()[0].title, "Apple Phone");
        assert!(store.search("apple", 10, 5).unwrap().is_empty());
    }

    #[test]
    fn aggregates_match_sqlite_semantics() {
        let store = store();
        assert_eq!(
            store.price_stats("Phone").unwrap(),
            PriceAggregates { avg: 504.5, min: 10.0, max: 999.0 }
        );
        assert_eq!(store.price_stats("zzz").unwrap(), PriceAggregates::default());
    }

    #[test]
    fn failing_store_errors_everywhere() {
        let store = store();
        store.set_failing(true);
        assert!(store.count("Apple").is_err());
        assert!(store.search("Apple", 1, 0).is_err());
        assert!(store.price_stats("Apple").is_err());
        assert!(store.execute("SELECT 1").is_err());

        store.set_failing(false);
        assert_eq!(store.count("Apple").unwrap(), 2);
    }

    #[test]
    fn records_statements() {
        let store = MemoryStore::new();
        store.execute("CREATE TABLE t (x)").unwrap();
        store.execute_with("INSERT INTO t VALUES (?1)", &["1"]).unwrap();
        assert_eq!(store.statements().len(), 2);
    }
}
