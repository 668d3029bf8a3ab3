//! SQLite-backed product store.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, params_from_iter, Connection};

use super::{clamp_page, like_pattern, Item, PriceAggregates, StorageError, Store};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY,
        title TEXT,
        price REAL,
        image_url TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_items_title ON items(title);
";

/// Product store over a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a store from `sqlite:<path>`; `sqlite::memory:` opens an
    /// in-memory database.
    pub fn open(connection_string: &str) -> Result<Self, StorageError> {
        let path = connection_string
            .strip_prefix("sqlite:")
            .ok_or_else(|| StorageError::UnsupportedConnection(connection_string.to_string()))?;

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        tracing::debug!(path = %path, "Opened SQLite store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open("sqlite::memory:")
    }

    /// Create the `items` table and its unique title index.
    pub fn init_schema(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Store for SqliteStore {
    fn execute(&self, statement: &str) -> Result<(), StorageError> {
        self.conn()?.execute_batch(statement)?;
        Ok(())
    }

    fn execute_with(&self, statement: &str, params: &[&str]) -> Result<(), StorageError> {
        self.conn()?.execute(statement, params_from_iter(params.iter()))?;
        Ok(())
    }

    fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Item>, StorageError> {
        let (limit, offset) = clamp_page(limit, offset);
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT title, price, image_url FROM items
             WHERE title LIKE ?1 ESCAPE '\\'
             ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![like_pattern(query), limit, offset], |row| {
            Ok(Item {
                title: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                price: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
                image_url: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    fn count(&self, query: &str) -> Result<u64, StorageError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE title LIKE ?1 ESCAPE '\\'",
            [like_pattern(query)],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    fn price_stats(&self, query: &str) -> Result<PriceAggregates, StorageError> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT AVG(price), MIN(price), MAX(price) FROM items WHERE title LIKE ?1 ESCAPE '\\'",
            [like_pattern(query)],
            |row| {
                Ok(PriceAggregates {
                    avg: row.get::<_, Option<f64>>(0)?.unwrap_or_default(),
                    min: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
                    max: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                })
            },
        )?;
        Ok(stats)
    }
}
