//! SQLite connection, schema setup and shared row helpers.
//!
//! Provides:
//! - Opening the database file under [`data_dir`](super::data_dir)
//! - Immediate transactions for multi-row writes
//! - Batch order writes for reconciled lists
//! - Key-value store for application state (timer state lives here)

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::ordering::ListOrder;

const DB_FILE: &str = "focus.db";

/// Table holding an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedTable {
    /// Columns of a board, keyed by `board_id`.
    Columns,
    /// Tasks of a column, keyed by `column_id`.
    Tasks,
}

impl OrderedTable {
    fn update_sql(self) -> &'static str {
        match self {
            OrderedTable::Columns => {
                "UPDATE columns SET position = ?1, board_id = ?2 WHERE id = ?3"
            }
            OrderedTable::Tasks => {
                "UPDATE tasks SET position = ?1, column_id = ?2 WHERE id = ?3"
            }
        }
    }
}

/// SQLite database shared by every feature store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/focus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join(DB_FILE))
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Run `f` inside an immediate transaction, committing on success and
    /// rolling back on error.
    ///
    /// # Errors
    /// Returns the closure's error, or a database error if the transaction
    /// cannot be started or committed.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    /// Write one list's complete order assignment atomically.
    ///
    /// # Errors
    /// Returns an error if any row update fails; nothing is written then.
    pub fn apply_list_order(&self, table: OrderedTable, order: &ListOrder) -> Result<()> {
        self.transaction(|conn| write_list_order(conn, table, order))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

/// Persist every entry of `order` (position and parent) on an open connection.
///
/// Callers are expected to hold a transaction.
pub(crate) fn write_list_order(
    conn: &Connection,
    table: OrderedTable,
    order: &ListOrder,
) -> Result<()> {
    let mut stmt = conn.prepare_cached(table.update_sql())?;
    for entry in &order.entries {
        stmt.execute(params![entry.order, order.list_id, entry.id])?;
    }
    Ok(())
}

// === Column codecs ===

/// Fixed-width RFC 3339 so that text comparison matches time order.
pub(crate) fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_instant(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a TEXT timestamp column.
pub(crate) fn instant_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_instant(idx, &raw)
}

/// Read a nullable TEXT timestamp column.
pub(crate) fn opt_instant_at(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_instant(idx, &s)).transpose()
}

/// Read a TEXT calendar date column.
pub(crate) fn date_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date(idx, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::OrderEntry;
    use chrono::TimeZone;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
        assert!(db.kv_delete("test").unwrap());
        assert!(!db.kv_delete("test").unwrap());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focus.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_memory().unwrap();
        let result: Result<()> = db.transaction(|conn| {
            conn.execute("INSERT INTO kv (key, value) VALUES ('a', '1')", [])?;
            Err(crate::error::CoreError::Conflict("boom".into()))
        });
        assert!(result.is_err());
        assert!(db.kv_get("a").unwrap().is_none());
    }

    #[test]
    fn apply_list_order_rewrites_positions() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO boards VALUES ('b', 'local', 'B', 'x', 'x');
                 INSERT INTO columns VALUES ('c1', 'b', 'One', 5);
                 INSERT INTO columns VALUES ('c2', 'b', 'Two', 5);",
            )
            .unwrap();
        let order = ListOrder {
            list_id: "b".into(),
            entries: vec![
                OrderEntry {
                    id: "c2".into(),
                    order: 0,
                },
                OrderEntry {
                    id: "c1".into(),
                    order: 1,
                },
            ],
        };
        db.apply_list_order(OrderedTable::Columns, &order).unwrap();
        let positions: Vec<(String, i32)> = db
            .conn()
            .prepare("SELECT id, position FROM columns ORDER BY position")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(positions, vec![("c2".into(), 0), ("c1".into(), 1)]);
    }

    #[test]
    fn instants_are_fixed_width() {
        let a = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1500);
        let (fa, fb) = (format_instant(a), format_instant(b));
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_instant(0, &fb).unwrap(), b);
    }
}
