// SQLite-backed key/value storage

use crate::models::now_ms;
use crate::storage::{Storage, validate_key};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Storage kept in a single `storage` table of a SQLite database
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create a database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        Self::with_connection(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::with_connection(db)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        let storage = Self { db };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating storage schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        let value = self
            .db
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read storage item")?;

        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute(
                "INSERT INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, now_ms()],
            )
            .context("Failed to write storage item")?;

        debug!(key, bytes = value.len(), "Wrote storage item");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute("DELETE FROM storage WHERE key = ?1", [key])
            .context("Failed to remove storage item")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_storage_crud() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();

        assert_eq!(storage.get_item("tasks").unwrap(), None);

        storage.set_item("tasks", "[]").unwrap();
        assert_eq!(storage.get_item("tasks").unwrap().as_deref(), Some("[]"));

        // Upsert replaces the value in place
        storage.set_item("tasks", "[1,2]").unwrap();
        assert_eq!(storage.get_item("tasks").unwrap().as_deref(), Some("[1,2]"));

        let rows: i64 = storage
            .db()
            .query_row("SELECT COUNT(*) FROM storage", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        storage.remove_item("tasks").unwrap();
        assert_eq!(storage.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn test_sqlite_storage_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("nested").join("todo.db");

        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage.set_item("tasks", "persisted").unwrap();
        }

        assert!(db_path.exists());
        let storage = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_item("tasks").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_sqlite_storage_rejects_bad_key() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.set_item("", "x").is_err());
        assert!(storage.get_item("bad key").is_err());
    }
}
