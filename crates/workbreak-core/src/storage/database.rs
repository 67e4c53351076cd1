//! SQLite-based settings store and completion history.
//!
//! Provides persistent storage for:
//! - The four timer settings, as a key-value table
//! - A record of every completed countdown and the exercise it prompted

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, KvStore};
use crate::error::StorageError;

/// One completed countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: i64,
    pub duration_secs: u64,
    /// The exercise prompted at expiry; empty if the list was empty.
    pub exercise: String,
    pub completed_at: DateTime<Utc>,
}

/// SQLite database backing the settings store and completion history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/workbreak/workbreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("workbreak.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                duration_secs INTEGER NOT NULL,
                exercise      TEXT NOT NULL DEFAULT '',
                completed_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_completions_completed_at
                ON completions(completed_at);",
        )?;
        Ok(())
    }

    /// Record a completed countdown.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_completion(
        &self,
        duration_secs: u64,
        exercise: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO completions (duration_secs, exercise, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                duration_secs,
                exercise.unwrap_or(""),
                completed_at.to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent completions, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent_completions(&self, limit: u32) -> Result<Vec<CompletionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, duration_secs, exercise, completed_at
             FROM completions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, duration_secs, exercise, completed_at) = row?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?
                .with_timezone(&Utc);
            records.push(CompletionRecord {
                id,
                duration_secs,
                exercise,
                completed_at,
            });
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv_set(key, value)
    }
}
