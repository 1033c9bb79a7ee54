//! SQLite-backed record store for task rows.
//!
//! The [`RecordStore`] owns a single physical connection. Every statement
//! runs while holding the connection mutex, so writes are serialized at the
//! statement level no matter how many requests are in flight. Update and
//! delete on an absent id are no-ops that report zero affected rows; deciding
//! whether that is an error belongs to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, params};
use tasklist_proto::task::{Task, TaskId};

use crate::config::{StorageBackend, StorageConfig};

/// Additive-only schema. Never drops or alters an existing table.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        done BOOLEAN NOT NULL DEFAULT 0
    );
";

/// Errors raised by the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file's parent directory could not be created.
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        /// Directory that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The database could not be opened.
    #[error("failed to open database {path}: {source}")]
    Open {
        /// Database location (`:memory:` for the memory backend).
        path: PathBuf,
        /// Underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A statement failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Durable table of task rows behind one shared connection.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Opens the backend selected by `config` and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Sqlite => Self::open_file(
                &config.path,
                Duration::from_millis(config.busy_timeout_ms),
            ),
            StorageBackend::Memory => Self::open_in_memory(),
        }
    }

    /// Opens (or creates) a database file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory, file, pragmas or schema fail.
    pub fn open_file(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database. Contents vanish with the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates the `tasks` table if it is absent. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the DDL fails.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Appends a row with `done = false` and returns its new id.
    ///
    /// The id is read back on the same locked connection, so a concurrent
    /// insert can never hand out another row's id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the write fails.
    pub fn insert(&self, title: &str) -> Result<TaskId, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (title, done) VALUES (?1, ?2)",
            params![title, false],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns every row ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the query or row decoding fails.
    pub fn select_all(&self) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT id, title, done FROM tasks ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Task {
                id: row.get(0)?,
                title: row.get(1)?,
                done: row.get(2)?,
            })
        })?;
        let tasks = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Sets `done` on the row with `id`. Returns the number of rows changed
    /// (0 when `id` is absent).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the write fails.
    pub fn update_status(&self, id: TaskId, done: bool) -> Result<usize, StoreError> {
        let changed = self.conn.lock().execute(
            "UPDATE tasks SET done = ?1 WHERE id = ?2",
            params![done, id],
        )?;
        Ok(changed)
    }

    /// Removes the row with `id`. Returns the number of rows removed
    /// (0 when `id` is absent).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the write fails.
    pub fn delete(&self, id: TaskId) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(removed)
    }

    /// Holds the connection lock, stalling every statement until dropped.
    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Drops the table so later statements fail.
    #[cfg(test)]
    pub(crate) fn drop_table_for_test(&self) {
        self.conn.lock().execute_batch("DROP TABLE tasks;").unwrap();
    }
}
