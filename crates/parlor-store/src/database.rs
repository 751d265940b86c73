// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use parlor_core::ParlorError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Bound on how long a store operation waits for the database write lock
/// before failing the single attempt.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the SQLite database. The single writer for the process.
///
/// Cloning is cheap; all clones share the same background connection
/// thread, so every closure passed to [`Database::connection`] executes
/// atomically with respect to other callers.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled and
    /// run any pending migrations.
    pub async fn open(path: &str) -> Result<Self, ParlorError> {
        Self::open_with_options(path, true).await
    }

    /// Open with explicit control over WAL mode.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, ParlorError> {
        let conn = Connection::open(path.to_string())
            .await
            .map_err(|e| ParlorError::Storage { source: Box::new(e) })?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| run_migrations(conn))
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(pe) => pe,
                other => ParlorError::Storage { source: Box::new(other) },
            })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Access the underlying tokio-rusqlite connection.
    ///
    /// Query modules call through `connection().call(...)`; the closure
    /// runs on the single writer thread.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the database, flushing pending writes.
    pub async fn close(&self) -> Result<(), ParlorError> {
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| ParlorError::Storage { source: Box::new(e) })
    }
}

/// Map a tokio-rusqlite error into the shared storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ParlorError {
    ParlorError::Storage { source: Box::new(e) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok::<Vec<String>, rusqlite::Error>(names)
            })
            .await
            .unwrap();

        assert!(tables.iter().any(|t| t == "rooms"));
        assert!(tables.iter().any(|t| t == "agent_load"));
        assert!(tables.iter().any(|t| t == "guard_locks"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();

        // Migrations must not fail on an already-migrated database.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }
}
