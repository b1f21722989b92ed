// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use echoform_core::EchoformError;
use tracing::debug;

use crate::migrations;

/// Map a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> EchoformError {
    EchoformError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database backing all Echoform persistence.
///
/// Opening runs pending migrations on a short-lived synchronous connection
/// (refinery needs `&mut rusqlite::Connection`), then hands the file to a
/// tokio-rusqlite connection that serializes all subsequent access.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, EchoformError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| EchoformError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations run on a blocking thread with a temporary sync connection.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), EchoformError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| EchoformError::Storage {
                    source: Box::new(e),
                })?;
            apply_pragmas(&conn)?;
            migrations::run_migrations(&mut conn)?;
            Ok(())
        })
        .await
        .map_err(|e| EchoformError::Internal(format!("migration task panicked: {e}")))??;

        // `open` fails with a plain rusqlite error, unlike the `call` sites.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| EchoformError::Storage {
                source: Box::new(e),
            })?;

        // Per-connection PRAGMAs must be reapplied on the long-lived handle.
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Access the underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), EchoformError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection) -> Result<(), EchoformError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
    .map_err(|e| EchoformError::Storage {
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());

        // The migrated schema should be queryable.
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_restarts() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();

        // Second open must not re-run applied migrations.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/echo.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }
}
