// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use intake_core::IntakeError;
use tracing::debug;

use crate::migrations;

/// Connection-level PRAGMAs.
///
/// `synchronous = FULL` makes every committed counter transaction durable
/// before the caller sees the issued id.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;
     PRAGMA synchronous = FULL;";

/// Handle to the single writer connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, switch it to WAL mode and run
    /// pending migrations.
    ///
    /// Migrations run on a short-lived blocking connection before the async
    /// writer is opened, so the writer never observes a half-migrated schema.
    pub async fn open(path: &str) -> Result<Self, IntakeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| IntakeError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), IntakeError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(sqlite_err)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(sqlite_err)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| IntakeError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| IntakeError::storage(format!("failed to open {path}: {e}")))?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(CONNECTION_PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The single writer connection. Every query goes through `call()`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), IntakeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite call error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> IntakeError {
    IntakeError::storage(e.to_string())
}

/// Map a plain rusqlite error into the workspace error type.
pub fn sqlite_err(e: rusqlite::Error) -> IntakeError {
    IntakeError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/intake.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let last: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT last_issued FROM ticket_counter WHERE id = 1", [], |r| {
                    r.get(0)
                })
            })
            .await
            .unwrap();
        assert_eq!(last, 0);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intake.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn writer_runs_with_full_sync_and_wal() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap())
            .await
            .unwrap();
        let (journal, sync): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let journal = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let sync = conn.query_row("PRAGMA synchronous", [], |r| r.get(0))?;
                Ok((journal, sync))
            })
            .await
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
        // FULL = 2
        assert_eq!(sync, 2);
    }
}
