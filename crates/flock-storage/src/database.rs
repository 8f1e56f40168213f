// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use flock_core::FlockError;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database.
///
/// Cloneable; all clones share the single background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, run all pending migrations,
    /// and apply per-connection PRAGMAs.
    pub async fn open(path: &str) -> Result<Self, FlockError> {
        // Migrations run on a short-lived blocking connection; refinery wants
        // exclusive &mut access and its errors are not rusqlite errors.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), FlockError> {
            let mut conn = rusqlite::Connection::open(&migrate_path)
                .map_err(|e| FlockError::Storage {
                    source: Box::new(e),
                })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| FlockError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The shared background connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), FlockError> {
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

/// Convert a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> FlockError {
    FlockError::Storage {
        source: Box::new(e),
    }
}
