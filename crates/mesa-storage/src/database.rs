// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes: the
//! transition engine's read-modify-write on the ticket row relies on that
//! serialization plus `BEGIN IMMEDIATE` transactions.

use mesa_config::StorageConfig;
use mesa_core::MesaError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite call error into `MesaError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MesaError {
    MesaError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database behind the single writer thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with default settings.
    pub async fn open(path: &str) -> Result<Self, MesaError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open the database described by the storage config, apply PRAGMAs,
    /// and run embedded migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, MesaError> {
        if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MesaError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(&config.database_path)
            .await
            .map_err(|e| MesaError::Storage {
                source: Box::new(e),
            })?;

        let wal_mode = config.wal_mode;
        let busy_timeout_ms = config.busy_timeout_ms;
        conn.call(move |conn| {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.execute_batch(&format!(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {busy_timeout_ms};"
            ))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| run_migrations(conn))
            .await
            .map_err(|e| MesaError::Storage {
                source: Box::new(e),
            })?;

        debug!(path = %config.database_path, wal = wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MesaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| MesaError::Storage {
            source: Box::new(e),
        })?;
        debug!("database closed");
        Ok(())
    }
}
