//! SQLite-backed keyword store.
//!
//! Split into focused submodules:
//! - `keywords`: keyword → reply CRUD and the per-group snapshot
//! - `groups`: per-group settings (invitation URL)

mod groups;
mod keywords;

#[cfg(test)]
mod tests;

use parrot_core::{config::StoreConfig, error::ParrotError, shellexpand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent keyword store backed by SQLite.
///
/// Clones share one connection pool. Closing any clone closes them all.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store, running migrations on first use.
    pub async fn new(config: &StoreConfig) -> Result<Self, ParrotError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ParrotError::Storage(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| ParrotError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(opts)
            .await
            .map_err(|e| ParrotError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("QA store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Release the database handle. Safe to call more than once; every
    /// operation afterwards fails with [`ParrotError::Closed`].
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("QA store closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn ensure_open(&self) -> Result<(), ParrotError> {
        if self.pool.is_closed() {
            return Err(ParrotError::Closed);
        }
        Ok(())
    }

    /// Get the database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, ParrotError> {
        self.ensure_open()?;

        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("pragma failed"))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("pragma failed"))?;

        Ok((page_count * page_size) as u64)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), ParrotError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| ParrotError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_audit_log",
                include_str!("../../migrations/002_audit_log.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        ParrotError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| ParrotError::Storage(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    ParrotError::Storage(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

/// Map a sqlx error to a storage fault, keeping pool shutdown distinct.
fn storage_err(context: &'static str) -> impl Fn(sqlx::Error) -> ParrotError {
    move |e| match e {
        sqlx::Error::PoolClosed => ParrotError::Closed,
        other => ParrotError::Storage(format!("{context}: {other}")),
    }
}

/// Reject empty identifiers before any mutation.
fn require_non_empty(field: &str, value: &str) -> Result<(), ParrotError> {
    if value.is_empty() {
        return Err(ParrotError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}
