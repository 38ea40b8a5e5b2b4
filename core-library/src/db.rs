//! # Database Connection Pool Module
//!
//! Opens the SQLite catalog: WAL journal, enforced foreign keys and a busy
//! timeout so concurrent writers queue instead of failing with
//! `SQLITE_BUSY`. Embedded migrations run on every open.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("catalog.db")).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const MEMORY_URL: &str = "sqlite::memory:";

/// Connection settings for the catalog database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL, `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,
    pub max_connections: u32,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Configuration for a database file; `:memory:` selects an in-memory one
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        if path == Path::new(":memory:") {
            return Self::in_memory();
        }

        Self {
            database_url: format!("sqlite:{}", path.display()),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// In-memory database on a single connection
    ///
    /// Every pooled connection to `sqlite::memory:` would otherwise open its
    /// own empty database.
    pub fn in_memory() -> Self {
        Self {
            database_url: MEMORY_URL.to_string(),
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == MEMORY_URL
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Open the pool, run migrations and verify a connection
///
/// # Errors
///
/// Returns `LibraryError::Database` if the file cannot be opened and
/// `LibraryError::Migration` if the schema cannot be brought up to date.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    let max_connections = if config.is_in_memory() {
        1
    } else {
        config.max_connections.max(1)
    };
    info!(
        database_url = %config.database_url,
        max_connections,
        "Opening catalog database"
    );

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .acquire_timeout(config.acquire_timeout)
        // an in-memory database lives only as long as its connection
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open catalog database");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;
    debug!("Catalog schema up to date");

    health_check(&pool).await?;
    Ok(pool)
}

/// Fresh in-memory catalog with migrations applied
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

/// Round-trip a trivial query through the pool
pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_test_pool_is_healthy() {
        let pool = create_test_pool().await.unwrap();
        assert!(health_check(&pool).await.is_ok());
    }

    #[test]
    fn test_config_from_path() {
        let config = DatabaseConfig::new("/tmp/catalog.db").with_max_connections(10);
        assert_eq!(config.database_url, "sqlite:/tmp/catalog.db");
        assert_eq!(config.max_connections, 10);
        assert!(!config.is_in_memory());

        let memory = DatabaseConfig::new(":memory:");
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }

    #[tokio::test]
    async fn test_schema_and_pragmas() {
        let pool = create_test_pool().await.unwrap();

        let (foreign_keys,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);

        for table in ["tracks", "playlists", "playlist_tracks"] {
            let (count,): (i32,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                    .bind(table)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(count, 1, "{} table should exist", table);
        }
    }

    #[tokio::test]
    async fn test_file_database_persists_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let pool = create_pool(DatabaseConfig::new(&path)).await.unwrap();
        sqlx::query(
            "INSERT INTO playlists (id, name, created_at, updated_at) VALUES ('p1', 'Gym', 0, 0)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        let pool = create_pool(DatabaseConfig::new(&path)).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM playlists")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        pool.close().await;
    }
}
