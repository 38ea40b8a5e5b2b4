//! Track repository trait and implementation

use crate::error::{map_unique_violation, LibraryError, Result};
use crate::models::Track;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use tracing::debug;

/// Catalog store interface
///
/// The source key is unique across the catalog; the store enforces it even
/// when callers check for existence first.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its ID
    ///
    /// # Returns
    /// - `Ok(Some(track))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>>;

    /// Find a track by the object key it was created from
    async fn find_by_source_key(&self, source_key: &str) -> Result<Option<Track>>;

    /// Insert a new track and return it as stored
    ///
    /// # Errors
    /// Returns error if:
    /// - A track with the same source key or ID already exists (`Conflict`)
    /// - Track validation fails (`InvalidInput`)
    /// - Database error occurs
    async fn insert(&self, track: &Track) -> Result<Track>;

    /// All tracks ordered by title
    ///
    /// Titles compare case-sensitively by byte value (SQLite `BINARY`
    /// collation, so `"Zebra"` sorts before `"apple"`); equal titles are
    /// ordered by source key, making the order total and stable.
    async fn list_all(&self) -> Result<Vec<Track>>;

    /// Count total tracks
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    /// Create a new SQLite track repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn find_by_source_key(&self, source_key: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE source_key = ?")
            .bind(source_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn insert(&self, track: &Track) -> Result<Track> {
        track.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO tracks (
                id, source_key, title, normalized_title, artist,
                file_size, source_modified_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.id)
        .bind(&track.source_key)
        .bind(&track.title)
        .bind(&track.normalized_title)
        .bind(&track.artist)
        .bind(track.file_size)
        .bind(track.source_modified_at)
        .bind(track.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Track", &track.source_key))?;

        debug!(track_id = %track.id, source_key = %track.source_key, "Inserted track");
        Ok(track.clone())
    }

    async fn list_all(&self) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            "SELECT * FROM tracks ORDER BY title COLLATE BINARY ASC, source_key ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM tracks")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
