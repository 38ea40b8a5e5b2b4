//! Playlist repository trait and SQLite implementation

use crate::error::{LibraryError, Result};
use crate::models::{validate_playlist_name, Playlist, PlaylistWithTracks, Track};
use async_trait::async_trait;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

/// Playlist store interface
///
/// Membership is a set: adding a track that is already present is a no-op,
/// so every mutation here is safe to retry.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Check that `name` can be stored by this repository, without I/O
    ///
    /// # Errors
    /// Returns `InvalidInput` when the name would be rejected on write.
    fn validate_name(&self, name: &str) -> Result<()> {
        validate_playlist_name(name).map_err(|e| LibraryError::invalid("name", e))
    }

    /// Find a playlist by its unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>>;

    /// Find a playlist by its ID
    ///
    /// # Returns
    /// - `Ok(Some(playlist))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if a storage error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Playlist>>;

    /// Return the playlist with this name, creating an empty one if absent
    ///
    /// Concurrent callers with the same name all receive the same playlist.
    async fn create_or_get_by_name(&self, name: &str) -> Result<Playlist>;

    /// Append tracks that are not yet members, in input order
    ///
    /// # Errors
    /// Returns `NotFound` if the playlist or any of the tracks does not
    /// exist; in that case membership is left unchanged.
    async fn add_members(&self, playlist_id: &str, track_ids: &[String])
        -> Result<PlaylistWithTracks>;

    /// Create-or-get the named playlist and overwrite its membership
    async fn replace_contents(&self, name: &str, track_ids: &[String])
        -> Result<PlaylistWithTracks>;

    /// All playlists ordered by name, each with its tracks in display order
    async fn list_all(&self) -> Result<Vec<PlaylistWithTracks>>;

    /// One playlist with its tracks
    async fn get_with_tracks(&self, id: &str) -> Result<Option<PlaylistWithTracks>>;

    /// Delete a playlist; member tracks stay in the catalog
    ///
    /// # Returns
    /// - `Ok(true)` if the playlist was deleted
    /// - `Ok(false)` if it was not found
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// SQLite implementation of PlaylistRepository
pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
}

impl SqlitePlaylistRepository {
    /// Create a new SqlitePlaylistRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn tracks_of(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let tracks = query_as::<_, Track>(
            r#"
            SELECT t.* FROM tracks t
            INNER JOIN playlist_tracks pt ON pt.track_id = t.id
            WHERE pt.playlist_id = ?
            ORDER BY pt.position ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn load(&self, playlist: Playlist) -> Result<PlaylistWithTracks> {
        let tracks = self.tracks_of(&playlist.id).await?;
        Ok(PlaylistWithTracks { playlist, tracks })
    }

    async fn require_with_tracks(&self, id: &str) -> Result<PlaylistWithTracks> {
        self.get_with_tracks(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Playlist", id))
    }
}

/// Bump `updated_at`, taking the write lock for the rest of the transaction
///
/// Returns `false` if the playlist does not exist.
async fn touch(tx: &mut Transaction<'_, Sqlite>, playlist_id: &str) -> Result<bool> {
    let result = query("UPDATE playlists SET updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().timestamp())
        .bind(playlist_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert memberships after the current last position, skipping present ids
async fn append_members(
    tx: &mut Transaction<'_, Sqlite>,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<u64> {
    let (mut position,): (i64,) = query_as(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM playlist_tracks WHERE playlist_id = ?",
    )
    .bind(playlist_id)
    .fetch_one(&mut **tx)
    .await?;

    let added_at = chrono::Utc::now().timestamp();
    let mut inserted = 0;

    for track_id in track_ids {
        let exists: Option<(String,)> = query_as("SELECT id FROM tracks WHERE id = ?")
            .bind(track_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(LibraryError::not_found("Track", track_id.as_str()));
        }

        let result = query(
            r#"
            INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position, added_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(playlist_id)
        .bind(track_id)
        .bind(position)
        .bind(added_at)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() > 0 {
            position += 1;
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[async_trait]
impl PlaylistRepository for SqlitePlaylistRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        let playlist = query_as::<_, Playlist>("SELECT * FROM playlists WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Playlist>> {
        let playlist = query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    async fn create_or_get_by_name(&self, name: &str) -> Result<Playlist> {
        self.validate_name(name)?;

        let candidate = Playlist::new(name.to_string());
        let result = query(
            r#"
            INSERT INTO playlists (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(&candidate.name)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(playlist_id = %candidate.id, name, "Created playlist");
        }

        self.find_by_name(name)
            .await?
            .ok_or_else(|| LibraryError::not_found("Playlist", name))
    }

    async fn add_members(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<PlaylistWithTracks> {
        let mut tx = self.pool.begin().await?;

        if !touch(&mut tx, playlist_id).await? {
            return Err(LibraryError::not_found("Playlist", playlist_id));
        }
        let inserted = append_members(&mut tx, playlist_id, track_ids).await?;
        tx.commit().await?;

        debug!(playlist_id, requested = track_ids.len(), inserted, "Added playlist members");
        self.require_with_tracks(playlist_id).await
    }

    async fn replace_contents(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistWithTracks> {
        let playlist = self.create_or_get_by_name(name).await?;

        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, &playlist.id).await? {
            return Err(LibraryError::not_found("Playlist", playlist.id.as_str()));
        }
        query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
            .bind(&playlist.id)
            .execute(&mut *tx)
            .await?;
        let inserted = append_members(&mut tx, &playlist.id, track_ids).await?;
        tx.commit().await?;

        debug!(playlist_id = %playlist.id, name, inserted, "Replaced playlist contents");
        self.require_with_tracks(&playlist.id).await
    }

    async fn list_all(&self) -> Result<Vec<PlaylistWithTracks>> {
        let playlists = query_as::<_, Playlist>("SELECT * FROM playlists ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut resolved = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            resolved.push(self.load(playlist).await?);
        }

        Ok(resolved)
    }

    async fn get_with_tracks(&self, id: &str) -> Result<Option<PlaylistWithTracks>> {
        match self.find_by_id(id).await? {
            Some(playlist) => Ok(Some(self.load(playlist).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        // Membership rows go with the playlist (ON DELETE CASCADE)
        let result = query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
