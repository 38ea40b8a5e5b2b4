//! Playlists stored as JSON documents in the object store
//!
//! Each playlist is the object `playlists/{name}.json` holding the array of
//! its member tracks. The playlist id is derived from the name, and the
//! names themselves come from listing the `playlists/` prefix, so there is
//! no separate index to keep consistent.
//!
//! Writes to one document are serialized within this repository, so
//! concurrent updates through the same instance never drop members. Writers
//! in other processes are not coordinated.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::storage::{ObjectStore, ObjectSummary};
use bytes::Bytes;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::{LibraryError, Result};
use crate::models::{validate_playlist_name, Playlist, PlaylistId, PlaylistWithTracks, Track};
use crate::repositories::{PlaylistRepository, TrackRepository};

/// Key prefix under which playlist documents live
pub const PLAYLIST_PREFIX: &str = "playlists/";

const DOCUMENT_SUFFIX: &str = ".json";
const DOCUMENT_CONTENT_TYPE: &str = "application/json";

/// Object-store-document implementation of PlaylistRepository
pub struct DocumentPlaylistRepository {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    tracks: Arc<dyn TrackRepository>,
    document_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentPlaylistRepository {
    /// Create a repository over `bucket`
    ///
    /// `tracks` resolves member ids to the full records written into each
    /// document.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        tracks: Arc<dyn TrackRepository>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            tracks,
            document_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Object key of a playlist document
    pub fn document_key(name: &str) -> String {
        format!("{}{}{}", PLAYLIST_PREFIX, name, DOCUMENT_SUFFIX)
    }

    fn name_from_key(key: &str) -> Option<&str> {
        let name = key
            .strip_prefix(PLAYLIST_PREFIX)?
            .strip_suffix(DOCUMENT_SUFFIX)?;
        (!name.is_empty() && !name.contains('/')).then_some(name)
    }

    fn check_name(name: &str) -> Result<()> {
        validate_playlist_name(name).map_err(|e| LibraryError::invalid("name", e))?;
        if name.contains('/') {
            return Err(LibraryError::invalid(
                "name",
                "Playlist name cannot contain '/'",
            ));
        }
        Ok(())
    }

    /// Hold the write lock of one document until the guard is dropped
    async fn lock_document(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.document_locks.lock().await;
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    fn playlist_for(name: &str, summary: &ObjectSummary) -> Playlist {
        let modified = summary.last_modified.unwrap_or_default();
        Playlist {
            id: PlaylistId::from_name(name).to_string(),
            name: name.to_string(),
            created_at: modified,
            updated_at: modified,
        }
    }

    /// All playlist documents, sorted by name
    async fn documents(&self) -> Result<Vec<(Playlist, String)>> {
        let mut found: Vec<(Playlist, String)> = self
            .store
            .list(&self.bucket, Some(PLAYLIST_PREFIX))
            .await?
            .iter()
            .filter_map(|summary| {
                Self::name_from_key(&summary.key)
                    .map(|name| (Self::playlist_for(name, summary), summary.key.clone()))
            })
            .collect();

        found.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        Ok(found)
    }

    async fn read_tracks(&self, key: &str) -> Result<Vec<Track>> {
        match self.store.get_object_bytes(&self.bucket, key).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(BridgeError::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_tracks(&self, name: &str, tracks: &[Track]) -> Result<()> {
        let body = serde_json::to_vec(tracks)?;
        self.store
            .put_object(
                &self.bucket,
                &Self::document_key(name),
                Bytes::from(body),
                DOCUMENT_CONTENT_TYPE,
            )
            .await?;
        debug!(name, tracks = tracks.len(), "Wrote playlist document");
        Ok(())
    }

    /// Resolve ids to tracks, in order, skipping repeats
    async fn resolve(&self, track_ids: &[String]) -> Result<Vec<Track>> {
        let mut resolved: Vec<Track> = Vec::with_capacity(track_ids.len());
        for id in track_ids {
            if resolved.iter().any(|t| &t.id == id) {
                continue;
            }
            let track = self
                .tracks
                .find_by_id(id)
                .await?
                .ok_or_else(|| LibraryError::not_found("Track", id.as_str()))?;
            resolved.push(track);
        }
        Ok(resolved)
    }

    async fn load(&self, playlist: Playlist, key: &str) -> Result<PlaylistWithTracks> {
        let tracks = self.read_tracks(key).await?;
        Ok(PlaylistWithTracks { playlist, tracks })
    }
}

#[async_trait]
impl PlaylistRepository for DocumentPlaylistRepository {
    fn validate_name(&self, name: &str) -> Result<()> {
        Self::check_name(name)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        if Self::check_name(name).is_err() {
            return Ok(None);
        }

        let key = Self::document_key(name);
        let found = self
            .store
            .list(&self.bucket, Some(&key))
            .await?
            .into_iter()
            .find(|summary| summary.key == key)
            .map(|summary| Self::playlist_for(name, &summary));

        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Playlist>> {
        Ok(self
            .documents()
            .await?
            .into_iter()
            .map(|(playlist, _)| playlist)
            .find(|playlist| playlist.id == id))
    }

    async fn create_or_get_by_name(&self, name: &str) -> Result<Playlist> {
        Self::check_name(name)?;
        let _guard = self.lock_document(name).await;

        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }

        self.write_tracks(name, &[]).await?;
        info!(name, "Created playlist document");

        self.find_by_name(name)
            .await?
            .ok_or_else(|| LibraryError::not_found("Playlist", name))
    }

    async fn add_members(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<PlaylistWithTracks> {
        let playlist = self
            .find_by_id(playlist_id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Playlist", playlist_id))?;
        let additions = self.resolve(track_ids).await?;

        let _guard = self.lock_document(&playlist.name).await;
        let key = Self::document_key(&playlist.name);
        let mut tracks = self.read_tracks(&key).await?;
        for track in additions {
            if !tracks.iter().any(|t| t.id == track.id) {
                tracks.push(track);
            }
        }

        self.write_tracks(&playlist.name, &tracks).await?;
        Ok(PlaylistWithTracks { playlist, tracks })
    }

    async fn replace_contents(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<PlaylistWithTracks> {
        Self::check_name(name)?;
        let tracks = self.resolve(track_ids).await?;

        let _guard = self.lock_document(name).await;
        self.write_tracks(name, &tracks).await?;
        let playlist = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| LibraryError::not_found("Playlist", name))?;

        Ok(PlaylistWithTracks { playlist, tracks })
    }

    async fn list_all(&self) -> Result<Vec<PlaylistWithTracks>> {
        let mut resolved = Vec::new();
        for (playlist, key) in self.documents().await? {
            resolved.push(self.load(playlist, &key).await?);
        }
        Ok(resolved)
    }

    async fn get_with_tracks(&self, id: &str) -> Result<Option<PlaylistWithTracks>> {
        let Some((playlist, key)) = self
            .documents()
            .await?
            .into_iter()
            .find(|(playlist, _)| playlist.id == id)
        else {
            return Ok(None);
        };

        Ok(Some(self.load(playlist, &key).await?))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Some(playlist) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let _guard = self.lock_document(&playlist.name).await;
        let removed = self
            .store
            .delete_object(&self.bucket, &Self::document_key(&playlist.name))
            .await?;
        Ok(removed)
    }
}
