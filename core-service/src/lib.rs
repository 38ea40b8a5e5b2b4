//! Core service façade and bootstrap helpers.
//!
//! This crate wires the configured object store, the SQLite catalog and the
//! playlist store into a single [`CoreService`]. Each public operation maps
//! onto one request of the HTTP surface; an adapter only has to translate
//! requests into calls and [`CoreError::to_response`] into a status and body.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfigBuilder;
//! use core_service::CoreService;
//!
//! let config = CoreConfigBuilder::from_env()?.build()?;
//! let service = CoreService::bootstrap(config).await?;
//!
//! let report = service.sync().await?;
//! let tracks = service.list_tracks().await?;
//! service.shutdown().await;
//! ```

pub mod error;

pub use core_sync::{SyncReport, UploadFile};
pub use error::{CoreError, ErrorCode, ErrorResponse, Result};

use std::sync::Arc;

use bridge_traits::{
    storage::{ObjectBody, ObjectStore},
    time::SystemClock,
};
use core_library::{
    repositories::{
        DocumentPlaylistRepository, PlaylistRepository, SqlitePlaylistRepository,
        SqliteTrackRepository, TrackRepository,
    },
    DatabaseConfig, FilenameParser, LibraryError, PlayableTrack, PlayableUrlBuilder,
    PlaylistWithTracks,
};
use core_runtime::config::{CoreConfig, PlaylistStorage};
use core_sync::{SyncConfig, SyncCoordinator, TrackIngestor, TrackUploader};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument};

/// Playlist name used when an upload does not name one
pub const DEFAULT_UPLOAD_PLAYLIST: &str = "New Upload";

/// Playlist as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: String,
    pub name: String,
    pub tracks: Vec<PlayableTrack>,
}

/// Result of an upload request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    /// Playlist the uploaded tracks were attached to
    pub playlist: PlaylistView,
    /// Catalog entries of the uploaded files, in upload order
    pub uploaded: Vec<PlayableTrack>,
    /// How many of them were new to the catalog
    pub created_count: usize,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    pool: SqlitePool,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    tracks: Arc<dyn TrackRepository>,
    playlists: Arc<dyn PlaylistRepository>,
    coordinator: Arc<SyncCoordinator>,
    uploader: Arc<TrackUploader>,
    urls: PlayableUrlBuilder,
}

impl CoreService {
    /// Open the catalog and wire every component from `config`
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the database cannot be
    /// opened and migrated.
    #[instrument(skip(config), fields(bucket = %config.bucket))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let urls = PlayableUrlBuilder::new(config.public_base_url.as_str())?;
        let pool = core_library::create_pool(DatabaseConfig::new(config.database_path.clone())).await?;

        let store = config.object_store;
        let tracks: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool.clone()));
        let playlists: Arc<dyn PlaylistRepository> = match config.playlist_storage {
            PlaylistStorage::Database => Arc::new(SqlitePlaylistRepository::new(pool.clone())),
            PlaylistStorage::ObjectStore => Arc::new(DocumentPlaylistRepository::new(
                store.clone(),
                config.bucket.clone(),
                tracks.clone(),
            )),
        };

        let parser = FilenameParser::new(
            config.decorative_markers.clone(),
            config.media_extensions.clone(),
        );
        let ingestor = Arc::new(TrackIngestor::new(
            parser,
            tracks.clone(),
            Arc::new(SystemClock),
        ));

        let uploader = Arc::new(TrackUploader::new(
            store.clone(),
            config.bucket.clone(),
            ingestor.clone(),
            config.media_extensions.clone(),
        ));
        let sync_config = SyncConfig {
            media_extensions: config.media_extensions,
            ..SyncConfig::default()
        };
        let coordinator = Arc::new(SyncCoordinator::new(
            store.clone(),
            config.bucket.clone(),
            ingestor,
            sync_config,
        ));

        info!(
            playlist_storage = %config.playlist_storage,
            "Core service initialized"
        );

        Ok(Self {
            pool,
            store,
            bucket: config.bucket,
            tracks,
            playlists,
            coordinator,
            uploader,
            urls,
        })
    }

    /// Every catalogued track with its playable URL
    pub async fn list_tracks(&self) -> Result<Vec<PlayableTrack>> {
        let tracks = self.tracks.list_all().await?;
        Ok(tracks.into_iter().map(|t| self.urls.playable(t)).collect())
    }

    pub async fn list_playlists(&self) -> Result<Vec<PlaylistView>> {
        let playlists = self.playlists.list_all().await?;
        Ok(playlists.into_iter().map(|p| self.view(p)).collect())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<PlaylistView> {
        let playlist = self
            .playlists
            .get_with_tracks(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "Playlist".to_string(),
                id: id.to_string(),
            })?;
        Ok(self.view(playlist))
    }

    /// Create an empty playlist, or return the existing one with that name
    #[instrument(skip(self))]
    pub async fn create_playlist(&self, name: &str) -> Result<PlaylistView> {
        let playlist = self.playlists.create_or_get_by_name(name).await?;
        self.get_playlist(&playlist.id).await
    }

    /// Create-or-get the named playlist and replace its tracks
    #[instrument(skip(self, track_ids), fields(tracks = track_ids.len()))]
    pub async fn overwrite_playlist(&self, name: &str, track_ids: &[String]) -> Result<PlaylistView> {
        let playlist = self.playlists.replace_contents(name, track_ids).await?;
        Ok(self.view(playlist))
    }

    /// Add tracks to a playlist; tracks already present are kept in place
    #[instrument(skip(self, track_ids), fields(tracks = track_ids.len()))]
    pub async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<PlaylistView> {
        let playlist = self.playlists.add_members(playlist_id, track_ids).await?;
        Ok(self.view(playlist))
    }

    pub async fn sync(&self) -> Result<SyncReport> {
        Ok(self.coordinator.sync().await?)
    }

    /// Store files in the bucket, catalog them and attach them to a playlist
    ///
    /// A missing or blank name selects [`DEFAULT_UPLOAD_PLAYLIST`]. Existing
    /// members of the playlist are kept. The playlist name and every file
    /// name are checked before anything is written.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn upload_tracks(
        &self,
        playlist_name: Option<&str>,
        files: &[UploadFile],
    ) -> Result<UploadReport> {
        let name = playlist_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_PLAYLIST);
        self.playlists.validate_name(name)?;

        let outcomes = self.uploader.upload(files).await?;
        let created_count = outcomes.iter().filter(|o| o.is_created()).count();
        let uploaded: Vec<_> = outcomes.into_iter().map(|o| o.into_track()).collect();
        let ids: Vec<String> = uploaded.iter().map(|t| t.id.clone()).collect();

        let playlist = self.playlists.create_or_get_by_name(name).await?;
        let playlist = self.playlists.add_members(&playlist.id, &ids).await?;

        info!(playlist = name, uploaded = ids.len(), created_count, "Upload attached to playlist");

        Ok(UploadReport {
            playlist: self.view(playlist),
            uploaded: uploaded.into_iter().map(|t| self.urls.playable(t)).collect(),
            created_count,
        })
    }

    /// Catalog one object that already exists in the bucket
    pub async fn register_object(&self, key: &str) -> Result<PlayableTrack> {
        let outcome = self.coordinator.register_key(key).await?;
        Ok(self.urls.playable(outcome.into_track()))
    }

    /// Open the audio object behind a catalogued track
    #[instrument(skip(self))]
    pub async fn open_track(&self, track_id: &str) -> Result<ObjectBody> {
        let track = self
            .tracks
            .find_by_id(track_id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "Track".to_string(),
                id: track_id.to_string(),
            })?;

        Ok(self.store.get_object(&self.bucket, &track.source_key).await?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn urls(&self) -> &PlayableUrlBuilder {
        &self.urls
    }

    /// Close the database pool; the service must not be used afterwards
    pub async fn shutdown(&self) {
        info!("Shutting down core service");
        self.pool.close().await;
    }

    fn view(&self, playlist: PlaylistWithTracks) -> PlaylistView {
        PlaylistView {
            id: playlist.playlist.id,
            name: playlist.playlist.name,
            tracks: playlist
                .tracks
                .into_iter()
                .map(|t| self.urls.playable(t))
                .collect(),
        }
    }
}
