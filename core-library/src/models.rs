//! Domain models for the track catalog
//!
//! This module contains the catalog and playlist records with validation and
//! database mapping.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::filename::ParsedName;

/// Artist used when a name carries no artist part
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for a playlist identified only by its name
    ///
    /// Used where the playlist name is the storage key (document mode), so
    /// the same name always yields the same id.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("playlists/{}", name).as_bytes(),
        ))
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// Catalog entry for one audio object
///
/// The playable URL is not part of the record; it is derived from
/// `source_key` on read (see [`crate::playable_url`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique identifier
    pub id: String,
    /// Object key in the bucket, unique across the catalog
    pub source_key: String,
    pub title: String,
    /// Lowercased, trimmed title
    pub normalized_title: String,
    pub artist: String,
    /// Object size in bytes at first observation
    pub file_size: Option<i64>,
    /// Object modification time at first observation
    pub source_modified_at: Option<i64>,
    /// When first added
    pub created_at: i64,
}

impl Track {
    /// Create a new track for an object key
    pub fn new(source_key: String, title: String, artist: String, created_at: i64) -> Self {
        let normalized_title = Self::normalize(&title);
        Self {
            id: TrackId::new().to_string(),
            source_key,
            title,
            normalized_title,
            artist,
            file_size: None,
            source_modified_at: None,
            created_at,
        }
    }

    /// Create a track from parsed filename metadata
    pub fn from_parsed(source_key: String, parsed: ParsedName, created_at: i64) -> Self {
        Self::new(source_key, parsed.title, parsed.artist, created_at)
    }

    /// Attach object size and modification time from a listing entry
    pub fn with_object_info(mut self, size: Option<u64>, modified_at: Option<i64>) -> Self {
        self.file_size = size.and_then(|s| i64::try_from(s).ok());
        self.source_modified_at = modified_at;
        self
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.source_key.is_empty() {
            return Err("Track source key cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }

        if self.artist.trim().is_empty() {
            return Err("Track artist cannot be empty".to_string());
        }

        if let Some(size) = self.file_size {
            if size < 0 {
                return Err("Track file size cannot be negative".to_string());
            }
        }

        Ok(())
    }

    /// Normalize a string for comparison (lowercase, trimmed)
    pub fn normalize(s: &str) -> String {
        s.trim().to_lowercase()
    }
}

/// Named playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Unique identifier
    pub id: String,
    /// Playlist name, unique
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Playlist {
    /// Create a new, empty playlist
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: PlaylistId::new().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate playlist data
    pub fn validate(&self) -> Result<(), String> {
        validate_playlist_name(&self.name)
    }
}

/// Check a user-supplied playlist name before any I/O
pub fn validate_playlist_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Playlist name cannot be empty".to_string());
    }

    if name.trim() != name {
        return Err("Playlist name cannot start or end with whitespace".to_string());
    }

    Ok(())
}

/// Playlist with its membership resolved to full tracks, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistWithTracks {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}

impl PlaylistWithTracks {
    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Track as served to clients, with its derived playable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayableTrack {
    #[serde(flatten)]
    pub track: Track,
    pub playable_url: String,
}
