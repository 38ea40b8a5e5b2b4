//! # Library Management Module
//!
//! Owns the track catalog and playlist storage.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repository patterns for tracks and playlists
//! - The filename heuristic that derives title and artist from object keys
//! - Playable URL derivation from object keys

pub mod db;
pub mod error;
pub mod filename;
pub mod models;
pub mod playable_url;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use filename::{FilenameParser, ParsedName};
pub use models::{PlayableTrack, Playlist, PlaylistId, PlaylistWithTracks, Track, TrackId};
pub use playable_url::PlayableUrlBuilder;
pub use repositories::{
    DocumentPlaylistRepository, PlaylistRepository, SqlitePlaylistRepository,
    SqliteTrackRepository, TrackRepository,
};
