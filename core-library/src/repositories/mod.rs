//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data access.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Uniqueness is enforced by the store; violations surface as
//!   `LibraryError::Conflict`
//!
//! ## Available Repositories
//!
//! - `TrackRepository` - Catalog entries keyed by object key
//! - `PlaylistRepository` - Named playlists with set membership, backed by
//!   SQLite (`SqlitePlaylistRepository`) or by JSON documents in the object
//!   store (`DocumentPlaylistRepository`)

pub mod playlist;
pub mod playlist_document;
pub mod track;

pub use playlist::{PlaylistRepository, SqlitePlaylistRepository};
pub use playlist_document::{DocumentPlaylistRepository, PLAYLIST_PREFIX};
pub use track::{SqliteTrackRepository, TrackRepository};
