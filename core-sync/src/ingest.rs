//! # Track Ingest
//!
//! Produce-or-reuse a catalog entry for one object key. Sync, upload and
//! explicit registration all go through [`TrackIngestor::ensure_track`], so
//! a key always yields the same metadata regardless of how it arrived.
//!
//! The check-then-insert sequence is not atomic. When two callers race on
//! the same key, the store's uniqueness constraint rejects the second insert
//! with `Conflict`, and the loser re-reads the winner's row instead of
//! failing.

use std::sync::Arc;

use bridge_traits::storage::ObjectSummary;
use bridge_traits::time::Clock;
use core_library::repositories::TrackRepository;
use core_library::{FilenameParser, LibraryError, Track};
use tracing::debug;

use crate::error::Result;

/// Result of [`TrackIngestor::ensure_track`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new catalog entry was inserted
    Created(Track),
    /// The key was already catalogued; nothing was changed
    Existing {
        track: Track,
        /// Another writer inserted the key between our lookup and insert
        recovered_conflict: bool,
    },
}

impl IngestOutcome {
    pub fn track(&self) -> &Track {
        match self {
            Self::Created(track) => track,
            Self::Existing { track, .. } => track,
        }
    }

    pub fn into_track(self) -> Track {
        match self {
            Self::Created(track) => track,
            Self::Existing { track, .. } => track,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Shared ingest routine
pub struct TrackIngestor {
    parser: FilenameParser,
    tracks: Arc<dyn TrackRepository>,
    clock: Arc<dyn Clock>,
}

impl TrackIngestor {
    pub fn new(
        parser: FilenameParser,
        tracks: Arc<dyn TrackRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            parser,
            tracks,
            clock,
        }
    }

    pub fn parser(&self) -> &FilenameParser {
        &self.parser
    }

    /// Ensure a catalog entry exists for the object
    ///
    /// Existing entries are returned untouched; metadata is never refreshed
    /// from a later listing.
    pub async fn ensure_track(&self, object: &ObjectSummary) -> Result<IngestOutcome> {
        if let Some(track) = self.tracks.find_by_source_key(&object.key).await? {
            return Ok(IngestOutcome::Existing {
                track,
                recovered_conflict: false,
            });
        }

        let parsed = self.parser.parse(&object.key);
        let candidate = Track::from_parsed(object.key.clone(), parsed, self.clock.unix_timestamp())
            .with_object_info(Some(object.size), object.last_modified);

        match self.tracks.insert(&candidate).await {
            Ok(track) => {
                debug!(key = %object.key, title = %track.title, artist = %track.artist, "Catalogued object");
                Ok(IngestOutcome::Created(track))
            }
            Err(LibraryError::Conflict { .. }) => {
                debug!(key = %object.key, "Lost insert race, reusing existing entry");
                let track = self
                    .tracks
                    .find_by_source_key(&object.key)
                    .await?
                    .ok_or_else(|| LibraryError::NotFound {
                        entity_type: "Track".to_string(),
                        id: object.key.clone(),
                    })?;
                Ok(IngestOutcome::Existing {
                    track,
                    recovered_conflict: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
